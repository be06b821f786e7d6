use clap::{Parser, Subcommand};

mod cmd;

/// Canadian GIS and RRSP/TFSA contribution calculator
#[derive(Parser, Debug)]
#[command(name = "benefitc", version, about)]
struct Cli {
    #[command(flatten)]
    table: cmd::TableArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify income for the GIS income test
    Income(cmd::income::IncomeCommand),
    /// GIS eligibility and monthly benefit
    Gis(cmd::gis::GisCommand),
    /// RRSP and TFSA contribution room
    Limits(cmd::limits::LimitsCommand),
    /// Split monthly savings across RRSP, TFSA and non-registered accounts
    Allocate(cmd::allocate::AllocateCommand),
    /// Everything for a household, with suggested strategies
    Summary(cmd::summary::SummaryCommand),
    /// Show the benefit constants table
    Constants(cmd::constants::ConstantsCommand),
    /// Print expected input formats
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    if let Command::Schema(schema) = &cli.command {
        return schema.exec();
    }

    let table = cli.table.load()?;
    match &cli.command {
        Command::Income(income) => income.exec(&table),
        Command::Gis(gis) => gis.exec(&table),
        Command::Limits(limits) => limits.exec(&table),
        Command::Allocate(allocate) => allocate.exec(&table),
        Command::Summary(summary) => summary.exec(&table),
        Command::Constants(constants) => constants.exec(&table),
        Command::Schema(schema) => schema.exec(),
    }
}
