pub mod allocate;
pub mod constants;
pub mod gis;
pub mod income;
pub mod limits;
pub mod schema;
pub mod summary;

use benefitc::core::{
    self as domain, BenefitConstantsTable, HouseholdInput, HouseholdReport, YearPolicy,
};
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Options controlling which constants table is used
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Constants table (JSON or CSV). Uses the built-in table if not given.
    #[arg(long, global = true)]
    constants: Option<PathBuf>,

    /// Use the latest tabulated year for years after the end of the table
    #[arg(long, global = true)]
    latest_year_fallback: bool,
}

impl TableArgs {
    pub fn load(&self) -> anyhow::Result<BenefitConstantsTable> {
        let table = match &self.constants {
            Some(path) => read_constants(path)?,
            None => BenefitConstantsTable::builtin(),
        };
        let policy = if self.latest_year_fallback {
            YearPolicy::LatestKnown
        } else {
            YearPolicy::Strict
        };
        log::info!(
            "Constants table {}-{} ({:?}) sha256 {}",
            table.first_year().unwrap_or_default(),
            table.last_year().unwrap_or_default(),
            policy,
            table.fingerprint()
        );
        Ok(table.with_policy(policy))
    }
}

/// Household file and output options shared by the calculation commands
#[derive(Args, Debug)]
pub struct HouseholdArgs {
    /// Household JSON file (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Benefit year (overrides the year in the household file)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

impl HouseholdArgs {
    pub fn json(&self) -> bool {
        self.json
    }

    pub fn assess(&self, table: &BenefitConstantsTable) -> anyhow::Result<HouseholdReport> {
        let household = read_household(&self.input)?;
        let year = household.benefit_year(self.year)?;
        Ok(domain::assess_household(table, &household, year)?)
    }
}

/// Read a household JSON file (or stdin with "-")
pub fn read_household(path: &Path) -> anyhow::Result<HouseholdInput> {
    if path.as_os_str() == "-" {
        let mut buffer = Vec::new();
        io::stdin().lock().read_to_end(&mut buffer)?;
        if buffer.is_empty() {
            anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
        }
        domain::household::read_json(io::Cursor::new(buffer))
    } else {
        domain::household::read_json(BufReader::new(File::open(path)?))
    }
}

/// Read a constants table from CSV or JSON based on extension
pub fn read_constants(path: &Path) -> anyhow::Result<BenefitConstantsTable> {
    let reader = BufReader::new(File::open(path)?);
    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => domain::constants::read_csv(reader),
        _ => domain::constants::read_json(reader),
    }
}

pub fn print_table<R: Tabled>(rows: Vec<R>) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn yes_no(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_string()
}
