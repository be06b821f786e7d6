//! Schema command - print expected input formats

use benefitc::core::constants::ConstantsInput;
use benefitc::core::{HouseholdInput, IncomeRecord};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the household input
    JsonSchema,
    /// JSON Schema for a constants table file
    ConstantsSchema,
    /// Income CSV header row
    CsvHeader,
    /// Income CSV column descriptions
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(HouseholdInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::ConstantsSchema => {
                let schema = schema_for!(ConstantsInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => println!("{}", IncomeRecord::csv_header()),
            SchemaFormat::CsvFields => self.print_csv_fields(),
        }
        Ok(())
    }

    fn print_csv_fields(&self) {
        println!("Income CSV Format");
        println!("=================");
        println!();
        for column in IncomeRecord::csv_columns() {
            let req = if column.required { "required" } else { "optional" };
            println!("{:20} ({:8})  {}", column.name, req, column.description);
        }
        println!();
        println!("Amounts are annual, in dollars. Repeated categories are added together.");
    }
}
