//! Income command - classify income for the GIS income test

use super::{print_json, print_table, read_household};
use benefitc::core::money::format_cad;
use benefitc::core::{
    classify_income, income, BenefitConstantsTable, BenefitYear, ClassifiedIncome, IncomeProfile,
};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct IncomeCommand {
    /// Household JSON file, or an income CSV (category,amount,description)
    #[arg(short, long)]
    input: PathBuf,

    /// Benefit year (required for CSV input)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct PersonIncome {
    label: String,
    gross_total: Decimal,
    #[serde(flatten)]
    classified: ClassifiedIncome,
}

#[derive(Debug, Serialize)]
struct IncomeData {
    year: i32,
    people: Vec<PersonIncome>,
}

#[derive(Debug, Tabled)]
struct IncomeRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "Countable")]
    countable: String,
    #[tabled(rename = "Note")]
    note: String,
}

impl IncomeCommand {
    pub fn exec(&self, table: &BenefitConstantsTable) -> anyhow::Result<()> {
        let (year, profiles) = self.read_profiles()?;
        let constants = table.lookup(year)?;

        let mut people = Vec::new();
        for (label, profile) in profiles {
            let classified = classify_income(&profile, constants)?;
            let person = PersonIncome {
                label,
                gross_total: profile.total(),
                classified,
            };
            people.push((profile, person));
        }

        if self.json {
            return print_json(&IncomeData {
                year: constants.year,
                people: people.into_iter().map(|(_, p)| p).collect(),
            });
        }

        println!("GIS Income Test ({})", constants.year);
        for (profile, person) in &people {
            println!();
            println!("{}", person.label);
            print_table(income_rows(profile, &person.classified));
            println!(
                "Gross {}  Countable {}",
                format_cad(person.gross_total),
                format_cad(person.classified.countable_total)
            );
        }
        Ok(())
    }

    fn read_profiles(&self) -> anyhow::Result<(BenefitYear, Vec<(String, IncomeProfile)>)> {
        let is_csv = self.input.extension().and_then(|s| s.to_str()) == Some("csv");
        if is_csv {
            let Some(year) = self.year else {
                anyhow::bail!("--year is required for CSV income input");
            };
            let profile = income::read_csv(BufReader::new(File::open(&self.input)?))?;
            return Ok((BenefitYear(year), vec![("income".to_string(), profile)]));
        }

        let household = read_household(&self.input)?;
        let year = household.benefit_year(self.year)?;
        let mut profiles = vec![(
            household.person.name.clone().unwrap_or_else(|| "person".to_string()),
            household.person.income.clone(),
        )];
        if let Some(spouse) = &household.spouse {
            profiles.push((
                spouse.name.clone().unwrap_or_else(|| "spouse".to_string()),
                spouse.income.clone(),
            ));
        }
        Ok((year, profiles))
    }
}

fn income_rows(profile: &IncomeProfile, classified: &ClassifiedIncome) -> Vec<IncomeRow> {
    profile
        .iter()
        .map(|(category, gross)| {
            let countable = classified
                .breakdown
                .get(&category)
                .copied()
                .unwrap_or_default();
            let note = classified
                .excluded
                .iter()
                .filter(|e| e.category == category)
                .map(|e| e.reason.clone())
                .collect::<Vec<_>>()
                .join("; ");
            IncomeRow {
                category: category.label().to_string(),
                gross: format_cad(gross),
                countable: format_cad(countable),
                note,
            }
        })
        .collect()
}
