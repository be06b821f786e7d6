//! Summary command - GIS, limits, allocations and suggested strategies

use super::allocate::print_allocations;
use super::gis::print_gis;
use super::limits::print_limits;
use super::{print_json, HouseholdArgs};
use benefitc::core::money::format_cad;
use benefitc::core::BenefitConstantsTable;
use clap::Args;

#[derive(Args, Debug)]
pub struct SummaryCommand {
    #[command(flatten)]
    household: HouseholdArgs,
}

impl SummaryCommand {
    pub fn exec(&self, table: &BenefitConstantsTable) -> anyhow::Result<()> {
        let report = self.household.assess(table)?;

        if self.household.json() {
            return print_json(&report);
        }

        print_gis(&report);
        println!();
        for person in &report.people {
            println!(
                "{}: countable income {}",
                person.label,
                format_cad(person.income.countable_total)
            );
            for excluded in &person.income.excluded {
                println!("  excluded {}", excluded);
            }
        }
        println!();
        print_limits(&report);

        if report.people.iter().any(|p| p.allocation.is_some()) {
            println!();
            print_allocations(&report);
        }

        for person in &report.people {
            if person.suggestions.is_empty() {
                continue;
            }
            println!();
            println!("Suggestions for {}", person.label);
            for (i, s) in person.suggestions.iter().enumerate() {
                println!("{}. {}", i + 1, s.title);
                println!("   {}", s.detail);
            }
        }
        Ok(())
    }
}
