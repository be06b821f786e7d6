//! Allocate command - split monthly savings across RRSP, TFSA and non-registered

use super::{print_json, print_table, yes_no, HouseholdArgs};
use benefitc::core::money::format_cad;
use benefitc::core::{AllocationResult, BenefitConstantsTable, HouseholdReport};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct AllocateCommand {
    #[command(flatten)]
    household: HouseholdArgs,
}

#[derive(Debug, Serialize)]
struct PersonAllocation<'a> {
    label: &'a str,
    #[serde(flatten)]
    allocation: &'a AllocationResult,
}

#[derive(Debug, Serialize)]
struct AllocationData<'a> {
    year: i32,
    people: Vec<PersonAllocation<'a>>,
}

#[derive(Debug, Tabled)]
struct AllocationRow {
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Annual")]
    annual: String,
    #[tabled(rename = "Taxable")]
    taxable: String,
}

impl AllocateCommand {
    pub fn exec(&self, table: &BenefitConstantsTable) -> anyhow::Result<()> {
        let report = self.household.assess(table)?;
        if report.people.iter().all(|p| p.allocation.is_none()) {
            anyhow::bail!("No monthly_savings given for anyone in the household");
        }

        if self.household.json() {
            let people = report
                .people
                .iter()
                .filter_map(|p| {
                    p.allocation.as_ref().map(|allocation| PersonAllocation {
                        label: &p.label,
                        allocation,
                    })
                })
                .collect();
            return print_json(&AllocationData {
                year: report.year,
                people,
            });
        }

        print_allocations(&report);
        Ok(())
    }
}

pub(crate) fn print_allocations(report: &HouseholdReport) {
    for person in &report.people {
        let Some(allocation) = &person.allocation else {
            continue;
        };
        println!(
            "Savings Allocation for {} ({}/month)",
            person.label,
            format_cad(allocation.total_monthly())
        );
        let rows = allocation
            .allocations
            .iter()
            .map(|a| AllocationRow {
                account: a.account.label().to_string(),
                monthly: format_cad(a.monthly_amount),
                annual: format_cad(a.annual_amount),
                taxable: yes_no(a.taxable),
            })
            .collect();
        print_table(rows);
        for warning in allocation.warning_messages() {
            println!("Warning: {}", warning);
        }
    }
}
