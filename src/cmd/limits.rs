//! Limits command - RRSP and TFSA contribution room

use super::{print_json, print_table, yes_no, HouseholdArgs};
use benefitc::core::money::format_cad;
use benefitc::core::{BenefitConstantsTable, ContributionLimit, HouseholdReport};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct LimitsCommand {
    #[command(flatten)]
    household: HouseholdArgs,
}

#[derive(Debug, Serialize)]
struct PersonLimits<'a> {
    label: &'a str,
    age: u32,
    rrsp: ContributionLimit,
    tfsa: ContributionLimit,
}

#[derive(Debug, Serialize)]
struct LimitsData<'a> {
    year: i32,
    people: Vec<PersonLimits<'a>>,
}

#[derive(Debug, Tabled)]
struct LimitRow {
    #[tabled(rename = "Person")]
    person: String,
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Allowed")]
    allowed: String,
    #[tabled(rename = "Annual")]
    annual: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
}

impl LimitRow {
    fn new(person: &str, account: &str, limit: &ContributionLimit) -> Self {
        LimitRow {
            person: person.to_string(),
            account: account.to_string(),
            allowed: yes_no(limit.can_contribute),
            annual: format_cad(limit.annual_limit),
            monthly: format_cad(limit.monthly_limit),
        }
    }
}

impl LimitsCommand {
    pub fn exec(&self, table: &BenefitConstantsTable) -> anyhow::Result<()> {
        let report = self.household.assess(table)?;

        if self.household.json() {
            let people = report
                .people
                .iter()
                .map(|p| PersonLimits {
                    label: &p.label,
                    age: p.age,
                    rrsp: p.rrsp_limit,
                    tfsa: p.tfsa_room,
                })
                .collect();
            return print_json(&LimitsData {
                year: report.year,
                people,
            });
        }

        print_limits(&report);
        Ok(())
    }
}

pub(crate) fn print_limits(report: &HouseholdReport) {
    println!("Contribution Limits ({})", report.year);
    let rows = report
        .people
        .iter()
        .flat_map(|p| {
            [
                LimitRow::new(&p.label, "RRSP", &p.rrsp_limit),
                LimitRow::new(&p.label, "TFSA", &p.tfsa_room),
            ]
        })
        .collect();
    print_table(rows);
}
