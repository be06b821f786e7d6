//! GIS command - eligibility and monthly benefit per person

use super::{print_json, print_table, yes_no, HouseholdArgs};
use benefitc::core::money::format_cad;
use benefitc::core::{Assessment, BenefitConstantsTable, GisOutcome, HouseholdReport};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct GisCommand {
    #[command(flatten)]
    household: HouseholdArgs,
}

#[derive(Debug, Serialize)]
struct GisData<'a> {
    year: i32,
    marital_status: &'a str,
    #[serde(flatten)]
    gis: &'a GisOutcome,
    household_monthly: Decimal,
    household_annual: Decimal,
}

#[derive(Debug, Tabled)]
struct GisRow {
    #[tabled(rename = "Person")]
    person: String,
    #[tabled(rename = "Age")]
    age: u32,
    #[tabled(rename = "Rate")]
    variant: String,
    #[tabled(rename = "Income Test")]
    income: String,
    #[tabled(rename = "Eligible")]
    eligible: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Annual")]
    annual: String,
}

impl GisCommand {
    pub fn exec(&self, table: &BenefitConstantsTable) -> anyhow::Result<()> {
        let report = self.household.assess(table)?;

        if self.household.json() {
            return print_json(&GisData {
                year: report.year,
                marital_status: report.marital_status.as_str(),
                gis: &report.gis,
                household_monthly: report.gis.household_monthly(),
                household_annual: report.gis.household_annual(),
            });
        }

        print_gis(&report);
        Ok(())
    }
}

pub(crate) fn print_gis(report: &HouseholdReport) {
    println!(
        "Guaranteed Income Supplement ({}, {})",
        report.year, report.marital_status
    );
    print_table(gis_rows(report));

    for (person, assessment) in report.people.iter().zip(report.gis.assessments()) {
        if let Some(reason) = &assessment.eligibility.reason {
            println!("{}: not eligible, {}", person.label, reason);
        }
    }
    println!(
        "Household: {}/month, {}/year",
        format_cad(report.gis.household_monthly()),
        format_cad(report.gis.household_annual())
    );
}

fn gis_rows(report: &HouseholdReport) -> Vec<GisRow> {
    report
        .people
        .iter()
        .zip(report.gis.assessments())
        .map(|(person, assessment)| gis_row(&person.label, person.age, assessment))
        .collect()
}

fn gis_row(label: &str, age: u32, assessment: &Assessment) -> GisRow {
    let benefit = &assessment.benefit;
    GisRow {
        person: label.to_string(),
        age,
        variant: benefit.variant.label().to_string(),
        income: format_cad(benefit.income_test_amount),
        eligible: yes_no(assessment.eligibility.eligible),
        monthly: format_cad(benefit.monthly_amount),
        annual: format_cad(benefit.annual_amount),
    }
}
