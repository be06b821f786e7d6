//! Constants command - print the constants table in use

use super::{print_json, print_table};
use benefitc::core::money::{format_cad, format_rate};
use benefitc::core::{BenefitConstantsTable, BenefitYear, BenefitYearConstants};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

#[derive(Args, Debug)]
pub struct ConstantsCommand {
    /// Only show the constants that apply to this year
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ConstantsData<'a> {
    fingerprint: String,
    years: Vec<&'a BenefitYearConstants>,
}

#[derive(Debug, Tabled)]
struct ConstantsRow {
    #[tabled(rename = "Year")]
    year: i32,
    #[tabled(rename = "GIS Single")]
    single: String,
    #[tabled(rename = "GIS Couple (both)")]
    couple_both: String,
    #[tabled(rename = "GIS Couple (one)")]
    couple_one: String,
    #[tabled(rename = "Threshold Single")]
    threshold_single: String,
    #[tabled(rename = "Threshold Couple")]
    threshold_couple: String,
    #[tabled(rename = "CPP Exempt")]
    cpp_exemption: String,
    #[tabled(rename = "RRSP Max")]
    rrsp_max: String,
    #[tabled(rename = "RRSP Rate")]
    rrsp_rate: String,
    #[tabled(rename = "TFSA")]
    tfsa: String,
}

impl From<&BenefitYearConstants> for ConstantsRow {
    fn from(c: &BenefitYearConstants) -> Self {
        ConstantsRow {
            year: c.year,
            single: format_cad(c.max_benefit_single),
            couple_both: format_cad(c.max_benefit_couple_both_receiving),
            couple_one: format_cad(c.max_benefit_couple_one_receiving),
            threshold_single: format_cad(c.income_threshold_single),
            threshold_couple: format_cad(c.income_threshold_couple),
            cpp_exemption: format_cad(c.cpp_exemption),
            rrsp_max: format_cad(c.rrsp_annual_maximum),
            rrsp_rate: format_rate(c.rrsp_contribution_rate),
            tfsa: format_cad(c.tfsa_annual_limit),
        }
    }
}

impl ConstantsCommand {
    pub fn exec(&self, table: &BenefitConstantsTable) -> anyhow::Result<()> {
        let years = match self.year {
            Some(year) => vec![table.lookup(BenefitYear(year))?],
            None => table.years().collect(),
        };

        if self.json {
            return print_json(&ConstantsData {
                fingerprint: table.fingerprint(),
                years,
            });
        }

        print_table(years.into_iter().map(ConstantsRow::from).collect());
        println!("sha256 {}", table.fingerprint());
        Ok(())
    }
}
