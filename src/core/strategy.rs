//! Heuristic planning suggestions.
//!
//! Advisory only: suggestions are derived from the calculators' own figures
//! and never feed back into any amount.

use super::canada::{BenefitYear, MaritalStatus};
use super::constants::BenefitConstantsTable;
use super::error::{ensure_non_negative, CalculationError};
use super::gis::{check_eligibility, BenefitParameters, BenefitVariant, IneligibilityReason};
use super::limits::calculate_contribution_limit;
use super::money::{format_cad, format_rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Accounts the person holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountFlags {
    pub has_rrsp: bool,
    pub has_rrif: bool,
    pub has_tfsa: bool,
    pub has_employer_pension: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyInput {
    pub year: BenefitYear,
    pub age: u32,
    pub marital_status: MaritalStatus,
    pub receiving_oas: bool,
    /// Only meaningful for couples
    pub spouse_receiving_oas: bool,
    pub receiving_cpp: bool,
    /// Countable income for the GIS test (combined for couples)
    pub countable_income: Decimal,
    pub earned_income: Decimal,
    pub pension_adjustment: Decimal,
    pub accounts: AccountFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ApplyForOas,
    ReduceCountableIncome,
    PreferTfsaWithdrawals,
    ConvertRrspToRrif,
    ContributeToRrsp,
    PensionIncomeSplitting,
    CppTiming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    /// 1 is most important
    pub priority: u8,
    pub kind: StrategyKind,
    pub title: String,
    pub detail: String,
}

/// Suggest strategies, most important first
pub fn suggest_strategies(
    table: &BenefitConstantsTable,
    input: &StrategyInput,
) -> Result<Vec<Suggestion>, CalculationError> {
    let income = ensure_non_negative("countable income", input.countable_income)?;
    let constants = table.lookup(input.year)?;
    let eligibility = check_eligibility(
        table,
        input.age,
        input.receiving_oas,
        income,
        input.marital_status,
        input.year,
    )?;
    let variant = BenefitVariant::resolve(input.marital_status, input.spouse_receiving_oas);
    let params = BenefitParameters::for_variant(constants, variant);
    let accounts = input.accounts;

    let mut suggestions = Vec::new();

    match &eligibility.reason {
        Some(IneligibilityReason::NotReceivingOas) => suggestions.push(Suggestion {
            priority: 1,
            kind: StrategyKind::ApplyForOas,
            title: "Apply for the OAS pension".to_string(),
            detail: "GIS is only paid to OAS recipients; apply for OAS before applying for GIS."
                .to_string(),
        }),
        Some(IneligibilityReason::IncomeAtOrAboveThreshold { income, threshold })
            if *income - *threshold < *threshold * dec!(0.10) =>
        {
            suggestions.push(Suggestion {
                priority: 1,
                kind: StrategyKind::ReduceCountableIncome,
                title: "Lower countable income below the GIS threshold".to_string(),
                detail: format!(
                    "Countable income of {} must fall by more than {} to get under the {} threshold. \
                     TFSA withdrawals do not count toward this test.",
                    format_cad(*income),
                    format_cad(*income - *threshold),
                    format_cad(*threshold)
                ),
            })
        }
        _ => {}
    }

    if eligibility.eligible && accounts.has_tfsa && (accounts.has_rrif || accounts.has_rrsp) {
        suggestions.push(Suggestion {
            priority: 1,
            kind: StrategyKind::PreferTfsaWithdrawals,
            title: "Draw from the TFSA before the RRIF".to_string(),
            detail: format!(
                "Every $1,000 of RRIF withdrawals reduces GIS by {} a year ({} of income); \
                 TFSA withdrawals are not countable.",
                format_cad(dec!(1000) * params.reduction_rate),
                format_rate(params.reduction_rate)
            ),
        });
    }

    let cutoff = constants.rrsp_cutoff_age;
    if accounts.has_rrsp && input.age >= cutoff.saturating_sub(6) && input.age < cutoff {
        suggestions.push(Suggestion {
            priority: 2,
            kind: StrategyKind::ConvertRrspToRrif,
            title: "Plan the RRSP to RRIF conversion".to_string(),
            detail: format!(
                "RRSPs must be converted by the end of the year you turn {cutoff}; \
                 {} year(s) remain.",
                cutoff - input.age
            ),
        });
    }

    if accounts.has_rrsp && input.earned_income > Decimal::ZERO {
        let limit = calculate_contribution_limit(
            table,
            input.earned_income,
            input.age,
            input.pension_adjustment,
            input.year,
        )?;
        if limit.can_contribute && limit.annual_limit > Decimal::ZERO {
            suggestions.push(Suggestion {
                priority: 3,
                kind: StrategyKind::ContributeToRrsp,
                title: "Use available RRSP room".to_string(),
                detail: format!(
                    "Up to {} ({} a month) can be contributed for {}, reducing taxable income.",
                    format_cad(limit.annual_limit),
                    format_cad(limit.monthly_limit),
                    limit.year
                ),
            });
        }
    }

    if input.marital_status.is_couple()
        && input.age >= constants.eligibility_age
        && (accounts.has_employer_pension || accounts.has_rrif)
    {
        suggestions.push(Suggestion {
            priority: 3,
            kind: StrategyKind::PensionIncomeSplitting,
            title: "Consider pension income splitting".to_string(),
            detail: "Up to half of eligible pension income can be reported by a spouse to even out \
                     taxable income. GIS still tests the couple's combined income."
                .to_string(),
        });
    }

    if !input.receiving_cpp && (60..70).contains(&input.age) && income < params.threshold {
        suggestions.push(Suggestion {
            priority: 4,
            kind: StrategyKind::CppTiming,
            title: "Review when to start CPP".to_string(),
            detail: format!(
                "CPP above the {} exemption counts toward the GIS income test; \
                 compare starting now with deferring.",
                format_cad(constants.cpp_exemption)
            ),
        });
    }

    suggestions.sort_by_key(|s| s.priority);
    Ok(suggestions)
}
