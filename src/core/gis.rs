//! Guaranteed Income Supplement entitlement and eligibility.

use super::canada::{BenefitYear, MaritalStatus};
use super::constants::{BenefitConstantsTable, BenefitYearConstants};
use super::error::{ensure_non_negative, CalculationError};
use super::money::{format_cad, round_cents, MONTHS_PER_YEAR};
use rust_decimal::Decimal;
use serde::Serialize;

/// Which GIS schedule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitVariant {
    Single,
    /// Both partners receive OAS
    CoupleBothReceiving,
    /// The spouse does not receive OAS
    CoupleOneReceiving,
}

impl BenefitVariant {
    pub fn resolve(marital_status: MaritalStatus, spouse_receiving_oas: bool) -> Self {
        match (marital_status.is_couple(), spouse_receiving_oas) {
            (false, _) => BenefitVariant::Single,
            (true, true) => BenefitVariant::CoupleBothReceiving,
            (true, false) => BenefitVariant::CoupleOneReceiving,
        }
    }

    pub fn is_couple(self) -> bool {
        self != BenefitVariant::Single
    }

    pub fn label(self) -> &'static str {
        match self {
            BenefitVariant::Single => "single",
            BenefitVariant::CoupleBothReceiving => "couple (both receiving OAS)",
            BenefitVariant::CoupleOneReceiving => "couple (one receiving OAS)",
        }
    }
}

/// Maximum, threshold and reduction rate for one variant in one year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenefitParameters {
    pub variant: BenefitVariant,
    pub max_benefit: Decimal,
    pub threshold: Decimal,
    pub reduction_rate: Decimal,
}

impl BenefitParameters {
    pub fn for_variant(constants: &BenefitYearConstants, variant: BenefitVariant) -> Self {
        let (max_benefit, threshold, reduction_rate) = match variant {
            BenefitVariant::Single => (
                constants.max_benefit_single,
                constants.income_threshold_single,
                constants.reduction_rate_single,
            ),
            BenefitVariant::CoupleBothReceiving => (
                constants.max_benefit_couple_both_receiving,
                constants.income_threshold_couple,
                constants.reduction_rate_couple,
            ),
            BenefitVariant::CoupleOneReceiving => (
                constants.max_benefit_couple_one_receiving,
                constants.income_threshold_couple,
                constants.reduction_rate_couple,
            ),
        };
        BenefitParameters {
            variant,
            max_benefit,
            threshold,
            reduction_rate,
        }
    }

    /// Monthly entitlement before rounding
    fn monthly_entitlement(&self, income: Decimal) -> Decimal {
        if income <= Decimal::ZERO {
            self.max_benefit
        } else if income >= self.threshold {
            Decimal::ZERO
        } else {
            let monthly_reduction = income * self.reduction_rate / MONTHS_PER_YEAR;
            (self.max_benefit - monthly_reduction).max(Decimal::ZERO)
        }
    }
}

/// GIS entitlement for one person
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenefitAmount {
    pub year: i32,
    pub variant: BenefitVariant,
    pub monthly_amount: Decimal,
    pub annual_amount: Decimal,
    /// Countable income the entitlement was tested against
    pub income_test_amount: Decimal,
}

impl BenefitAmount {
    fn compute(constants: &BenefitYearConstants, variant: BenefitVariant, income: Decimal) -> Self {
        let params = BenefitParameters::for_variant(constants, variant);
        let monthly = params.monthly_entitlement(income);
        log::debug!(
            "GIS {} {}: income {} max {} threshold {} rate {} -> {}",
            constants.year,
            variant.label(),
            income,
            params.max_benefit,
            params.threshold,
            params.reduction_rate,
            monthly
        );

        BenefitAmount {
            year: constants.year,
            variant,
            monthly_amount: round_cents(monthly),
            annual_amount: round_cents(monthly * MONTHS_PER_YEAR),
            income_test_amount: income,
        }
    }

    fn zero(constants: &BenefitYearConstants, variant: BenefitVariant, income: Decimal) -> Self {
        BenefitAmount {
            year: constants.year,
            variant,
            monthly_amount: Decimal::ZERO,
            annual_amount: Decimal::ZERO,
            income_test_amount: income,
        }
    }
}

/// Calculate the GIS entitlement for a single person's countable income
pub fn calculate_benefit(
    table: &BenefitConstantsTable,
    income: Decimal,
    marital_status: MaritalStatus,
    spouse_receiving_oas: bool,
    year: BenefitYear,
) -> Result<BenefitAmount, CalculationError> {
    let income = ensure_non_negative("income", income)?;
    let constants = table.lookup(year)?;
    let variant = BenefitVariant::resolve(marital_status, spouse_receiving_oas);
    Ok(BenefitAmount::compute(constants, variant, income))
}

/// GIS entitlements for a married or common-law couple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoupleBenefit {
    pub combined_income: Decimal,
    pub first: BenefitAmount,
    pub second: BenefitAmount,
    pub household_monthly: Decimal,
    pub household_annual: Decimal,
}

impl CoupleBenefit {
    fn new(combined_income: Decimal, first: BenefitAmount, second: BenefitAmount) -> Self {
        CoupleBenefit {
            combined_income,
            household_monthly: first.monthly_amount + second.monthly_amount,
            household_annual: first.annual_amount + second.annual_amount,
            first,
            second,
        }
    }
}

/// Calculate GIS for both partners of a couple.
///
/// Each partner is tested against the couple's *combined* income under the
/// couple schedule, as if the whole amount were their own. The combined
/// income must not be split between the partners; the household totals are
/// the sum of the two individual entitlements.
pub fn calculate_benefit_for_couple(
    table: &BenefitConstantsTable,
    first_income: Decimal,
    second_income: Decimal,
    both_receiving_oas: bool,
    year: BenefitYear,
) -> Result<CoupleBenefit, CalculationError> {
    let first_income = ensure_non_negative("first partner income", first_income)?;
    let second_income = ensure_non_negative("second partner income", second_income)?;
    let constants = table.lookup(year)?;

    let combined = first_income + second_income;
    let variant = BenefitVariant::resolve(MaritalStatus::Married, both_receiving_oas);
    let first = BenefitAmount::compute(constants, variant, combined);
    let second = BenefitAmount::compute(constants, variant, combined);

    Ok(CoupleBenefit::new(combined, first, second))
}

/// Why a person does not qualify for GIS
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum IneligibilityReason {
    BelowEligibilityAge { age: u32, minimum: u32 },
    NotReceivingOas,
    IncomeAtOrAboveThreshold { income: Decimal, threshold: Decimal },
}

impl std::fmt::Display for IneligibilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IneligibilityReason::BelowEligibilityAge { age, minimum } => {
                write!(f, "age {age} is below the GIS eligibility age of {minimum}")
            }
            IneligibilityReason::NotReceivingOas => {
                write!(f, "GIS is only paid to OAS pension recipients")
            }
            IneligibilityReason::IncomeAtOrAboveThreshold { income, threshold } => write!(
                f,
                "countable income {} is at or above the {} threshold",
                format_cad(*income),
                format_cad(*threshold)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    pub reason: Option<IneligibilityReason>,
}

impl Eligibility {
    fn eligible() -> Self {
        Eligibility {
            eligible: true,
            reason: None,
        }
    }

    fn ineligible(reason: IneligibilityReason) -> Self {
        Eligibility {
            eligible: false,
            reason: Some(reason),
        }
    }
}

/// Check the GIS eligibility gate.
///
/// Conditions are checked in order (age, OAS receipt, income) and the first
/// failure is reported. Couples are tested against the couple threshold.
pub fn check_eligibility(
    table: &BenefitConstantsTable,
    age: u32,
    receiving_oas: bool,
    income: Decimal,
    marital_status: MaritalStatus,
    year: BenefitYear,
) -> Result<Eligibility, CalculationError> {
    let income = ensure_non_negative("income", income)?;
    let constants = table.lookup(year)?;
    Ok(eligibility_gate(
        constants,
        age,
        receiving_oas,
        income,
        marital_status.is_couple(),
    ))
}

fn eligibility_gate(
    constants: &BenefitYearConstants,
    age: u32,
    receiving_oas: bool,
    income: Decimal,
    couple: bool,
) -> Eligibility {
    if age < constants.eligibility_age {
        return Eligibility::ineligible(IneligibilityReason::BelowEligibilityAge {
            age,
            minimum: constants.eligibility_age,
        });
    }
    if !receiving_oas {
        return Eligibility::ineligible(IneligibilityReason::NotReceivingOas);
    }

    let threshold = if couple {
        constants.income_threshold_couple
    } else {
        constants.income_threshold_single
    };
    if income >= threshold {
        return Eligibility::ineligible(IneligibilityReason::IncomeAtOrAboveThreshold {
            income,
            threshold,
        });
    }
    Eligibility::eligible()
}

/// Facts about one person needed for the GIS test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonFacts {
    pub age: u32,
    pub receiving_oas: bool,
    /// Countable annual income
    pub annual_income: Decimal,
    pub marital_status: MaritalStatus,
}

/// A married or common-law couple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoupleFacts {
    pub first: PersonFacts,
    pub second: PersonFacts,
}

impl CoupleFacts {
    pub fn combined_income(&self) -> Decimal {
        self.first.annual_income + self.second.annual_income
    }
}

/// Eligibility gate plus entitlement. Ineligible people get a zero amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub eligibility: Eligibility,
    pub benefit: BenefitAmount,
}

fn assess(
    constants: &BenefitYearConstants,
    age: u32,
    receiving_oas: bool,
    income: Decimal,
    variant: BenefitVariant,
) -> Assessment {
    let eligibility = eligibility_gate(constants, age, receiving_oas, income, variant.is_couple());
    let benefit = if eligibility.eligible {
        BenefitAmount::compute(constants, variant, income)
    } else {
        BenefitAmount::zero(constants, variant, income)
    };
    Assessment {
        eligibility,
        benefit,
    }
}

/// Assess a single person. Couple statuses should use [`assess_couple`].
pub fn assess_person(
    table: &BenefitConstantsTable,
    facts: &PersonFacts,
    spouse_receiving_oas: bool,
    year: BenefitYear,
) -> Result<Assessment, CalculationError> {
    let income = ensure_non_negative("income", facts.annual_income)?;
    let constants = table.lookup(year)?;
    let variant = BenefitVariant::resolve(facts.marital_status, spouse_receiving_oas);
    Ok(assess(constants, facts.age, facts.receiving_oas, income, variant))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoupleAssessment {
    pub combined_income: Decimal,
    pub first: Assessment,
    pub second: Assessment,
    pub household_monthly: Decimal,
    pub household_annual: Decimal,
}

/// Assess both partners against their combined income
pub fn assess_couple(
    table: &BenefitConstantsTable,
    facts: &CoupleFacts,
    year: BenefitYear,
) -> Result<CoupleAssessment, CalculationError> {
    ensure_non_negative("first partner income", facts.first.annual_income)?;
    ensure_non_negative("second partner income", facts.second.annual_income)?;
    let constants = table.lookup(year)?;
    let combined = facts.combined_income();

    let partner = |person: &PersonFacts, spouse: &PersonFacts| {
        let variant = BenefitVariant::resolve(MaritalStatus::Married, spouse.receiving_oas);
        assess(constants, person.age, person.receiving_oas, combined, variant)
    };
    let first = partner(&facts.first, &facts.second);
    let second = partner(&facts.second, &facts.first);

    Ok(CoupleAssessment {
        combined_income: combined,
        household_monthly: first.benefit.monthly_amount + second.benefit.monthly_amount,
        household_annual: first.benefit.annual_amount + second.benefit.annual_amount,
        first,
        second,
    })
}
