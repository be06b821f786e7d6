//! RRSP contribution limits and TFSA room.

use super::canada::BenefitYear;
use super::constants::BenefitConstantsTable;
use super::error::{ensure_non_negative, CalculationError};
use super::money::{round_cents, MONTHS_PER_YEAR};
use rust_decimal::Decimal;
use serde::Serialize;

/// Contribution ceiling for one account and year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContributionLimit {
    pub year: i32,
    pub annual_limit: Decimal,
    pub monthly_limit: Decimal,
    pub can_contribute: bool,
}

impl ContributionLimit {
    fn closed(year: i32) -> Self {
        ContributionLimit {
            year,
            annual_limit: Decimal::ZERO,
            monthly_limit: Decimal::ZERO,
            can_contribute: false,
        }
    }

    fn open(year: i32, annual: Decimal) -> Self {
        ContributionLimit {
            year,
            annual_limit: round_cents(annual),
            monthly_limit: round_cents(annual / MONTHS_PER_YEAR),
            can_contribute: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionLimitRequest {
    pub annual_earned_income: Decimal,
    pub age: u32,
    pub pension_adjustment: Decimal,
}

impl ContributionLimitRequest {
    pub fn calculate(
        &self,
        table: &BenefitConstantsTable,
        year: BenefitYear,
    ) -> Result<ContributionLimit, CalculationError> {
        calculate_contribution_limit(
            table,
            self.annual_earned_income,
            self.age,
            self.pension_adjustment,
            year,
        )
    }
}

/// RRSP deduction limit for the year.
///
/// 18% of earned income, capped at the annual maximum, less the pension
/// adjustment. Nobody at or past the cutoff age can contribute.
pub fn calculate_contribution_limit(
    table: &BenefitConstantsTable,
    annual_earned_income: Decimal,
    age: u32,
    pension_adjustment: Decimal,
    year: BenefitYear,
) -> Result<ContributionLimit, CalculationError> {
    let income = ensure_non_negative("earned income", annual_earned_income)?;
    let pension_adjustment = ensure_non_negative("pension adjustment", pension_adjustment)?;
    let constants = table.lookup(year)?;

    if age >= constants.rrsp_cutoff_age {
        log::debug!(
            "RRSP closed for {}: age {} >= {}",
            constants.year,
            age,
            constants.rrsp_cutoff_age
        );
        return Ok(ContributionLimit::closed(constants.year));
    }

    let income_based = income * constants.rrsp_contribution_rate;
    let effective = income_based.min(constants.rrsp_annual_maximum);
    let limit = (effective - pension_adjustment).max(Decimal::ZERO);

    Ok(ContributionLimit::open(constants.year, limit))
}

/// TFSA room available this year: the annual limit plus unused room carried forward
pub fn tfsa_room(
    table: &BenefitConstantsTable,
    age: u32,
    unused_room: Decimal,
    year: BenefitYear,
) -> Result<ContributionLimit, CalculationError> {
    let unused_room = ensure_non_negative("unused TFSA room", unused_room)?;
    let constants = table.lookup(year)?;

    if age < constants.tfsa_minimum_age {
        return Ok(ContributionLimit::closed(constants.year));
    }
    Ok(ContributionLimit::open(
        constants.year,
        constants.tfsa_annual_limit + unused_room,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rrsp(income: Decimal, age: u32, pa: Decimal, year: i32) -> ContributionLimit {
        calculate_contribution_limit(
            &BenefitConstantsTable::builtin(),
            income,
            age,
            pa,
            BenefitYear(year),
        )
        .unwrap()
    }

    #[test]
    fn eighteen_percent_of_income() {
        let limit = rrsp(dec!(100000), 45, dec!(0), 2024);
        assert!(limit.can_contribute);
        assert_eq!(limit.annual_limit, dec!(18000));
        assert_eq!(limit.monthly_limit, dec!(1500));
    }

    #[test]
    fn pension_adjustment_reduces_room() {
        let limit = rrsp(dec!(100000), 45, dec!(3000), 2024);
        assert_eq!(limit.annual_limit, dec!(15000));
        assert_eq!(limit.monthly_limit, dec!(1250));
    }

    #[test]
    fn pension_adjustment_never_makes_room_negative() {
        let limit = rrsp(dec!(20000), 45, dec!(10000), 2024);
        assert!(limit.can_contribute);
        assert_eq!(limit.annual_limit, dec!(0));
        assert_eq!(limit.monthly_limit, dec!(0));
    }

    #[test]
    fn capped_at_annual_maximum() {
        let limit = rrsp(dec!(500000), 50, dec!(0), 2024);
        assert_eq!(limit.annual_limit, dec!(31560));
        assert_eq!(limit.monthly_limit, dec!(2630));

        let limit = rrsp(dec!(500000), 50, dec!(0), 2025);
        assert_eq!(limit.annual_limit, dec!(32490));
        assert_eq!(limit.monthly_limit, dec!(2707.50));
    }

    #[test]
    fn cap_applies_before_pension_adjustment() {
        let limit = rrsp(dec!(500000), 50, dec!(1560), 2024);
        assert_eq!(limit.annual_limit, dec!(30000));
    }

    #[test]
    fn cutoff_age_closes_rrsp() {
        for age in [71, 72, 90] {
            let limit = rrsp(dec!(1000000), age, dec!(0), 2024);
            assert!(!limit.can_contribute);
            assert_eq!(limit.annual_limit, dec!(0));
            assert_eq!(limit.monthly_limit, dec!(0));
        }

        let limit = rrsp(dec!(100000), 70, dec!(0), 2024);
        assert!(limit.can_contribute);
        assert_eq!(limit.annual_limit, dec!(18000));
    }

    #[test]
    fn limits_rounded_half_up_at_output() {
        // 55555.55 * 0.18 = 9999.999
        let limit = rrsp(dec!(55555.55), 40, dec!(0), 2024);
        assert_eq!(limit.annual_limit, dec!(10000.00));
        assert_eq!(limit.monthly_limit, dec!(833.33));
    }

    #[test]
    fn negative_inputs_rejected() {
        let table = BenefitConstantsTable::builtin();
        assert!(calculate_contribution_limit(&table, dec!(-1), 40, dec!(0), BenefitYear(2024)).is_err());
        assert!(calculate_contribution_limit(&table, dec!(1), 40, dec!(-1), BenefitYear(2024)).is_err());
    }

    #[test]
    fn request_delegates_to_calculation() {
        let request = ContributionLimitRequest {
            annual_earned_income: dec!(60000),
            age: 35,
            pension_adjustment: dec!(800),
        };
        let limit = request
            .calculate(&BenefitConstantsTable::builtin(), BenefitYear(2025))
            .unwrap();
        assert_eq!(limit.annual_limit, dec!(10000));
        assert_eq!(limit.year, 2025);
    }

    #[test]
    fn tfsa_room_includes_carry_forward() {
        let table = BenefitConstantsTable::builtin();
        let room = tfsa_room(&table, 40, dec!(5000), BenefitYear(2024)).unwrap();
        assert!(room.can_contribute);
        assert_eq!(room.annual_limit, dec!(12000));
        assert_eq!(room.monthly_limit, dec!(1000));

        let room = tfsa_room(&table, 40, dec!(0), BenefitYear(2023)).unwrap();
        assert_eq!(room.annual_limit, dec!(6500));
        assert_eq!(room.monthly_limit, dec!(541.67));
    }

    #[test]
    fn tfsa_closed_to_minors() {
        let room = tfsa_room(&BenefitConstantsTable::builtin(), 17, dec!(0), BenefitYear(2024)).unwrap();
        assert!(!room.can_contribute);
        assert_eq!(room.annual_limit, dec!(0));
    }
}
