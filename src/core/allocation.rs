use super::error::{ensure_non_negative, CalculationError};
use super::limits::ContributionLimit;
use super::money::{floor_cents, MONTHS_PER_YEAR};
use super::warnings::AllocationWarning;
use rust_decimal::Decimal;
use serde::Serialize;

/// Account types in waterfall order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    Rrsp,
    Tfsa,
    NonRegistered,
}

impl Account {
    pub fn is_sheltered(self) -> bool {
        self != Account::NonRegistered
    }

    pub fn label(self) -> &'static str {
        match self {
            Account::Rrsp => "RRSP",
            Account::Tfsa => "TFSA",
            Account::NonRegistered => "Non-registered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub account: Account,
    pub monthly_amount: Decimal,
    pub annual_amount: Decimal,
    /// Growth is taxed as it is earned
    pub taxable: bool,
}

impl Allocation {
    fn new(account: Account, monthly_amount: Decimal) -> Self {
        Allocation {
            account,
            monthly_amount,
            annual_amount: monthly_amount * MONTHS_PER_YEAR,
            taxable: !account.is_sheltered(),
        }
    }
}

/// Savings split across accounts. Always lists RRSP, TFSA and non-registered in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationResult {
    pub allocations: Vec<Allocation>,
    pub warnings: Vec<AllocationWarning>,
}

impl AllocationResult {
    pub fn monthly_for(&self, account: Account) -> Decimal {
        self.allocations
            .iter()
            .filter(|a| a.account == account)
            .map(|a| a.monthly_amount)
            .sum()
    }

    pub fn total_monthly(&self) -> Decimal {
        self.allocations.iter().map(|a| a.monthly_amount).sum()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

/// Place a monthly savings amount: RRSP first, then TFSA, then non-registered.
///
/// Nothing is rounded here, so the allocations always add back up to
/// `monthly_savings` exactly.
pub fn allocate_savings(
    monthly_savings: Decimal,
    rrsp_limit_monthly: Decimal,
    tfsa_limit_monthly: Decimal,
    can_contribute_rrsp: bool,
) -> Result<AllocationResult, CalculationError> {
    let savings = ensure_non_negative("monthly savings", monthly_savings)?;
    let rrsp_limit = ensure_non_negative("RRSP monthly limit", rrsp_limit_monthly)?;
    let tfsa_limit = ensure_non_negative("TFSA monthly limit", tfsa_limit_monthly)?;

    let mut warnings = Vec::new();
    let mut remaining = savings;

    let rrsp = if can_contribute_rrsp {
        if savings > rrsp_limit {
            warnings.push(AllocationWarning::RrspCapped {
                requested: savings,
                limit: rrsp_limit,
            });
        }
        remaining.min(rrsp_limit)
    } else {
        if savings > Decimal::ZERO {
            warnings.push(AllocationWarning::RrspUnavailable);
        }
        Decimal::ZERO
    };
    remaining -= rrsp;

    let tfsa = remaining.min(tfsa_limit);
    remaining -= tfsa;
    if remaining > Decimal::ZERO {
        warnings.push(AllocationWarning::ShelteredLimitsExhausted {
            overflow: remaining,
        });
    }

    log::debug!(
        "Allocated {} as RRSP {} TFSA {} non-registered {}",
        savings,
        rrsp,
        tfsa,
        remaining
    );

    Ok(AllocationResult {
        allocations: vec![
            Allocation::new(Account::Rrsp, rrsp),
            Allocation::new(Account::Tfsa, tfsa),
            Allocation::new(Account::NonRegistered, remaining),
        ],
        warnings,
    })
}

/// Allocate against computed RRSP and TFSA limits.
///
/// Monthly caps are the annual limits divided by twelve and truncated to the
/// cent, so a year of contributions stays within each annual limit.
pub fn allocate_with_limits(
    monthly_savings: Decimal,
    rrsp: &ContributionLimit,
    tfsa: &ContributionLimit,
) -> Result<AllocationResult, CalculationError> {
    let tfsa_monthly = if tfsa.can_contribute {
        monthly_cap(tfsa)
    } else {
        Decimal::ZERO
    };
    allocate_savings(
        monthly_savings,
        monthly_cap(rrsp),
        tfsa_monthly,
        rrsp.can_contribute,
    )
}

fn monthly_cap(limit: &ContributionLimit) -> Decimal {
    floor_cents(limit.annual_limit / MONTHS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::canada::BenefitYear;
    use crate::core::constants::BenefitConstantsTable;
    use crate::core::limits::{calculate_contribution_limit, tfsa_room};
    use crate::core::money::round_cents;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rust_decimal_macros::dec;

    #[test]
    fn fits_entirely_in_rrsp() {
        let result = allocate_savings(dec!(500), dec!(1500), dec!(583.33), true).unwrap();
        assert_eq!(result.monthly_for(Account::Rrsp), dec!(500));
        assert_eq!(result.monthly_for(Account::Tfsa), dec!(0));
        assert_eq!(result.monthly_for(Account::NonRegistered), dec!(0));
        assert!(result.warnings.is_empty());
        assert_eq!(result.allocations[0].annual_amount, dec!(6000));
    }

    #[test]
    fn overflow_from_rrsp_goes_to_tfsa() {
        let result = allocate_savings(dec!(2000), dec!(1500), dec!(583.33), true).unwrap();
        assert_eq!(result.monthly_for(Account::Rrsp), dec!(1500));
        assert_eq!(result.monthly_for(Account::Tfsa), dec!(500));
        assert_eq!(result.monthly_for(Account::NonRegistered), dec!(0));
        assert_eq!(
            result.warnings,
            vec![AllocationWarning::RrspCapped {
                requested: dec!(2000),
                limit: dec!(1500)
            }]
        );
    }

    #[test]
    fn both_limits_exhausted() {
        let result = allocate_savings(dec!(3000), dec!(1500), dec!(583.33), true).unwrap();
        assert_eq!(result.monthly_for(Account::Rrsp), dec!(1500));
        assert_eq!(result.monthly_for(Account::Tfsa), dec!(583.33));
        assert_eq!(result.monthly_for(Account::NonRegistered), dec!(916.67));
        assert_eq!(result.total_monthly(), dec!(3000));
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(
            result.warnings[1],
            AllocationWarning::ShelteredLimitsExhausted {
                overflow: dec!(916.67)
            }
        );

        let non_registered = &result.allocations[2];
        assert_eq!(non_registered.account, Account::NonRegistered);
        assert!(non_registered.taxable);
        assert!(!result.allocations[0].taxable);
        assert!(!result.allocations[1].taxable);
    }

    #[test]
    fn skips_rrsp_when_not_allowed() {
        let result = allocate_savings(dec!(1000), dec!(1500), dec!(583.33), false).unwrap();
        assert_eq!(result.monthly_for(Account::Rrsp), dec!(0));
        assert_eq!(result.monthly_for(Account::Tfsa), dec!(583.33));
        assert_eq!(result.monthly_for(Account::NonRegistered), dec!(416.67));
        assert_eq!(result.warnings[0], AllocationWarning::RrspUnavailable);
    }

    #[test]
    fn accounts_listed_in_waterfall_order() {
        let result = allocate_savings(dec!(0), dec!(0), dec!(0), true).unwrap();
        let accounts: Vec<_> = result.allocations.iter().map(|a| a.account).collect();
        assert_eq!(
            accounts,
            vec![Account::Rrsp, Account::Tfsa, Account::NonRegistered]
        );
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn warning_messages_are_readable() {
        let result = allocate_savings(dec!(3000), dec!(1500), dec!(583.33), true).unwrap();
        assert_eq!(
            result.warning_messages(),
            vec![
                "Requested $3000.00/month exceeds RRSP room; RRSP capped at $1500.00/month"
                    .to_string(),
                "RRSP and TFSA limits exhausted; $916.67/month goes to a taxable non-registered account"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn negative_inputs_rejected() {
        assert!(allocate_savings(dec!(-1), dec!(0), dec!(0), true).is_err());
        assert!(allocate_savings(dec!(1), dec!(-1), dec!(0), true).is_err());
        assert!(allocate_savings(dec!(1), dec!(0), dec!(-1), true).is_err());
    }

    #[test]
    fn allocate_with_computed_limits() {
        let rrsp = ContributionLimit {
            year: 2024,
            annual_limit: dec!(0),
            monthly_limit: dec!(0),
            can_contribute: false,
        };
        let tfsa = ContributionLimit {
            year: 2024,
            annual_limit: dec!(7000),
            monthly_limit: dec!(583.33),
            can_contribute: true,
        };
        let result = allocate_with_limits(dec!(600), &rrsp, &tfsa).unwrap();
        assert_eq!(result.monthly_for(Account::Tfsa), dec!(583.33));
        assert_eq!(result.monthly_for(Account::NonRegistered), dec!(16.67));
    }

    #[test]
    fn yearly_total_stays_within_annual_limit() {
        let table = BenefitConstantsTable::builtin();
        let year = BenefitYear(2023);
        // 6500 / 12 rounds up to 541.67 for display
        let tfsa = tfsa_room(&table, 40, dec!(0), year).unwrap();
        assert_eq!(tfsa.monthly_limit, dec!(541.67));
        // past the RRSP cutoff age
        let rrsp = calculate_contribution_limit(&table, dec!(0), 72, dec!(0), year).unwrap();

        let result = allocate_with_limits(dec!(600), &rrsp, &tfsa).unwrap();
        let tfsa_slot = &result.allocations[1];
        assert_eq!(tfsa_slot.monthly_amount, dec!(541.66));
        assert!(tfsa_slot.annual_amount <= tfsa.annual_limit);
        assert_eq!(result.monthly_for(Account::NonRegistered), dec!(58.34));
        assert_eq!(result.total_monthly(), dec!(600));
    }

    proptest! {
        #[test]
        fn prop_allocation_conserves_savings(
            savings_cents in 0i64..2_000_000,
            rrsp_cents in 0i64..500_000,
            tfsa_cents in 0i64..200_000,
            can_rrsp in proptest::bool::ANY,
        ) {
            let savings = Decimal::new(savings_cents, 2);
            let rrsp_limit = Decimal::new(rrsp_cents, 2);
            let tfsa_limit = Decimal::new(tfsa_cents, 2);

            let result = allocate_savings(savings, rrsp_limit, tfsa_limit, can_rrsp).unwrap();
            prop_assert_eq!(result.total_monthly(), savings);
            prop_assert!(result.monthly_for(Account::Rrsp) <= rrsp_limit);
            prop_assert!(result.monthly_for(Account::Tfsa) <= tfsa_limit);
            prop_assert!(result.allocations.iter().all(|a| a.monthly_amount >= Decimal::ZERO));
            if !can_rrsp {
                prop_assert_eq!(result.monthly_for(Account::Rrsp), Decimal::ZERO);
            }
        }

        #[test]
        fn prop_annual_allocations_within_limits(
            savings_cents in 0i64..2_000_000,
            rrsp_annual in 0i64..40_000,
            tfsa_annual in 0i64..20_000,
        ) {
            let open = |annual: i64| ContributionLimit {
                year: 2024,
                annual_limit: Decimal::from(annual),
                monthly_limit: round_cents(Decimal::from(annual) / MONTHS_PER_YEAR),
                can_contribute: true,
            };
            let (rrsp, tfsa) = (open(rrsp_annual), open(tfsa_annual));
            let result = allocate_with_limits(Decimal::new(savings_cents, 2), &rrsp, &tfsa).unwrap();
            prop_assert!(result.allocations[0].annual_amount <= rrsp.annual_limit);
            prop_assert!(result.allocations[1].annual_amount <= tfsa.annual_limit);
        }
    }
}
