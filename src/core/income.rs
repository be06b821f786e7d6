use super::constants::BenefitYearConstants;
use super::error::{ensure_non_negative, CalculationError};
use super::money::format_cad;
use benefitc_derive::CsvColumns;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;

/// Source of a person's annual income
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum IncomeCategory {
    Employment,
    /// Employer or private pension
    Pension,
    /// Withdrawals from a RRIF or RRSP
    RrifWithdrawal,
    Investment,
    Rental,
    /// Canada Pension Plan benefit
    Cpp,
    /// Old Age Security pension
    Oas,
    TfsaWithdrawal,
}

/// How a category is treated by the GIS income test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemptionRule {
    FullyCountable,
    /// The first `cpp_exemption` dollars are not countable
    FixedExemption,
    NeverCountable,
}

impl IncomeCategory {
    pub const ALL: [IncomeCategory; 8] = [
        IncomeCategory::Employment,
        IncomeCategory::Pension,
        IncomeCategory::RrifWithdrawal,
        IncomeCategory::Investment,
        IncomeCategory::Rental,
        IncomeCategory::Cpp,
        IncomeCategory::Oas,
        IncomeCategory::TfsaWithdrawal,
    ];

    pub fn exemption_rule(self) -> ExemptionRule {
        match self {
            IncomeCategory::Employment
            | IncomeCategory::Pension
            | IncomeCategory::RrifWithdrawal
            | IncomeCategory::Investment
            | IncomeCategory::Rental => ExemptionRule::FullyCountable,
            IncomeCategory::Cpp => ExemptionRule::FixedExemption,
            IncomeCategory::Oas | IncomeCategory::TfsaWithdrawal => ExemptionRule::NeverCountable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncomeCategory::Employment => "employment",
            IncomeCategory::Pension => "pension",
            IncomeCategory::RrifWithdrawal => "rrif_withdrawal",
            IncomeCategory::Investment => "investment",
            IncomeCategory::Rental => "rental",
            IncomeCategory::Cpp => "cpp",
            IncomeCategory::Oas => "oas",
            IncomeCategory::TfsaWithdrawal => "tfsa_withdrawal",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncomeCategory::Employment => "Employment",
            IncomeCategory::Pension => "Pension",
            IncomeCategory::RrifWithdrawal => "RRIF withdrawal",
            IncomeCategory::Investment => "Investment",
            IncomeCategory::Rental => "Rental",
            IncomeCategory::Cpp => "CPP",
            IncomeCategory::Oas => "OAS",
            IncomeCategory::TfsaWithdrawal => "TFSA withdrawal",
        }
    }
}

impl FromStr for IncomeCategory {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        IncomeCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| CalculationError::InvalidInput(format!("unknown income category: {s}")))
    }
}

impl std::fmt::Display for IncomeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Annual income by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct IncomeProfile {
    #[schemars(with = "BTreeMap<IncomeCategory, f64>")]
    amounts: BTreeMap<IncomeCategory, Decimal>,
}

impl IncomeProfile {
    pub fn new() -> Self {
        IncomeProfile::default()
    }

    /// Add income to a category, accumulating repeated entries
    pub fn add(&mut self, category: IncomeCategory, amount: Decimal) -> Result<(), CalculationError> {
        ensure_non_negative(category.as_str(), amount)?;
        *self.amounts.entry(category).or_default() += amount;
        Ok(())
    }

    pub fn with(mut self, category: IncomeCategory, amount: Decimal) -> Result<Self, CalculationError> {
        self.add(category, amount)?;
        Ok(self)
    }

    pub fn get(&self, category: IncomeCategory) -> Decimal {
        self.amounts.get(&category).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IncomeCategory, Decimal)> + '_ {
        self.amounts.iter().map(|(c, a)| (*c, *a))
    }

    /// Gross income before any exemption
    pub fn total(&self) -> Decimal {
        self.amounts.values().copied().sum()
    }
}

/// Income left out of the GIS income test, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedIncome {
    pub category: IncomeCategory,
    pub amount: Decimal,
    pub reason: String,
}

impl std::fmt::Display for ExcludedIncome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.category, format_cad(self.amount), self.reason)
    }
}

/// Result of applying the GIS exemptions to an income profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedIncome {
    pub countable_total: Decimal,
    /// Countable amount per category, only for categories that contributed
    pub breakdown: BTreeMap<IncomeCategory, Decimal>,
    pub excluded: Vec<ExcludedIncome>,
}

/// Determine the income that counts toward the GIS income test
pub fn classify_income(
    profile: &IncomeProfile,
    constants: &BenefitYearConstants,
) -> Result<ClassifiedIncome, CalculationError> {
    let mut breakdown = BTreeMap::new();
    let mut excluded = Vec::new();

    for (category, amount) in profile.iter() {
        ensure_non_negative(category.as_str(), amount)?;

        let countable = match category.exemption_rule() {
            ExemptionRule::FullyCountable => amount,
            ExemptionRule::NeverCountable => {
                excluded.push(ExcludedIncome {
                    category,
                    amount,
                    reason: never_countable_reason(category).to_string(),
                });
                Decimal::ZERO
            }
            ExemptionRule::FixedExemption => {
                let exemption = constants.cpp_exemption;
                if amount <= exemption {
                    excluded.push(ExcludedIncome {
                        category,
                        amount,
                        reason: format!(
                            "below the {} exemption for {}; not countable",
                            format_cad(exemption),
                            constants.year
                        ),
                    });
                    Decimal::ZERO
                } else {
                    excluded.push(ExcludedIncome {
                        category,
                        amount: exemption,
                        reason: format!("first {} exempt for {}", format_cad(exemption), constants.year),
                    });
                    amount - exemption
                }
            }
        };

        if countable > Decimal::ZERO {
            breakdown.insert(category, countable);
        }
    }

    let countable_total = breakdown.values().copied().sum();
    log::debug!(
        "Classified income for {}: gross {} countable {}",
        constants.year,
        profile.total(),
        countable_total
    );

    Ok(ClassifiedIncome {
        countable_total,
        breakdown,
        excluded,
    })
}

fn never_countable_reason(category: IncomeCategory) -> &'static str {
    match category {
        IncomeCategory::Oas => "OAS pension is never countable",
        IncomeCategory::TfsaWithdrawal => "TFSA withdrawals are never countable",
        _ => "not countable",
    }
}

/// Column description generated for CSV record types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvColumn {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// One row of an income CSV file
#[derive(Debug, Clone, Deserialize, CsvColumns)]
pub struct IncomeRecord {
    /// Income category (employment, pension, rrif_withdrawal, investment, rental, cpp, oas, tfsa_withdrawal)
    pub category: String,
    /// Annual amount in dollars
    pub amount: Decimal,
    /// Optional free-text note, ignored by the calculation
    #[serde(default)]
    pub description: Option<String>,
}

/// Read an income profile from CSV. Repeated categories are summed.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<IncomeProfile> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut profile = IncomeProfile::new();
    for record in rdr.deserialize::<IncomeRecord>() {
        let record = record?;
        let category: IncomeCategory = record.category.parse()?;
        profile.add(category, record.amount)?;
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::canada::BenefitYear;
    use crate::core::constants::BenefitConstantsTable;
    use rust_decimal_macros::dec;

    fn constants_2024() -> BenefitYearConstants {
        BenefitConstantsTable::builtin()
            .lookup(BenefitYear(2024))
            .unwrap()
            .clone()
    }

    fn profile(entries: &[(IncomeCategory, Decimal)]) -> IncomeProfile {
        entries
            .iter()
            .try_fold(IncomeProfile::new(), |p, (c, a)| p.with(*c, *a))
            .unwrap()
    }

    #[test]
    fn fully_countable_categories_sum() {
        let p = profile(&[
            (IncomeCategory::Employment, dec!(3000)),
            (IncomeCategory::Pension, dec!(4000)),
            (IncomeCategory::RrifWithdrawal, dec!(2500)),
            (IncomeCategory::Investment, dec!(300.50)),
            (IncomeCategory::Rental, dec!(1200)),
        ]);

        let result = classify_income(&p, &constants_2024()).unwrap();
        assert_eq!(result.countable_total, dec!(11000.50));
        assert_eq!(result.breakdown.len(), 5);
        assert!(result.excluded.is_empty());
    }

    #[test]
    fn cpp_below_exemption_is_fully_excluded() {
        let p = profile(&[(IncomeCategory::Cpp, dec!(4200))]);

        let result = classify_income(&p, &constants_2024()).unwrap();
        assert_eq!(result.countable_total, dec!(0));
        assert!(!result.breakdown.contains_key(&IncomeCategory::Cpp));
        assert_eq!(result.excluded.len(), 1);
        assert_eq!(result.excluded[0].category, IncomeCategory::Cpp);
        assert_eq!(result.excluded[0].amount, dec!(4200));
    }

    #[test]
    fn cpp_at_exemption_is_fully_excluded() {
        let p = profile(&[(IncomeCategory::Cpp, dec!(5000))]);

        let result = classify_income(&p, &constants_2024()).unwrap();
        assert_eq!(result.countable_total, dec!(0));
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn cpp_above_exemption_counts_remainder() {
        let p = profile(&[(IncomeCategory::Cpp, dec!(8000))]);

        let result = classify_income(&p, &constants_2024()).unwrap();
        assert_eq!(result.countable_total, dec!(3000));
        assert_eq!(result.breakdown[&IncomeCategory::Cpp], dec!(3000));
        assert_eq!(result.excluded[0].amount, dec!(5000));
    }

    #[test]
    fn cpp_exemption_comes_from_the_year() {
        let mut constants = constants_2024();
        constants.cpp_exemption = dec!(6000);
        let p = profile(&[(IncomeCategory::Cpp, dec!(8000))]);

        let result = classify_income(&p, &constants).unwrap();
        assert_eq!(result.countable_total, dec!(2000));
    }

    #[test]
    fn oas_and_tfsa_never_countable() {
        let p = profile(&[
            (IncomeCategory::Oas, dec!(8500)),
            (IncomeCategory::TfsaWithdrawal, dec!(250000)),
            (IncomeCategory::Employment, dec!(1000)),
        ]);

        let result = classify_income(&p, &constants_2024()).unwrap();
        assert_eq!(result.countable_total, dec!(1000));
        assert!(!result.breakdown.contains_key(&IncomeCategory::Oas));
        assert!(!result.breakdown.contains_key(&IncomeCategory::TfsaWithdrawal));
        assert_eq!(result.excluded.len(), 2);
    }

    #[test]
    fn zero_income_does_not_appear_in_breakdown() {
        let p = profile(&[
            (IncomeCategory::Employment, dec!(0)),
            (IncomeCategory::Oas, dec!(0)),
        ]);

        let result = classify_income(&p, &constants_2024()).unwrap();
        assert!(result.breakdown.is_empty());
        assert_eq!(result.excluded.len(), 1);
        assert_eq!(result.excluded[0].category, IncomeCategory::Oas);
    }

    #[test]
    fn negative_amounts_rejected() {
        assert!(IncomeProfile::new()
            .with(IncomeCategory::Rental, dec!(-100))
            .is_err());

        let p: IncomeProfile = serde_json::from_str(r#"{"rental": "-100"}"#).unwrap();
        assert!(matches!(
            classify_income(&p, &constants_2024()),
            Err(CalculationError::InvalidInput(_))
        ));
    }

    #[test]
    fn category_from_str() {
        assert_eq!("cpp".parse(), Ok(IncomeCategory::Cpp));
        assert_eq!("RRIF withdrawal".parse(), Ok(IncomeCategory::RrifWithdrawal));
        assert_eq!("tfsa-withdrawal".parse(), Ok(IncomeCategory::TfsaWithdrawal));
        assert!("lottery".parse::<IncomeCategory>().is_err());
    }

    #[test]
    fn read_csv_sums_repeated_categories() {
        let csv_data = "category,amount,description
employment,1500.00,part time
employment,500.00,
cpp,7200,
oas,8600,";

        let p = read_csv(csv_data.as_bytes()).unwrap();
        assert_eq!(p.get(IncomeCategory::Employment), dec!(2000.00));
        assert_eq!(p.get(IncomeCategory::Cpp), dec!(7200));
        assert_eq!(p.total(), dec!(17800.00));
    }

    #[test]
    fn read_csv_unknown_category_fails() {
        let csv_data = "category,amount\nlottery,100";
        assert!(read_csv(csv_data.as_bytes()).is_err());
    }

    #[test]
    fn income_record_columns() {
        assert_eq!(IncomeRecord::csv_header(), "category,amount,description");
        let columns = IncomeRecord::csv_columns();
        assert!(columns[0].required);
        assert!(columns[1].required);
        assert!(!columns[2].required);
        assert_eq!(columns[1].description, "Annual amount in dollars");
    }
}
