use super::allocation::{allocate_with_limits, AllocationResult};
use super::canada::{age_on, BenefitYear, MaritalStatus};
use super::constants::{BenefitConstantsTable, BenefitYearConstants};
use super::error::CalculationError;
use super::gis::{assess_couple, assess_person, Assessment, CoupleAssessment, CoupleFacts, PersonFacts};
use super::income::{classify_income, ClassifiedIncome, IncomeCategory, IncomeProfile};
use super::limits::{calculate_contribution_limit, tfsa_room, ContributionLimit};
use super::strategy::{suggest_strategies, AccountFlags, StrategyInput, Suggestion};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Household description read from JSON
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HouseholdInput {
    /// Benefit year (e.g. 2025). Falls back to the year of `assessment_date`.
    #[serde(default)]
    pub year: Option<i32>,
    /// Date ages are measured on. Defaults to 31 December of the benefit year.
    #[serde(default)]
    pub assessment_date: Option<NaiveDate>,
    #[serde(default)]
    pub marital_status: MaritalStatus,
    pub person: PersonInput,
    /// Required for married and common-law households
    #[serde(default)]
    pub spouse: Option<PersonInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersonInput {
    #[serde(default)]
    pub name: Option<String>,
    /// Age in whole years; either this or `date_of_birth` is required
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub receiving_oas: bool,
    /// Annual income by category
    #[serde(default)]
    pub income: IncomeProfile,
    /// Earned income for RRSP room. Defaults to employment plus rental income.
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub earned_income: Option<Decimal>,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub pension_adjustment: Decimal,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub unused_tfsa_room: Decimal,
    /// Amount to save each month
    #[serde(default)]
    #[schemars(with = "Option<f64>")]
    pub monthly_savings: Option<Decimal>,
    #[serde(default)]
    pub accounts: AccountsInput,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, JsonSchema)]
pub struct AccountsInput {
    #[serde(default)]
    pub rrsp: bool,
    #[serde(default)]
    pub rrif: bool,
    #[serde(default)]
    pub tfsa: bool,
    #[serde(default)]
    pub employer_pension: bool,
}

impl From<AccountsInput> for AccountFlags {
    fn from(input: AccountsInput) -> Self {
        AccountFlags {
            has_rrsp: input.rrsp,
            has_rrif: input.rrif,
            has_tfsa: input.tfsa,
            has_employer_pension: input.employer_pension,
        }
    }
}

impl HouseholdInput {
    /// Resolve the benefit year, preferring an explicit override
    pub fn benefit_year(&self, year_override: Option<i32>) -> Result<BenefitYear, CalculationError> {
        year_override
            .or(self.year)
            .map(BenefitYear)
            .or_else(|| self.assessment_date.map(BenefitYear::from_date))
            .ok_or_else(|| {
                CalculationError::InvalidInput(
                    "no benefit year given; set `year` or pass --year".to_string(),
                )
            })
    }

    fn validate(&self) -> Result<(), CalculationError> {
        match (self.marital_status.is_couple(), &self.spouse) {
            (true, None) => Err(CalculationError::InvalidInput(format!(
                "marital status {} requires a spouse",
                self.marital_status
            ))),
            (false, Some(_)) => Err(CalculationError::InvalidInput(format!(
                "spouse given but marital status is {}",
                self.marital_status
            ))),
            _ => Ok(()),
        }
    }

    fn people(&self) -> impl Iterator<Item = &PersonInput> {
        std::iter::once(&self.person).chain(self.spouse.as_ref())
    }
}

impl PersonInput {
    fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| if index == 0 { "person" } else { "spouse" }.to_string())
    }

    fn age(&self, on: NaiveDate) -> Result<u32, CalculationError> {
        match (self.age, self.date_of_birth) {
            (Some(age), _) => Ok(age),
            (None, Some(dob)) => age_on(dob, on),
            (None, None) => Err(CalculationError::InvalidInput(
                "either age or date_of_birth is required".to_string(),
            )),
        }
    }

    fn earned_income(&self) -> Decimal {
        self.earned_income.unwrap_or_else(|| {
            self.income.get(IncomeCategory::Employment) + self.income.get(IncomeCategory::Rental)
        })
    }
}

/// Read a household from JSON
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<HouseholdInput> {
    let input: HouseholdInput = serde_json::from_reader(reader)?;
    input.validate()?;
    Ok(input)
}

/// Everything computed for one person
#[derive(Debug, Clone, Serialize)]
pub struct PersonReport {
    pub label: String,
    pub age: u32,
    pub income: ClassifiedIncome,
    pub rrsp_limit: ContributionLimit,
    pub tfsa_room: ContributionLimit,
    pub allocation: Option<AllocationResult>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GisOutcome {
    Single { assessment: Assessment },
    Couple { assessment: CoupleAssessment },
}

impl GisOutcome {
    pub fn household_monthly(&self) -> Decimal {
        match self {
            GisOutcome::Single { assessment } => assessment.benefit.monthly_amount,
            GisOutcome::Couple { assessment } => assessment.household_monthly,
        }
    }

    pub fn household_annual(&self) -> Decimal {
        match self {
            GisOutcome::Single { assessment } => assessment.benefit.annual_amount,
            GisOutcome::Couple { assessment } => assessment.household_annual,
        }
    }

    pub fn income_test_amount(&self) -> Decimal {
        match self {
            GisOutcome::Single { assessment } => assessment.benefit.income_test_amount,
            GisOutcome::Couple { assessment } => assessment.combined_income,
        }
    }

    /// Assessments in the same order as the household's people
    pub fn assessments(&self) -> Vec<&Assessment> {
        match self {
            GisOutcome::Single { assessment } => vec![assessment],
            GisOutcome::Couple { assessment } => vec![&assessment.first, &assessment.second],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HouseholdReport {
    pub year: i32,
    pub marital_status: MaritalStatus,
    pub people: Vec<PersonReport>,
    pub gis: GisOutcome,
}

/// Classify income, assess GIS, compute limits, allocate savings and
/// collect suggestions for every person in the household.
pub fn assess_household(
    table: &BenefitConstantsTable,
    input: &HouseholdInput,
    year: BenefitYear,
) -> Result<HouseholdReport, CalculationError> {
    input.validate()?;
    let constants = table.lookup(year)?;
    let on = input.assessment_date.unwrap_or_else(|| year_end(year.0));

    let assessed_person = assess_facts(&input.person, input.marital_status, constants, on)?;
    let assessed_spouse = input
        .spouse
        .as_ref()
        .map(|spouse| assess_facts(spouse, input.marital_status, constants, on))
        .transpose()?;

    let gis = match &assessed_spouse {
        None => GisOutcome::Single {
            assessment: assess_person(table, &assessed_person.1, false, year)?,
        },
        Some((_, spouse)) => GisOutcome::Couple {
            assessment: assess_couple(
                table,
                &CoupleFacts {
                    first: assessed_person.1,
                    second: *spouse,
                },
                year,
            )?,
        },
    };
    let income_test_amount = gis.income_test_amount();

    let mut people = Vec::new();
    let assessed = std::iter::once(assessed_person).chain(assessed_spouse);
    for (index, (person, (income, fact))) in input.people().zip(assessed).enumerate() {
        let rrsp_limit = calculate_contribution_limit(
            table,
            person.earned_income(),
            fact.age,
            person.pension_adjustment,
            year,
        )?;
        let tfsa_room = tfsa_room(table, fact.age, person.unused_tfsa_room, year)?;
        let allocation = person
            .monthly_savings
            .map(|savings| allocate_with_limits(savings, &rrsp_limit, &tfsa_room))
            .transpose()?;
        let suggestions = suggest_strategies(
            table,
            &StrategyInput {
                year,
                age: fact.age,
                marital_status: input.marital_status,
                receiving_oas: person.receiving_oas,
                spouse_receiving_oas: spouse_receiving_oas(input, index),
                receiving_cpp: person.income.get(IncomeCategory::Cpp) > Decimal::ZERO,
                countable_income: income_test_amount,
                earned_income: person.earned_income(),
                pension_adjustment: person.pension_adjustment,
                accounts: person.accounts.into(),
            },
        )?;

        people.push(PersonReport {
            label: person.label(index),
            age: fact.age,
            income,
            rrsp_limit,
            tfsa_room,
            allocation,
            suggestions,
        });
    }

    Ok(HouseholdReport {
        year: constants.year,
        marital_status: input.marital_status,
        people,
        gis,
    })
}

fn assess_facts(
    person: &PersonInput,
    marital_status: MaritalStatus,
    constants: &BenefitYearConstants,
    on: NaiveDate,
) -> Result<(ClassifiedIncome, PersonFacts), CalculationError> {
    let income = classify_income(&person.income, constants)?;
    let facts = PersonFacts {
        age: person.age(on)?,
        receiving_oas: person.receiving_oas,
        annual_income: income.countable_total,
        marital_status,
    };
    Ok((income, facts))
}

/// Whether the other partner (if any) receives OAS
fn spouse_receiving_oas(input: &HouseholdInput, index: usize) -> bool {
    let other = if index == 0 {
        input.spouse.as_ref()
    } else {
        Some(&input.person)
    };
    other.is_some_and(|p| p.receiving_oas)
}

fn year_end(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::allocation::Account;
    use crate::core::constants::YearPolicy;
    use rust_decimal_macros::dec;

    const SINGLE: &str = r#"{
        "year": 2024,
        "marital_status": "single",
        "person": {
            "name": "Ada",
            "age": 68,
            "receiving_oas": true,
            "income": {
                "cpp": "8000",
                "oas": "8600",
                "rrif_withdrawal": "7000",
                "tfsa_withdrawal": "4000"
            },
            "monthly_savings": "200",
            "accounts": { "rrif": true, "tfsa": true }
        }
    }"#;

    const COUPLE: &str = r#"{
        "year": 2025,
        "marital_status": "common_law",
        "person": {
            "age": 70,
            "receiving_oas": true,
            "income": { "pension": "9000" }
        },
        "spouse": {
            "date_of_birth": "1958-03-02",
            "receiving_oas": true,
            "income": { "investment": "6000" }
        }
    }"#;

    #[test]
    fn single_household_end_to_end() {
        let input = read_json(SINGLE.as_bytes()).unwrap();
        let year = input.benefit_year(None).unwrap();
        let report = assess_household(&BenefitConstantsTable::builtin(), &input, year).unwrap();

        assert_eq!(report.year, 2024);
        assert_eq!(report.people.len(), 1);
        let person = &report.people[0];
        assert_eq!(person.label, "Ada");
        // 3000 countable CPP + 7000 RRIF
        assert_eq!(person.income.countable_total, dec!(10000));
        assert_eq!(report.gis.household_monthly(), dec!(648.80));
        assert_eq!(report.gis.household_annual(), dec!(7785.64));

        // no earned income: RRSP room is zero, savings go to TFSA
        assert_eq!(person.rrsp_limit.annual_limit, dec!(0));
        let allocation = person.allocation.as_ref().unwrap();
        assert_eq!(allocation.monthly_for(Account::Tfsa), dec!(200));
        assert_eq!(allocation.total_monthly(), dec!(200));
    }

    #[test]
    fn couple_household_uses_combined_income() {
        let input = read_json(COUPLE.as_bytes()).unwrap();
        let report =
            assess_household(&BenefitConstantsTable::builtin(), &input, BenefitYear(2025)).unwrap();

        assert_eq!(report.people.len(), 2);
        assert_eq!(report.people[1].label, "spouse");
        assert_eq!(report.people[1].age, 67);
        match &report.gis {
            GisOutcome::Couple { assessment } => {
                assert_eq!(assessment.combined_income, dec!(15000));
                // 654.23 - 15000 * 0.25 / 12 = 341.73
                assert_eq!(assessment.first.benefit.monthly_amount, dec!(341.73));
                assert_eq!(assessment.second.benefit.monthly_amount, dec!(341.73));
                assert_eq!(assessment.household_monthly, dec!(683.46));
            }
            GisOutcome::Single { .. } => panic!("expected couple outcome"),
        }
    }

    #[test]
    fn age_measured_in_requested_year_under_fallback() {
        let json = r#"{
            "year": 2027,
            "person": {
                "date_of_birth": "1961-06-01",
                "receiving_oas": true,
                "income": { "pension": "6000" }
            }
        }"#;
        let input = read_json(json.as_bytes()).unwrap();
        let table = BenefitConstantsTable::builtin().with_policy(YearPolicy::LatestKnown);
        let report = assess_household(&table, &input, BenefitYear(2027)).unwrap();

        // 2025 figures, but age at 31 December 2027
        assert_eq!(report.year, 2025);
        assert_eq!(report.people[0].age, 66);
        let assessment = report.gis.assessments()[0];
        assert!(assessment.eligibility.eligible);
        assert!(report.gis.household_monthly() > Decimal::ZERO);
    }

    #[test]
    fn spouse_oas_flag_comes_from_the_other_partner() {
        let input = read_json(COUPLE.as_bytes()).unwrap();
        assert!(spouse_receiving_oas(&input, 0));
        assert!(spouse_receiving_oas(&input, 1));
        let single = read_json(SINGLE.as_bytes()).unwrap();
        assert!(!spouse_receiving_oas(&single, 0));
    }

    #[test]
    fn year_override_wins() {
        let input = read_json(SINGLE.as_bytes()).unwrap();
        assert_eq!(input.benefit_year(Some(2025)).unwrap(), BenefitYear(2025));
    }

    #[test]
    fn couple_without_spouse_rejected() {
        let json = r#"{"year": 2024, "marital_status": "married", "person": {"age": 70}}"#;
        assert!(read_json(json.as_bytes()).is_err());
    }

    #[test]
    fn unknown_marital_status_rejected() {
        let json = r#"{"year": 2024, "marital_status": "engaged", "person": {"age": 70}}"#;
        assert!(read_json(json.as_bytes()).is_err());
    }

    #[test]
    fn fractional_or_negative_age_rejected() {
        let json = r#"{"year": 2024, "person": {"age": 65.5}}"#;
        assert!(read_json(json.as_bytes()).is_err());
        let json = r#"{"year": 2024, "person": {"age": -3}}"#;
        assert!(read_json(json.as_bytes()).is_err());
    }

    #[test]
    fn missing_age_is_invalid_input() {
        let json = r#"{"year": 2024, "person": {"receiving_oas": true}}"#;
        let input = read_json(json.as_bytes()).unwrap();
        let err = assess_household(&BenefitConstantsTable::builtin(), &input, BenefitYear(2024))
            .unwrap_err();
        assert!(matches!(err, CalculationError::InvalidInput(_)));
    }

    #[test]
    fn missing_year_is_invalid_input() {
        let json = r#"{"person": {"age": 70}}"#;
        let input = read_json(json.as_bytes()).unwrap();
        assert!(input.benefit_year(None).is_err());
    }
}
