use super::error::CalculationError;
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Marital status as reported for GIS purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    CommonLaw,
    Widowed,
    Divorced,
    Separated,
}

impl MaritalStatus {
    /// Married and common-law partners are assessed on combined income
    pub fn is_couple(self) -> bool {
        matches!(self, MaritalStatus::Married | MaritalStatus::CommonLaw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MaritalStatus::Single => "single",
            MaritalStatus::Married => "married",
            MaritalStatus::CommonLaw => "common_law",
            MaritalStatus::Widowed => "widowed",
            MaritalStatus::Divorced => "divorced",
            MaritalStatus::Separated => "separated",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "single" => Ok(MaritalStatus::Single),
            "married" => Ok(MaritalStatus::Married),
            "common_law" | "commonlaw" => Ok(MaritalStatus::CommonLaw),
            "widowed" => Ok(MaritalStatus::Widowed),
            "divorced" => Ok(MaritalStatus::Divorced),
            "separated" => Ok(MaritalStatus::Separated),
            _ => Err(CalculationError::InvalidInput(format!(
                "unrecognized marital status: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GIS benefit year. Benefits are indexed on calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct BenefitYear(pub i32);

impl BenefitYear {
    pub fn from_date(date: NaiveDate) -> Self {
        BenefitYear(date.year())
    }
}

impl std::fmt::Display for BenefitYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Age in whole years reached on `on`
pub fn age_on(date_of_birth: NaiveDate, on: NaiveDate) -> Result<u32, CalculationError> {
    if on < date_of_birth {
        return Err(CalculationError::InvalidInput(format!(
            "date of birth {date_of_birth} is after {on}"
        )));
    }
    let mut age = on.year() - date_of_birth.year();
    if (on.month(), on.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    Ok(age as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn marital_status_from_str() {
        assert_eq!("single".parse(), Ok(MaritalStatus::Single));
        assert_eq!("Married".parse(), Ok(MaritalStatus::Married));
        assert_eq!("common-law".parse(), Ok(MaritalStatus::CommonLaw));
        assert_eq!("Common Law".parse(), Ok(MaritalStatus::CommonLaw));
        assert_eq!("WIDOWED".parse(), Ok(MaritalStatus::Widowed));
        assert!("engaged".parse::<MaritalStatus>().is_err());
    }

    #[test]
    fn only_married_and_common_law_are_couples() {
        assert!(MaritalStatus::Married.is_couple());
        assert!(MaritalStatus::CommonLaw.is_couple());
        assert!(!MaritalStatus::Single.is_couple());
        assert!(!MaritalStatus::Widowed.is_couple());
        assert!(!MaritalStatus::Divorced.is_couple());
        assert!(!MaritalStatus::Separated.is_couple());
    }

    #[test]
    fn benefit_year_from_date() {
        assert_eq!(BenefitYear::from_date(date(2024, 1, 1)), BenefitYear(2024));
        assert_eq!(BenefitYear::from_date(date(2024, 12, 31)), BenefitYear(2024));
    }

    #[test]
    fn age_before_and_after_birthday() {
        let dob = date(1959, 6, 15);
        assert_eq!(age_on(dob, date(2024, 6, 14)), Ok(64));
        assert_eq!(age_on(dob, date(2024, 6, 15)), Ok(65));
        assert_eq!(age_on(dob, date(2024, 12, 31)), Ok(65));
    }

    #[test]
    fn birth_after_assessment_date_rejected() {
        assert!(age_on(date(2030, 1, 1), date(2024, 1, 1)).is_err());
    }
}
