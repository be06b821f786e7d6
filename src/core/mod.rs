pub mod allocation;
pub mod canada;
pub mod constants;
pub mod error;
pub mod gis;
pub mod household;
pub mod income;
pub mod limits;
pub mod money;
pub mod strategy;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use allocation::{allocate_savings, allocate_with_limits, Account, Allocation, AllocationResult};
pub use canada::{age_on, BenefitYear, MaritalStatus};
pub use constants::{BenefitConstantsTable, BenefitYearConstants, ConstantsHandle, YearPolicy};
pub use error::CalculationError;
pub use gis::{
    assess_couple, assess_person, calculate_benefit, calculate_benefit_for_couple,
    check_eligibility, Assessment, BenefitAmount, BenefitVariant, CoupleAssessment, CoupleBenefit,
    CoupleFacts, Eligibility, IneligibilityReason, PersonFacts,
};
pub use household::{assess_household, GisOutcome, HouseholdInput, HouseholdReport, PersonReport};
pub use income::{
    classify_income, ClassifiedIncome, CsvColumn, ExcludedIncome, IncomeCategory, IncomeProfile,
    IncomeRecord,
};
pub use limits::{calculate_contribution_limit, tfsa_room, ContributionLimit, ContributionLimitRequest};
pub use strategy::{suggest_strategies, AccountFlags, StrategyInput, StrategyKind, Suggestion};
pub use warnings::AllocationWarning;
