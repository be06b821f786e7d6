use rust_decimal::Decimal;

/// Failures of the calculation core.
///
/// Zero entitlements, zero contribution room and ineligibility are results,
/// not errors. These variants are reserved for input that cannot be assessed.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum CalculationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("benefit year {year} is not tabulated (available: {first}-{last})")]
    UnsupportedYear { year: i32, first: i32, last: i32 },
    #[error("constants table is empty")]
    EmptyTable,
}

impl CalculationError {
    pub fn negative(field: &str, value: Decimal) -> Self {
        CalculationError::InvalidInput(format!("{field} must not be negative, got {value}"))
    }
}

/// Reject negative monetary inputs.
pub fn ensure_non_negative(field: &str, value: Decimal) -> Result<Decimal, CalculationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(CalculationError::negative(field, value))
    } else {
        Ok(value)
    }
}
