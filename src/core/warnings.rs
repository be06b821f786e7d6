use super::money::format_cad;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Advisory warnings raised while allocating savings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum AllocationWarning {
    /// RRSP contributions are not allowed (past the cutoff age).
    RrspUnavailable,
    /// Requested savings exceed the monthly RRSP room.
    RrspCapped {
        #[schemars(with = "f64")]
        requested: Decimal,
        #[schemars(with = "f64")]
        limit: Decimal,
    },
    /// Both RRSP and TFSA room are used up; the rest is taxable.
    ShelteredLimitsExhausted {
        #[schemars(with = "f64")]
        overflow: Decimal,
    },
}

impl std::fmt::Display for AllocationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationWarning::RrspUnavailable => {
                write!(f, "RRSP contributions are not allowed; skipping RRSP")
            }
            AllocationWarning::RrspCapped { requested, limit } => write!(
                f,
                "Requested {}/month exceeds RRSP room; RRSP capped at {}/month",
                format_cad(*requested),
                format_cad(*limit)
            ),
            AllocationWarning::ShelteredLimitsExhausted { overflow } => write!(
                f,
                "RRSP and TFSA limits exhausted; {}/month goes to a taxable non-registered account",
                format_cad(*overflow)
            ),
        }
    }
}
