//! GIS entitlement and RRSP/TFSA contribution calculations.
//!
//! Every calculation is a pure function of its inputs and a
//! [`BenefitConstantsTable`](core::BenefitConstantsTable) snapshot.

pub mod core;
