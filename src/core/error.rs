use thiserror::Error;

use super::types::StockId;

/// Rejections produced while validating a bulk reallocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("allocation for '{key}' must be a non-negative amount, got {value}")]
    InvalidAllocation { key: String, value: f64 },

    #[error("savings of {proposed:.2} are below the safe savings amount of {floor:.2}")]
    BelowSafeSavingsFloor { proposed: f64, floor: f64 },

    #[error("total allocation of {total:.2} exceeds the available investment of {investment:.2}")]
    OverAllocated { total: f64, investment: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("service is only available in India")]
    UnsupportedCountry,

    #[error(
        "cannot reduce investment by {reduction:.2}; only {unallocated:.2} is unallocated, adjust your portfolio allocations first"
    )]
    InvestmentReductionExceedsUnallocated { reduction: f64, unallocated: f64 },

    #[error(
        "safe savings of {floor:.2} cannot be met; only {available:.2} is available for savings"
    )]
    SafeSavingsUnreachable { floor: f64, available: f64 },
}

impl ProfileError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ProfileError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("at least one stock must be selected")]
    Empty,

    #[error("unknown stock '{0}'")]
    UnknownStock(StockId),

    #[error("onboarding already completed; use the stocks endpoint to update your selection")]
    OnboardingAlreadyComplete,

    #[error("onboarding has not been completed")]
    OnboardingIncomplete,

    #[error("please complete your profile information first")]
    ProfileMissing,
}
