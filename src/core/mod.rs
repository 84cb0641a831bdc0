mod adjust;
mod allocation;
mod error;
mod onboarding;
mod profile;
mod rebalance;
mod returns;
mod types;

pub use adjust::{Adjustment, validate_adjustment};
pub use allocation::{
    ALLOCATION_TOLERANCE, disposable_amount, distribution, safe_savings, stock_total,
    total_allocated, unallocated_amount,
};
pub use error::{AllocationError, ProfileError, SelectionError};
pub use onboarding::{complete_onboarding, normalize_selection};
pub use profile::{MIN_INVESTMENT, check_investment_change, reconcile_savings_floor, validate_profile};
pub use rebalance::{SelectionChange, reallocate_selection};
pub use returns::{
    DEFAULT_STOCK_RETURN, GOLD_RETURN, ReturnTable, absolute_returns, projected_value,
    projected_values, total_projected_return,
};
pub use types::{
    AbsoluteReturns, AllocationProposal, Asset, AssetCategory, Coordinates, Distribution,
    FinancialProfile, Location, Portfolio, PortfolioStage, PredictedReturns, ProjectedValues,
    SUPPORTED_COUNTRY, SavingsThreshold, StockAllocations, StockId,
};
