use std::collections::BTreeSet;

use super::allocation::safe_savings;
use super::error::SelectionError;
use super::types::{FinancialProfile, Portfolio, PortfolioStage, StockId};

/// Drops repeated ids, keeping the first occurrence.
pub fn normalize_selection(ids: &[StockId]) -> Result<Vec<StockId>, SelectionError> {
    let mut seen = BTreeSet::new();
    let selection: Vec<StockId> = ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect();

    if selection.is_empty() {
        return Err(SelectionError::Empty);
    }
    Ok(selection)
}

/// Moves a portfolio to `Active` in one step: every selected stock starts at
/// zero and savings start at the profile's safe savings.
pub fn complete_onboarding(
    existing: Option<&Portfolio>,
    selection: &[StockId],
    profile: &FinancialProfile,
) -> Result<Portfolio, SelectionError> {
    if PortfolioStage::of(existing) == PortfolioStage::Active {
        return Err(SelectionError::OnboardingAlreadyComplete);
    }

    let selected_stock_ids = normalize_selection(selection)?;
    let allocations = selected_stock_ids
        .iter()
        .map(|id| (id.clone(), 0.0))
        .collect();

    Ok(Portfolio {
        selected_stock_ids,
        allocations,
        gold_allocation: 0.0,
        savings_allocation: safe_savings(
            profile.initial_investment_amount,
            profile.savings_threshold,
        ),
        onboarding_complete: true,
    })
}
