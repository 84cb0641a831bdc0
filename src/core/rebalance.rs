use std::collections::BTreeSet;

use super::types::{Portfolio, StockAllocations, StockId};

/// Outcome of swapping a portfolio's stock selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionChange {
    pub selected_stock_ids: Vec<StockId>,
    pub allocations: StockAllocations,
    pub savings_allocation: f64,
    pub added_stocks: usize,
    pub removed_stocks: usize,
    pub reallocated_amount: f64,
}

impl SelectionChange {
    pub fn apply_to(&self, portfolio: &Portfolio) -> Portfolio {
        Portfolio {
            selected_stock_ids: self.selected_stock_ids.clone(),
            allocations: self.allocations.clone(),
            savings_allocation: self.savings_allocation,
            ..portfolio.clone()
        }
    }
}

/// Kept stocks retain their amount, new stocks start at zero and money held
/// by dropped stocks moves into savings. Gold is never touched.
pub fn reallocate_selection(
    old_selection: &[StockId],
    old_allocations: &StockAllocations,
    old_savings: f64,
    new_selection: &[StockId],
) -> SelectionChange {
    let mut seen = BTreeSet::new();
    let selected_stock_ids: Vec<StockId> = new_selection
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    let new_set: BTreeSet<&str> = selected_stock_ids.iter().map(String::as_str).collect();

    let old_set: BTreeSet<&str> = old_selection
        .iter()
        .map(String::as_str)
        .chain(old_allocations.keys().map(String::as_str))
        .collect();

    let allocations: StockAllocations = selected_stock_ids
        .iter()
        .map(|id| (id.clone(), old_allocations.get(id).copied().unwrap_or(0.0)))
        .collect();

    let removed: Vec<&str> = old_set.difference(&new_set).copied().collect();
    let reallocated_amount: f64 = removed
        .iter()
        .map(|id| old_allocations.get(*id).copied().unwrap_or(0.0))
        .sum();
    let added_stocks = new_set.difference(&old_set).count();
    let removed_stocks = removed.len();

    SelectionChange {
        selected_stock_ids,
        allocations,
        savings_allocation: old_savings + reallocated_amount,
        added_stocks,
        removed_stocks,
        reallocated_amount,
    }
}

impl Portfolio {
    pub fn reallocate_selection(&self, new_selection: &[StockId]) -> SelectionChange {
        reallocate_selection(
            &self.selected_stock_ids,
            &self.allocations,
            self.savings_allocation,
            new_selection,
        )
    }
}
