use super::types::{Distribution, Portfolio, SavingsThreshold, StockAllocations};

/// Absorbs floating-point drift when comparing totals against the investment.
pub const ALLOCATION_TOLERANCE: f64 = 0.01;

pub fn safe_savings(investment: f64, threshold: SavingsThreshold) -> f64 {
    match threshold {
        SavingsThreshold::Percentage { value } => investment * value / 100.0,
        SavingsThreshold::Fixed { value } => value,
    }
}

/// Money left for stocks and gold once the safe savings are set aside.
pub fn disposable_amount(investment: f64, safe_savings: f64) -> f64 {
    investment - safe_savings
}

pub fn stock_total(stock_allocations: &StockAllocations) -> f64 {
    stock_allocations.values().sum()
}

pub fn total_allocated(
    stock_allocations: &StockAllocations,
    gold_allocation: f64,
    savings_allocation: f64,
) -> f64 {
    stock_total(stock_allocations) + gold_allocation + savings_allocation
}

pub fn distribution(
    stock_allocations: &StockAllocations,
    gold_allocation: f64,
    savings_allocation: f64,
) -> Distribution {
    let total = total_allocated(stock_allocations, gold_allocation, savings_allocation);
    if total == 0.0 {
        return Distribution::default();
    }

    Distribution {
        savings: savings_allocation / total * 100.0,
        gold: gold_allocation / total * 100.0,
        stocks: stock_total(stock_allocations) / total * 100.0,
    }
}

/// Investment not assigned to any bucket. Negative only if the stored
/// portfolio already violates the investment ceiling.
pub fn unallocated_amount(investment: f64, total_allocated: f64) -> f64 {
    investment - total_allocated
}

impl Portfolio {
    pub fn total_allocated(&self) -> f64 {
        total_allocated(
            &self.allocations,
            self.gold_allocation,
            self.savings_allocation,
        )
    }

    pub fn distribution(&self) -> Distribution {
        distribution(
            &self.allocations,
            self.gold_allocation,
            self.savings_allocation,
        )
    }

    pub fn unallocated_amount(&self, investment: f64) -> f64 {
        unallocated_amount(investment, self.total_allocated())
    }
}
