use std::collections::{BTreeMap, HashMap};

use super::types::{
    AbsoluteReturns, PredictedReturns, ProjectedValues, StockAllocations, StockId,
};

pub const DEFAULT_STOCK_RETURN: f64 = 12.5;
pub const GOLD_RETURN: f64 = 8.0;

/// Annual return assumptions. Stocks without an explicit entry share the
/// default rate; none of these figures come from real market history.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnTable {
    stock_rates: HashMap<StockId, f64>,
    default_stock_rate: f64,
    gold_rate: f64,
}

impl Default for ReturnTable {
    fn default() -> Self {
        Self::new(DEFAULT_STOCK_RETURN, GOLD_RETURN)
    }
}

impl ReturnTable {
    pub fn new(default_stock_rate: f64, gold_rate: f64) -> Self {
        Self {
            stock_rates: HashMap::new(),
            default_stock_rate,
            gold_rate,
        }
    }

    pub fn with_stock_rate(mut self, stock_id: impl Into<StockId>, rate: f64) -> Self {
        self.stock_rates.insert(stock_id.into(), rate);
        self
    }

    pub fn stock_rate(&self, stock_id: &str) -> f64 {
        self.stock_rates
            .get(stock_id)
            .copied()
            .unwrap_or(self.default_stock_rate)
    }

    pub fn gold_rate(&self) -> f64 {
        self.gold_rate
    }

    pub fn predicted_returns(
        &self,
        stock_allocations: &StockAllocations,
        annual_savings_rate: f64,
    ) -> PredictedReturns {
        PredictedReturns {
            stocks: stock_allocations
                .keys()
                .map(|id| (id.clone(), self.stock_rate(id)))
                .collect(),
            gold: self.gold_rate,
            savings: annual_savings_rate,
        }
    }
}

fn annual_gain(amount: f64, rate: f64) -> f64 {
    amount * rate / 100.0
}

/// One-year gain per bucket. A stock missing from `predicted` earns nothing.
pub fn absolute_returns(
    stock_allocations: &StockAllocations,
    gold_allocation: f64,
    savings_allocation: f64,
    predicted: &PredictedReturns,
) -> AbsoluteReturns {
    let stocks: BTreeMap<StockId, f64> = stock_allocations
        .iter()
        .map(|(id, amount)| {
            let rate = predicted.stocks.get(id).copied().unwrap_or(0.0);
            (id.clone(), annual_gain(*amount, rate))
        })
        .collect();
    let gold = annual_gain(gold_allocation, predicted.gold);
    let savings = annual_gain(savings_allocation, predicted.savings);
    let total = stocks.values().sum::<f64>() + gold + savings;

    AbsoluteReturns {
        stocks,
        gold,
        savings,
        total,
    }
}

pub fn total_projected_return(
    stock_allocations: &StockAllocations,
    gold_allocation: f64,
    savings_allocation: f64,
    predicted: &PredictedReturns,
) -> f64 {
    absolute_returns(stock_allocations, gold_allocation, savings_allocation, predicted).total
}

pub fn projected_value(amount: f64, annual_rate: f64, years: u32) -> f64 {
    amount * (1.0 + annual_rate / 100.0).powf(f64::from(years))
}

/// Compounded value of every bucket after `years`.
pub fn projected_values(
    stock_allocations: &StockAllocations,
    gold_allocation: f64,
    savings_allocation: f64,
    predicted: &PredictedReturns,
    years: u32,
) -> ProjectedValues {
    let stocks: BTreeMap<StockId, f64> = stock_allocations
        .iter()
        .map(|(id, amount)| {
            let rate = predicted.stocks.get(id).copied().unwrap_or(0.0);
            (id.clone(), projected_value(*amount, rate, years))
        })
        .collect();
    let gold = projected_value(gold_allocation, predicted.gold, years);
    let savings = projected_value(savings_allocation, predicted.savings, years);
    let total = stocks.values().sum::<f64>() + gold + savings;

    ProjectedValues {
        years,
        stocks,
        gold,
        savings,
        total,
    }
}
