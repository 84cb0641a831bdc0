use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type StockId = String;

/// Stock identifier to allocated amount.
pub type StockAllocations = BTreeMap<StockId, f64>;

pub const SUPPORTED_COUNTRY: &str = "India";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub state: String,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    SUPPORTED_COUNTRY.to_string()
}

/// Minimum savings rule: a share of the investment or an absolute amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SavingsThreshold {
    Percentage { value: f64 },
    Fixed { value: f64 },
}

impl SavingsThreshold {
    pub fn value(self) -> f64 {
        match self {
            SavingsThreshold::Percentage { value } | SavingsThreshold::Fixed { value } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    pub full_name: String,
    pub location: Location,
    pub initial_investment_amount: f64,
    pub savings_threshold: SavingsThreshold,
    pub annual_savings_interest_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub selected_stock_ids: Vec<StockId>,
    pub allocations: StockAllocations,
    pub gold_allocation: f64,
    pub savings_allocation: f64,
    pub onboarding_complete: bool,
}

impl Portfolio {
    pub fn stage(&self) -> PortfolioStage {
        if self.onboarding_complete {
            PortfolioStage::Active
        } else {
            PortfolioStage::Uninitialized
        }
    }
}

/// Lifecycle of a user's portfolio. Selection and completion happen together,
/// so there is no intermediate stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PortfolioStage {
    Uninitialized,
    Active,
}

impl PortfolioStage {
    pub fn of(portfolio: Option<&Portfolio>) -> Self {
        portfolio.map_or(PortfolioStage::Uninitialized, Portfolio::stage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Stock,
    Gold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: StockId,
    pub symbol: String,
    pub name: String,
    pub category: AssetCategory,
    pub reference_price: f64,
}

/// A full reallocation request with gold kept apart from the stock positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationProposal {
    pub stock_allocations: StockAllocations,
    pub gold_allocation: f64,
}

impl AllocationProposal {
    pub const GOLD_KEY: &'static str = "gold";

    /// Splits a flat map where gold travels under the reserved `"gold"` key.
    pub fn from_keyed(mut keyed: BTreeMap<String, f64>) -> Self {
        let gold_allocation = keyed.remove(Self::GOLD_KEY).unwrap_or(0.0);
        Self {
            stock_allocations: keyed,
            gold_allocation,
        }
    }
}

/// Annual return rates in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedReturns {
    pub stocks: BTreeMap<StockId, f64>,
    pub gold: f64,
    pub savings: f64,
}

/// Absolute one-year gains per category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsoluteReturns {
    pub stocks: BTreeMap<StockId, f64>,
    pub gold: f64,
    pub savings: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedValues {
    pub years: u32,
    pub stocks: BTreeMap<StockId, f64>,
    pub gold: f64,
    pub savings: f64,
    pub total: f64,
}

/// Category shares of the allocated total, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub savings: f64,
    pub gold: f64,
    pub stocks: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_threshold_uses_tagged_wire_shape() {
        let threshold: SavingsThreshold =
            serde_json::from_str(r#"{"type":"percentage","value":20}"#).expect("valid json");
        assert_eq!(threshold, SavingsThreshold::Percentage { value: 20.0 });

        let json = serde_json::to_string(&SavingsThreshold::Fixed { value: 5000.0 })
            .expect("threshold should serialize");
        assert_eq!(json, r#"{"type":"fixed","value":5000.0}"#);
    }

    #[test]
    fn location_country_defaults_to_india() {
        let location: Location =
            serde_json::from_str(r#"{"state":"Karnataka","city":"Bengaluru"}"#)
                .expect("valid json");
        assert_eq!(location.country, "India");
        assert!(location.coordinates.is_none());
    }

    #[test]
    fn from_keyed_extracts_gold_pseudo_key() {
        let mut keyed = BTreeMap::new();
        keyed.insert("A".to_string(), 40_000.0);
        keyed.insert("gold".to_string(), 10_000.0);

        let proposal = AllocationProposal::from_keyed(keyed);
        assert_eq!(proposal.gold_allocation, 10_000.0);
        assert_eq!(proposal.stock_allocations.len(), 1);
        assert_eq!(proposal.stock_allocations.get("A"), Some(&40_000.0));
    }

    #[test]
    fn from_keyed_without_gold_defaults_to_zero() {
        let mut keyed = BTreeMap::new();
        keyed.insert("A".to_string(), 1.0);
        assert_eq!(AllocationProposal::from_keyed(keyed).gold_allocation, 0.0);
    }

    #[test]
    fn stage_follows_onboarding_flag() {
        assert_eq!(PortfolioStage::of(None), PortfolioStage::Uninitialized);
        let mut portfolio = Portfolio::default();
        assert_eq!(PortfolioStage::of(Some(&portfolio)), PortfolioStage::Uninitialized);
        portfolio.onboarding_complete = true;
        assert_eq!(PortfolioStage::of(Some(&portfolio)), PortfolioStage::Active);
    }
}
