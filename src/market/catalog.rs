use async_trait::async_trait;
use uuid::Uuid;

use crate::core::{Asset, AssetCategory, StockId};

use super::AssetCatalog;

const NSE_EQUITIES: &[(&str, &str, f64)] = &[
    ("TCS.NS", "Tata Consultancy Services", 3850.50),
    ("INFY.NS", "Infosys Limited", 1450.75),
    ("RELIANCE.NS", "Reliance Industries", 2456.30),
    ("HDFCBANK.NS", "HDFC Bank", 1650.20),
    ("ICICIBANK.NS", "ICICI Bank", 1120.45),
    ("HINDUNILVR.NS", "Hindustan Unilever", 2380.60),
    ("ITC.NS", "ITC Limited", 445.80),
    ("SBIN.NS", "State Bank of India", 625.90),
    ("BHARTIARTL.NS", "Bharti Airtel", 1540.25),
    ("WIPRO.NS", "Wipro Limited", 485.35),
    ("ASIANPAINT.NS", "Asian Paints", 2890.70),
    ("MARUTI.NS", "Maruti Suzuki India", 12450.40),
    ("KOTAKBANK.NS", "Kotak Mahindra Bank", 1780.55),
    ("LT.NS", "Larsen & Toubro", 3620.80),
    ("AXISBANK.NS", "Axis Bank", 1085.30),
    ("TITAN.NS", "Titan Company", 3280.95),
    ("SUNPHARMA.NS", "Sun Pharmaceutical", 1680.40),
    ("BAJFINANCE.NS", "Bajaj Finance", 6850.75),
    ("HCLTECH.NS", "HCL Technologies", 1820.60),
    ("ULTRACEMCO.NS", "UltraTech Cement", 10250.30),
    ("TECHM.NS", "Tech Mahindra", 1650.85),
    ("ONGC.NS", "Oil & Natural Gas Corporation", 245.60),
    ("NTPC.NS", "NTPC Limited", 365.45),
    ("POWERGRID.NS", "Power Grid Corporation", 315.70),
    ("TATAMOTORS.NS", "Tata Motors", 785.90),
    ("M&M.NS", "Mahindra & Mahindra", 2680.40),
    ("ADANIPORTS.NS", "Adani Ports", 1285.55),
    ("JSWSTEEL.NS", "JSW Steel", 925.80),
    ("TATASTEEL.NS", "Tata Steel", 165.35),
    ("COALINDIA.NS", "Coal India", 425.65),
    ("DRREDDY.NS", "Dr. Reddy's Laboratories", 5850.90),
    ("CIPLA.NS", "Cipla Limited", 1480.25),
    ("DIVISLAB.NS", "Divi's Laboratories", 5620.75),
    ("BRITANNIA.NS", "Britannia Industries", 4850.40),
    ("NESTLEIND.NS", "Nestle India", 2450.80),
    ("INDUSINDBK.NS", "IndusInd Bank", 985.60),
    ("BAJAJFINSV.NS", "Bajaj Finserv", 1620.35),
    ("HEROMOTOCO.NS", "Hero MotoCorp", 4580.90),
    ("GRASIM.NS", "Grasim Industries", 2385.45),
    ("ADANIENT.NS", "Adani Enterprises", 2850.70),
];

/// Identifiers are derived from the symbol so they survive restarts.
pub fn stock_id_for_symbol(symbol: &str) -> StockId {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, symbol.as_bytes()).to_string()
}

/// Read-only, in-memory reference data.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    assets: Vec<Asset>,
}

impl StaticCatalog {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    pub fn indian_equities() -> Self {
        let assets = NSE_EQUITIES
            .iter()
            .map(|(symbol, name, price)| Asset {
                id: stock_id_for_symbol(symbol),
                symbol: symbol.to_string(),
                name: name.to_string(),
                category: AssetCategory::Stock,
                reference_price: *price,
            })
            .collect();
        Self::new(assets)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }
}

#[async_trait]
impl AssetCatalog for StaticCatalog {
    async fn stocks(&self) -> Vec<Asset> {
        self.assets
            .iter()
            .filter(|asset| asset.category == AssetCategory::Stock)
            .cloned()
            .collect()
    }

    async fn find_stocks(&self, ids: &[StockId]) -> Vec<Asset> {
        self.assets
            .iter()
            .filter(|asset| asset.category == AssetCategory::Stock && ids.contains(&asset.id))
            .cloned()
            .collect()
    }
}
