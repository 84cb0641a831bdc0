//! Reference data and prices for the assets a portfolio can hold.
//!
//! Live prices come from a [`PriceFeed`]. When the feed cannot answer, the
//! resolver falls back to a static price and says so in the quote's source;
//! callers treat both the same way.

mod cache;
mod catalog;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::core::{Asset, StockId};

pub use cache::PriceCache;
pub use catalog::{StaticCatalog, stock_id_for_symbol};

pub const DEFAULT_GOLD_FALLBACK_PRICE: f64 = 6000.0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    #[error("price feed unavailable: {0}")]
    Unavailable(String),

    #[error("no price for symbol '{0}'")]
    UnknownSymbol(String),
}

#[async_trait]
pub trait AssetCatalog: Send + Sync {
    async fn stocks(&self) -> Vec<Asset>;

    /// Stocks among `ids`; unknown ids are skipped.
    async fn find_stocks(&self, ids: &[StockId]) -> Vec<Asset>;

    async fn search(&self, query: &str, limit: usize) -> Vec<Asset> {
        let needle = query.trim().to_lowercase();
        self.stocks()
            .await
            .into_iter()
            .filter(|asset| {
                needle.is_empty()
                    || asset.name.to_lowercase().contains(&needle)
                    || asset.symbol.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn stock_price(&self, symbol: &str) -> Result<f64, MarketDataError>;

    /// Price of gold per unit in the given Indian state.
    async fn gold_price(&self, state: &str) -> Result<f64, MarketDataError>;
}

/// Feed used when no live provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFeed;

#[async_trait]
impl PriceFeed for OfflineFeed {
    async fn stock_price(&self, _symbol: &str) -> Result<f64, MarketDataError> {
        Err(MarketDataError::Unavailable("no live provider configured".to_string()))
    }

    async fn gold_price(&self, _state: &str) -> Result<f64, MarketDataError> {
        Err(MarketDataError::Unavailable("no live provider configured".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    pub price: f64,
    pub source: PriceSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoldQuote {
    pub state: String,
    pub price: f64,
    pub date: NaiveDate,
    pub source: PriceSource,
}

pub struct MarketData {
    feed: Arc<dyn PriceFeed>,
    cache: PriceCache,
    gold_fallback_price: f64,
}

impl MarketData {
    pub fn new(feed: Arc<dyn PriceFeed>, cache_ttl: Duration, gold_fallback_price: f64) -> Self {
        Self {
            feed,
            cache: PriceCache::new(cache_ttl),
            gold_fallback_price,
        }
    }

    pub fn offline(gold_fallback_price: f64) -> Self {
        Self::new(Arc::new(OfflineFeed), Duration::ZERO, gold_fallback_price)
    }

    pub async fn stock_quote(&self, asset: &Asset) -> Quote {
        let key = format!("stock:{}", asset.symbol);
        if let Some(price) = self.cache.get(&key).await {
            return Quote {
                price,
                source: PriceSource::Live,
            };
        }

        match self.feed.stock_price(&asset.symbol).await {
            Ok(price) if price.is_finite() && price > 0.0 => {
                self.cache.insert(&key, price).await;
                Quote {
                    price,
                    source: PriceSource::Live,
                }
            }
            outcome => {
                tracing::warn!(
                    symbol = %asset.symbol,
                    reason = %describe_failure(outcome),
                    "live stock price unavailable, using reference price"
                );
                Quote {
                    price: asset.reference_price,
                    source: PriceSource::Fallback,
                }
            }
        }
    }

    pub async fn gold_quote(&self, state: &str) -> GoldQuote {
        let key = format!("gold:{}", state.to_lowercase());
        let date = Utc::now().date_naive();
        if let Some(price) = self.cache.get(&key).await {
            return GoldQuote {
                state: state.to_string(),
                price,
                date,
                source: PriceSource::Live,
            };
        }

        let (price, source) = match self.feed.gold_price(state).await {
            Ok(price) if price.is_finite() && price > 0.0 => {
                self.cache.insert(&key, price).await;
                (price, PriceSource::Live)
            }
            outcome => {
                tracing::warn!(
                    state,
                    reason = %describe_failure(outcome),
                    "live gold price unavailable, using fallback price"
                );
                (self.gold_fallback(state), PriceSource::Fallback)
            }
        };

        GoldQuote {
            state: state.to_string(),
            price,
            date,
            source,
        }
    }

    /// Base price plus a stable per-state offset below 500.
    pub fn gold_fallback(&self, state: &str) -> f64 {
        let offset = state.bytes().map(u32::from).sum::<u32>() % 500;
        self.gold_fallback_price + f64::from(offset)
    }
}

fn describe_failure(outcome: Result<f64, MarketDataError>) -> String {
    match outcome {
        Ok(price) => format!("implausible price {price}"),
        Err(err) => err.to_string(),
    }
}
