//! Load, transform, persist. Every domain rule lives in [`crate::core`]; this
//! layer fetches the documents the rules need and writes back what they return.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::core::{
    AbsoluteReturns, Adjustment, AllocationError, AllocationProposal, AssetCategory,
    Distribution, FinancialProfile, Portfolio, PortfolioStage, PredictedReturns, ProfileError,
    ProjectedValues, ReturnTable, SelectionChange, SelectionError, StockAllocations, StockId,
    absolute_returns, check_investment_change, complete_onboarding, disposable_amount,
    normalize_selection, projected_values, reconcile_savings_floor, safe_savings,
    validate_adjustment, validate_profile,
};
use crate::market::{AssetCatalog, GoldQuote, MarketData, PriceSource};
use crate::store::{PortfolioStore, ProfileStore, StoreError, UserLocks, Versioned, found};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: FinancialProfile,
    pub safe_savings: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(flatten)]
    pub profile: FinancialProfile,
    pub old_safe_savings: Option<f64>,
    pub new_safe_savings: f64,
    /// Set when savings had to be raised to meet the new floor.
    pub savings_allocation: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuoteView {
    pub id: StockId,
    pub symbol: String,
    pub name: String,
    pub category: AssetCategory,
    pub current_price: f64,
    pub price_source: PriceSource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioOverview {
    pub allocations: StockAllocations,
    pub gold_allocation: f64,
    pub savings_allocation: f64,
    pub total_value: f64,
    pub distribution: Distribution,
    pub unallocated_amount: f64,
    pub stocks: Vec<StockQuoteView>,
    pub gold: GoldQuote,
    pub predicted_returns: PredictedReturns,
    pub absolute_returns: AbsoluteReturns,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockMetadata {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentView {
    pub total_investment: f64,
    pub safe_savings: f64,
    pub disposable_amount: f64,
    pub stock_allocations: StockAllocations,
    pub gold_allocation: f64,
    pub current_savings: f64,
    pub unallocated_amount: f64,
    pub predicted_returns: PredictedReturns,
    pub absolute_returns: AbsoluteReturns,
    pub projected_values: ProjectedValues,
    pub stock_metadata: BTreeMap<StockId, StockMetadata>,
}

pub struct PortfolioService {
    profiles: Arc<dyn ProfileStore>,
    portfolios: Arc<dyn PortfolioStore>,
    catalog: Arc<dyn AssetCatalog>,
    market: MarketData,
    returns: ReturnTable,
    locks: UserLocks,
}

impl PortfolioService {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        portfolios: Arc<dyn PortfolioStore>,
        catalog: Arc<dyn AssetCatalog>,
        market: MarketData,
        returns: ReturnTable,
    ) -> Self {
        Self {
            profiles,
            portfolios,
            catalog,
            market,
            returns,
            locks: UserLocks::new(),
        }
    }

    /// First onboarding step. Creates the profile, or replaces it under the
    /// same rules as a profile edit.
    pub async fn submit_initial_info(
        &self,
        user_id: Uuid,
        profile: FinancialProfile,
    ) -> ServiceResult<ProfileUpdate> {
        self.save_profile(user_id, profile, false).await
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        profile: FinancialProfile,
    ) -> ServiceResult<ProfileUpdate> {
        self.save_profile(user_id, profile, true).await
    }

    async fn save_profile(
        &self,
        user_id: Uuid,
        profile: FinancialProfile,
        require_existing: bool,
    ) -> ServiceResult<ProfileUpdate> {
        validate_profile(&profile)?;

        let _guard = self.locks.acquire(user_id).await;
        let existing = if require_existing {
            Some(self.profiles.load_profile(user_id).await?)
        } else {
            found(self.profiles.load_profile(user_id).await)?
        };
        let portfolio = found(self.portfolios.load_portfolio(user_id).await)?;

        if let Some(current) = &existing {
            check_investment_change(
                &current.value,
                portfolio.as_ref().map(|doc| &doc.value),
                profile.initial_investment_amount,
            )?;
        }
        let raised_savings = match &portfolio {
            Some(doc) => reconcile_savings_floor(&doc.value, &profile)?,
            None => None,
        };

        let old_safe_savings = existing
            .as_ref()
            .map(|doc| safe_savings(doc.value.initial_investment_amount, doc.value.savings_threshold));
        let new_safe_savings =
            safe_savings(profile.initial_investment_amount, profile.savings_threshold);

        // Portfolio first: a stored floor must never outrun the stored savings.
        let topped_up = match (&portfolio, raised_savings) {
            (Some(doc), Some(savings)) => {
                let updated = Portfolio {
                    savings_allocation: savings,
                    ..doc.value.clone()
                };
                let version = self
                    .portfolios
                    .save_portfolio(user_id, Some(doc.version), updated)
                    .await?;
                info!(%user_id, savings, "raised savings to meet the new safe savings floor");
                Some(version)
            }
            _ => None,
        };

        let saved = self
            .profiles
            .save_profile(user_id, existing.map(|doc| doc.version), profile.clone())
            .await;
        if let Err(err) = saved {
            if let (Some(version), Some(doc)) = (topped_up, portfolio) {
                if let Err(restore_err) = self
                    .portfolios
                    .save_portfolio(user_id, Some(version), doc.value)
                    .await
                {
                    error!(%user_id, %restore_err, "could not restore savings after a failed profile save");
                } else {
                    warn!(%user_id, %err, "profile save failed, savings restored");
                }
            }
            return Err(err.into());
        }

        info!(
            %user_id,
            investment = profile.initial_investment_amount,
            new_safe_savings,
            "profile saved"
        );
        Ok(ProfileUpdate {
            profile,
            old_safe_savings,
            new_safe_savings,
            savings_allocation: raised_savings,
        })
    }

    pub async fn get_profile(&self, user_id: Uuid) -> ServiceResult<ProfileView> {
        let profile = self.profiles.load_profile(user_id).await?.value;
        let safe_savings = safe_savings(profile.initial_investment_amount, profile.savings_threshold);
        Ok(ProfileView {
            profile,
            safe_savings,
        })
    }

    /// Second onboarding step: records the first stock selection and activates
    /// the portfolio.
    pub async fn complete_stock_selection(
        &self,
        user_id: Uuid,
        stock_ids: &[StockId],
    ) -> ServiceResult<Portfolio> {
        let selection = normalize_selection(stock_ids)?;
        self.ensure_known_stocks(&selection).await?;

        let _guard = self.locks.acquire(user_id).await;
        let profile = found(self.profiles.load_profile(user_id).await)?
            .ok_or(SelectionError::ProfileMissing)?;
        let existing = found(self.portfolios.load_portfolio(user_id).await)?;

        let portfolio = complete_onboarding(
            existing.as_ref().map(|doc| &doc.value),
            &selection,
            &profile.value,
        )?;
        self.portfolios
            .save_portfolio(user_id, existing.map(|doc| doc.version), portfolio.clone())
            .await?;

        info!(%user_id, stocks = portfolio.selected_stock_ids.len(), "onboarding complete");
        Ok(portfolio)
    }

    pub async fn update_stock_selection(
        &self,
        user_id: Uuid,
        stock_ids: &[StockId],
    ) -> ServiceResult<SelectionChange> {
        let selection = normalize_selection(stock_ids)?;
        self.ensure_known_stocks(&selection).await?;

        let _guard = self.locks.acquire(user_id).await;
        let portfolio = self.active_portfolio(user_id).await?;
        let change = portfolio.value.reallocate_selection(&selection);

        self.portfolios
            .save_portfolio(
                user_id,
                Some(portfolio.version),
                change.apply_to(&portfolio.value),
            )
            .await?;

        info!(
            %user_id,
            added = change.added_stocks,
            removed = change.removed_stocks,
            reallocated = change.reallocated_amount,
            "stock selection updated"
        );
        Ok(change)
    }

    pub async fn adjust_portfolio(
        &self,
        user_id: Uuid,
        proposal: AllocationProposal,
        proposed_savings: f64,
    ) -> ServiceResult<Adjustment> {
        let _guard = self.locks.acquire(user_id).await;
        let profile = self.profiles.load_profile(user_id).await?;
        let portfolio = self.active_portfolio(user_id).await?;

        let adjustment =
            validate_adjustment(&profile.value, &proposal, proposed_savings, &self.returns)
                .inspect_err(|err| debug!(%user_id, %err, "adjustment rejected"))?;

        if let Some(stray) = proposal
            .stock_allocations
            .keys()
            .find(|id| !portfolio.value.selected_stock_ids.contains(id))
        {
            return Err(ServiceError::Validation(format!(
                "'{stray}' is not one of the selected stocks"
            )));
        }

        self.portfolios
            .save_portfolio(
                user_id,
                Some(portfolio.version),
                adjustment.apply_to(&portfolio.value),
            )
            .await?;

        info!(
            %user_id,
            total = adjustment.new_total_value,
            unallocated = adjustment.unallocated_amount,
            "portfolio adjusted"
        );
        Ok(adjustment)
    }

    pub async fn portfolio_overview(&self, user_id: Uuid) -> ServiceResult<PortfolioOverview> {
        let profile = self.profiles.load_profile(user_id).await?.value;
        let portfolio = self.active_portfolio(user_id).await?.value;

        let mut stocks = Vec::new();
        for asset in self.catalog.find_stocks(&portfolio.selected_stock_ids).await {
            let quote = self.market.stock_quote(&asset).await;
            stocks.push(StockQuoteView {
                id: asset.id,
                symbol: asset.symbol,
                name: asset.name,
                category: asset.category,
                current_price: quote.price,
                price_source: quote.source,
            });
        }
        let gold = self.market.gold_quote(&profile.location.state).await;

        let predicted_returns = self
            .returns
            .predicted_returns(&portfolio.allocations, profile.annual_savings_interest_rate);
        let absolute_returns = absolute_returns(
            &portfolio.allocations,
            portfolio.gold_allocation,
            portfolio.savings_allocation,
            &predicted_returns,
        );

        Ok(PortfolioOverview {
            total_value: portfolio.total_allocated(),
            distribution: portfolio.distribution(),
            unallocated_amount: portfolio.unallocated_amount(profile.initial_investment_amount),
            allocations: portfolio.allocations,
            gold_allocation: portfolio.gold_allocation,
            savings_allocation: portfolio.savings_allocation,
            stocks,
            gold,
            predicted_returns,
            absolute_returns,
        })
    }

    /// Everything the adjustment screen needs before the user proposes a change.
    pub async fn adjustment_view(&self, user_id: Uuid, years: u32) -> ServiceResult<AdjustmentView> {
        let profile = self.profiles.load_profile(user_id).await?.value;
        let portfolio = self.active_portfolio(user_id).await?.value;

        let total_investment = profile.initial_investment_amount;
        let floor = safe_savings(total_investment, profile.savings_threshold);
        let predicted_returns = self
            .returns
            .predicted_returns(&portfolio.allocations, profile.annual_savings_interest_rate);
        let absolute_returns = absolute_returns(
            &portfolio.allocations,
            portfolio.gold_allocation,
            portfolio.savings_allocation,
            &predicted_returns,
        );
        let projected_values = projected_values(
            &portfolio.allocations,
            portfolio.gold_allocation,
            portfolio.savings_allocation,
            &predicted_returns,
            years,
        );

        let held: Vec<StockId> = portfolio.allocations.keys().cloned().collect();
        let stock_metadata = self
            .catalog
            .find_stocks(&held)
            .await
            .into_iter()
            .map(|asset| {
                (
                    asset.id,
                    StockMetadata {
                        name: asset.name,
                        symbol: asset.symbol,
                    },
                )
            })
            .collect();

        Ok(AdjustmentView {
            total_investment,
            safe_savings: floor,
            disposable_amount: disposable_amount(total_investment, floor),
            unallocated_amount: portfolio.unallocated_amount(total_investment),
            stock_allocations: portfolio.allocations,
            gold_allocation: portfolio.gold_allocation,
            current_savings: portfolio.savings_allocation,
            predicted_returns,
            absolute_returns,
            projected_values,
            stock_metadata,
        })
    }

    pub async fn list_stocks(&self, search: &str, limit: usize) -> Vec<StockQuoteView> {
        let mut listings = Vec::new();
        for asset in self.catalog.search(search, limit).await {
            let quote = self.market.stock_quote(&asset).await;
            listings.push(StockQuoteView {
                id: asset.id,
                symbol: asset.symbol,
                name: asset.name,
                category: asset.category,
                current_price: quote.price,
                price_source: quote.source,
            });
        }
        listings
    }

    pub async fn latest_gold_price(&self, state: &str) -> ServiceResult<GoldQuote> {
        let state = state.trim();
        if state.is_empty() {
            return Err(ServiceError::Validation("state parameter is required".to_string()));
        }
        Ok(self.market.gold_quote(state).await)
    }

    async fn active_portfolio(&self, user_id: Uuid) -> ServiceResult<Versioned<Portfolio>> {
        let portfolio = self.portfolios.load_portfolio(user_id).await?;
        if PortfolioStage::of(Some(&portfolio.value)) != PortfolioStage::Active {
            return Err(SelectionError::OnboardingIncomplete.into());
        }
        Ok(portfolio)
    }

    async fn ensure_known_stocks(&self, selection: &[StockId]) -> ServiceResult<()> {
        let known = self.catalog.find_stocks(selection).await;
        if let Some(missing) = selection
            .iter()
            .find(|id| !known.iter().any(|asset| &asset.id == *id))
        {
            return Err(SelectionError::UnknownStock(missing.clone()).into());
        }
        Ok(())
    }
}
