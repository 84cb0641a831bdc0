use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::core::{
    Adjustment, AllocationError, AllocationProposal, FinancialProfile, Portfolio,
    PredictedReturns, SelectionChange, StockAllocations, StockId,
};
use crate::market::{MarketData, OfflineFeed, StaticCatalog};
use crate::service::{PortfolioService, ProfileUpdate, ServiceError};
use crate::store::{MemoryStore, StoreError};

const DEFAULT_PREDICTION_YEARS: u32 = 1;
const MAX_PREDICTION_YEARS: u32 = 50;
const DEFAULT_STOCK_LIMIT: usize = 50;
const MAX_STOCK_LIMIT: usize = 500;

#[derive(Clone)]
pub struct AppState {
    service: Arc<PortfolioService>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionPayload {
    selected_stock_ids: Vec<StockId>,
}

/// Accepts gold either as its own field or under the reserved `"gold"` key of
/// `proposedAllocations`, never both.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdjustPayload {
    #[serde(default)]
    stock_allocations: Option<StockAllocations>,
    #[serde(default)]
    gold_allocation: Option<f64>,
    #[serde(default)]
    proposed_allocations: Option<BTreeMap<String, f64>>,
    proposed_savings: f64,
}

#[derive(Debug, Default, Deserialize)]
struct PredictionsQuery {
    years: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct StockSearchQuery {
    search: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct GoldPriceQuery {
    state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSavedResponse {
    message: &'static str,
    #[serde(flatten)]
    update: ProfileUpdate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OnboardingResponse {
    message: &'static str,
    portfolio: Portfolio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AdjustResponse {
    message: String,
    new_total_value: f64,
    unallocated_amount: f64,
    stock_allocations: StockAllocations,
    gold_allocation: f64,
    savings_allocation: f64,
    updated_predictions: PredictedReturns,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectionResponse {
    message: &'static str,
    selected_stock_ids: Vec<StockId>,
    allocations: StockAllocations,
    savings_allocation: f64,
    added_stocks: usize,
    removed_stocks: usize,
    reallocated_amount: f64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    safe_savings: Option<f64>,
}

impl AdjustPayload {
    fn into_proposal(self) -> Result<(AllocationProposal, f64), String> {
        let proposal = match (self.stock_allocations, self.proposed_allocations) {
            (Some(_), Some(_)) => {
                return Err(
                    "send either stockAllocations or proposedAllocations, not both".to_string(),
                );
            }
            (Some(stock_allocations), None) => AllocationProposal {
                stock_allocations,
                gold_allocation: self.gold_allocation.unwrap_or(0.0),
            },
            (None, Some(keyed)) => {
                if self.gold_allocation.is_some() {
                    return Err(
                        "goldAllocation cannot be combined with proposedAllocations; use the \"gold\" key"
                            .to_string(),
                    );
                }
                AllocationProposal::from_keyed(keyed)
            }
            (None, None) => {
                return Err("stockAllocations or proposedAllocations is required".to_string());
            }
        };
        Ok((proposal, self.proposed_savings))
    }
}

impl From<Adjustment> for AdjustResponse {
    fn from(adjustment: Adjustment) -> Self {
        let message = if adjustment.has_unallocated_remainder() {
            format!(
                "Portfolio adjusted. ₹{:.2} remains unallocated.",
                adjustment.unallocated_amount
            )
        } else {
            "Portfolio adjusted successfully".to_string()
        };
        Self {
            message,
            new_total_value: adjustment.new_total_value,
            unallocated_amount: adjustment.unallocated_amount,
            stock_allocations: adjustment.stock_allocations,
            gold_allocation: adjustment.gold_allocation,
            savings_allocation: adjustment.savings_allocation,
            updated_predictions: adjustment.predicted_returns,
        }
    }
}

impl From<SelectionChange> for SelectionResponse {
    fn from(change: SelectionChange) -> Self {
        Self {
            message: "Stock selection updated",
            selected_stock_ids: change.selected_stock_ids,
            allocations: change.allocations,
            savings_allocation: change.savings_allocation,
            added_stocks: change.added_stocks,
            removed_stocks: change.removed_stocks,
            reallocated_amount: change.reallocated_amount,
        }
    }
}

pub fn build_state(settings: &Settings) -> AppState {
    let store = Arc::new(MemoryStore::new());
    let market = MarketData::new(
        Arc::new(OfflineFeed),
        settings.price_cache_ttl,
        settings.gold_fallback_price,
    );
    let service = PortfolioService::new(
        store.clone(),
        store,
        Arc::new(StaticCatalog::indian_equities()),
        market,
        settings.returns.clone(),
    );
    AppState {
        service: Arc::new(service),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/onboarding/:user_id/initial-info",
            post(initial_info_handler),
        )
        .route(
            "/api/onboarding/:user_id/select-stocks",
            post(select_stocks_handler),
        )
        .route(
            "/api/profile/:user_id",
            get(get_profile_handler).put(update_profile_handler),
        )
        .route("/api/portfolio/:user_id", get(portfolio_handler))
        .route(
            "/api/portfolio/:user_id/predictions",
            get(predictions_handler),
        )
        .route("/api/portfolio/:user_id/adjust", put(adjust_handler))
        .route("/api/stocks/:user_id", put(update_stocks_handler))
        .route("/api/assets/stocks", get(list_stocks_handler))
        .route("/api/gold-prices/latest", get(gold_price_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(settings: Settings) -> std::io::Result<()> {
    let addr = settings.addr;
    let app = router(build_state(&settings));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "nivesh HTTP API listening");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn initial_info_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<FinancialProfile>, JsonRejection>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let profile = match parse_body(payload) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match state.service.submit_initial_info(user_id, profile).await {
        Ok(update) => json_response(
            StatusCode::OK,
            ProfileSavedResponse {
                message: "Profile information saved",
                update,
            },
        ),
        Err(err) => service_error_response(err),
    }
}

async fn select_stocks_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<SelectionPayload>, JsonRejection>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let payload = match parse_body(payload) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match state
        .service
        .complete_stock_selection(user_id, &payload.selected_stock_ids)
        .await
    {
        Ok(portfolio) => json_response(
            StatusCode::OK,
            OnboardingResponse {
                message: "Onboarding completed",
                portfolio,
            },
        ),
        Err(err) => service_error_response(err),
    }
}

async fn get_profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    respond(state.service.get_profile(user_id).await)
}

async fn update_profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<FinancialProfile>, JsonRejection>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let profile = match parse_body(payload) {
        Ok(profile) => profile,
        Err(response) => return response,
    };

    match state.service.update_profile(user_id, profile).await {
        Ok(update) => json_response(
            StatusCode::OK,
            ProfileSavedResponse {
                message: "Profile updated",
                update,
            },
        ),
        Err(err) => service_error_response(err),
    }
}

async fn portfolio_handler(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    respond(state.service.portfolio_overview(user_id).await)
}

async fn predictions_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<PredictionsQuery>, QueryRejection>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let years = match parse_query(query).and_then(|query| {
        prediction_years(query.years).map_err(|msg| error_response(StatusCode::BAD_REQUEST, &msg))
    }) {
        Ok(years) => years,
        Err(response) => return response,
    };
    respond(state.service.adjustment_view(user_id, years).await)
}

async fn adjust_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<AdjustPayload>, JsonRejection>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let payload = match parse_body(payload) {
        Ok(payload) => payload,
        Err(response) => return response,
    };
    let (proposal, proposed_savings) = match payload.into_proposal() {
        Ok(parts) => parts,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match state
        .service
        .adjust_portfolio(user_id, proposal, proposed_savings)
        .await
    {
        Ok(adjustment) => json_response(StatusCode::OK, AdjustResponse::from(adjustment)),
        Err(err) => service_error_response(err),
    }
}

async fn update_stocks_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<SelectionPayload>, JsonRejection>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let payload = match parse_body(payload) {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    match state
        .service
        .update_stock_selection(user_id, &payload.selected_stock_ids)
        .await
    {
        Ok(change) => json_response(StatusCode::OK, SelectionResponse::from(change)),
        Err(err) => service_error_response(err),
    }
}

async fn list_stocks_handler(
    State(state): State<AppState>,
    query: Result<Query<StockSearchQuery>, QueryRejection>,
) -> Response {
    let query = match parse_query(query) {
        Ok(query) => query,
        Err(response) => return response,
    };
    let limit = query.limit.unwrap_or(DEFAULT_STOCK_LIMIT);
    if !(1..=MAX_STOCK_LIMIT).contains(&limit) {
        return error_response(
            StatusCode::BAD_REQUEST,
            &format!("limit must be between 1 and {MAX_STOCK_LIMIT}"),
        );
    }

    let stocks = state
        .service
        .list_stocks(query.search.as_deref().unwrap_or(""), limit)
        .await;
    json_response(StatusCode::OK, stocks)
}

async fn gold_price_handler(
    State(state): State<AppState>,
    query: Result<Query<GoldPriceQuery>, QueryRejection>,
) -> Response {
    let query = match parse_query(query) {
        Ok(query) => query,
        Err(response) => return response,
    };
    respond(
        state
            .service
            .latest_gold_price(query.state.as_deref().unwrap_or(""))
            .await,
    )
}

fn prediction_years(years: Option<u32>) -> Result<u32, String> {
    let years = years.unwrap_or(DEFAULT_PREDICTION_YEARS);
    if !(1..=MAX_PREDICTION_YEARS).contains(&years) {
        return Err(format!("years must be between 1 and {MAX_PREDICTION_YEARS}"));
    }
    Ok(years)
}

fn parse_user_id(raw: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(raw).map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid user ID"))
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        error_response(
            StatusCode::BAD_REQUEST,
            &format!("Validation failed: {}", rejection.body_text()),
        )
    })
}

fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Response> {
    query.map(|Query(query)| query).map_err(|rejection| {
        error_response(
            StatusCode::BAD_REQUEST,
            &format!("Validation failed: {}", rejection.body_text()),
        )
    })
}

fn respond<T: Serialize>(result: Result<T, ServiceError>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => service_error_response(err),
    }
}

fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Validation(_)
        | ServiceError::Allocation(_)
        | ServiceError::Profile(_)
        | ServiceError::Selection(_) => StatusCode::BAD_REQUEST,
        ServiceError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ServiceError::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
    }
}

fn error_body(err: &ServiceError) -> ErrorResponse {
    let mut body = ErrorResponse {
        error: err.to_string(),
        key: None,
        safe_savings: None,
    };
    match err {
        ServiceError::Allocation(AllocationError::InvalidAllocation { key, .. }) => {
            body.key = Some(key.clone());
        }
        ServiceError::Allocation(AllocationError::BelowSafeSavingsFloor { floor, .. }) => {
            body.safe_savings = Some(*floor);
        }
        _ => {}
    }
    body
}

fn service_error_response(err: ServiceError) -> Response {
    let status = status_for(&err);
    if status == StatusCode::CONFLICT {
        warn!(%err, "rejected stale write");
    }
    json_response(status, error_body(&err))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            key: None,
            safe_savings: None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ReturnTable, SelectionError};
    use crate::market::stock_id_for_symbol;
    use axum::body::to_bytes;
    use serde_json::{Value, json};
    use std::time::Duration;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_state() -> AppState {
        build_state(&Settings {
            addr: "127.0.0.1:0".parse().expect("socket address"),
            gold_fallback_price: 6000.0,
            price_cache_ttl: Duration::from_secs(300),
            returns: ReturnTable::default(),
            log_format: crate::config::LogFormat::Text,
        })
    }

    fn sample_profile() -> FinancialProfile {
        serde_json::from_value(json!({
            "fullName": "Asha Rao",
            "location": { "state": "Karnataka", "city": "Bengaluru" },
            "initialInvestmentAmount": 100000.0,
            "savingsThreshold": { "type": "percentage", "value": 20.0 },
            "annualSavingsInterestRate": 6.5
        }))
        .expect("profile JSON")
    }

    fn adjust_payload(value: Value) -> AdjustPayload {
        serde_json::from_value(value).expect("adjust payload JSON")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("JSON body")
    }

    async fn onboard(state: &AppState, symbols: &[&str]) -> String {
        let user_id = Uuid::new_v4().to_string();
        let response = initial_info_handler(
            State(state.clone()),
            Path(user_id.clone()),
            Ok(Json(sample_profile())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = select_stocks_handler(
            State(state.clone()),
            Path(user_id.clone()),
            Ok(Json(SelectionPayload {
                selected_stock_ids: symbols.iter().map(|s| stock_id_for_symbol(s)).collect(),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        user_id
    }

    #[test]
    fn adjust_payload_accepts_separate_gold_field() {
        let tcs = stock_id_for_symbol("TCS.NS");
        let (proposal, savings) = adjust_payload(json!({
            "stockAllocations": { tcs.clone(): 40000.0 },
            "goldAllocation": 10000.0,
            "proposedSavings": 20000.0
        }))
        .into_proposal()
        .expect("valid payload");

        assert_approx(proposal.stock_allocations[&tcs], 40_000.0);
        assert_approx(proposal.gold_allocation, 10_000.0);
        assert_approx(savings, 20_000.0);
    }

    #[test]
    fn adjust_payload_extracts_gold_from_legacy_map() {
        let (proposal, _) = adjust_payload(json!({
            "proposedAllocations": { "stock-a": 500.0, "gold": 250.0 },
            "proposedSavings": 1000.0
        }))
        .into_proposal()
        .expect("valid legacy payload");

        assert_eq!(proposal.stock_allocations.len(), 1);
        assert_approx(proposal.gold_allocation, 250.0);
    }

    #[test]
    fn adjust_payload_rejects_ambiguous_shapes() {
        let err = adjust_payload(json!({
            "stockAllocations": {},
            "proposedAllocations": {},
            "proposedSavings": 0.0
        }))
        .into_proposal()
        .expect_err("both shapes");
        assert!(err.contains("not both"));

        let err = adjust_payload(json!({ "proposedSavings": 0.0 }))
            .into_proposal()
            .expect_err("neither shape");
        assert!(err.contains("required"));
    }

    #[test]
    fn prediction_years_defaults_and_bounds() {
        assert_eq!(prediction_years(None), Ok(1));
        assert_eq!(prediction_years(Some(50)), Ok(50));
        assert!(prediction_years(Some(0)).is_err());
        assert!(prediction_years(Some(51)).is_err());
    }

    #[test]
    fn service_errors_map_to_http_status() {
        let user_id = Uuid::new_v4();
        let cases = [
            (ServiceError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (
                ServiceError::Selection(SelectionError::Empty),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::Store(StoreError::NotFound {
                    entity: crate::store::Entity::Portfolio,
                    user_id,
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::Store(StoreError::Conflict {
                    entity: crate::store::Entity::Portfolio,
                    user_id,
                    expected: 1,
                    actual: 2,
                }),
                StatusCode::CONFLICT,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err}");
        }
    }

    #[test]
    fn error_body_carries_allocation_context() {
        let invalid = error_body(&ServiceError::Allocation(
            AllocationError::InvalidAllocation {
                key: "gold".to_string(),
                value: -5.0,
            },
        ));
        let value = serde_json::to_value(&invalid).expect("serializable");
        assert_eq!(value["key"], "gold");
        assert!(value.get("safeSavings").is_none());

        let below = error_body(&ServiceError::Allocation(
            AllocationError::BelowSafeSavingsFloor {
                proposed: 500.0,
                floor: 2000.0,
            },
        ));
        let value = serde_json::to_value(&below).expect("serializable");
        assert_eq!(value["safeSavings"], 2000.0);
        assert!(value.get("key").is_none());
    }

    #[tokio::test]
    async fn malformed_user_id_is_rejected() {
        let response = get_profile_handler(State(sample_state()), Path("42".to_string())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
        assert_eq!(body_json(response).await["error"], "Invalid user ID");
    }

    #[tokio::test]
    async fn portfolio_before_onboarding_is_not_found() {
        let response = portfolio_handler(
            State(sample_state()),
            Path(Uuid::new_v4().to_string()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn adjust_reports_unallocated_remainder() {
        let state = sample_state();
        let user_id = onboard(&state, &["TCS.NS"]).await;
        let tcs = stock_id_for_symbol("TCS.NS");

        let response = adjust_handler(
            State(state.clone()),
            Path(user_id),
            Ok(Json(adjust_payload(json!({
                "stockAllocations": { tcs: 40000.0 },
                "goldAllocation": 10000.0,
                "proposedSavings": 20000.0
            })))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Portfolio adjusted. ₹30000.00 remains unallocated.");
        assert_eq!(body["newTotalValue"], 70000.0);
        assert_eq!(body["updatedPredictions"]["gold"], 8.0);
    }

    #[tokio::test]
    async fn adjust_below_floor_returns_safe_savings() {
        let state = sample_state();
        let user_id = onboard(&state, &["TCS.NS"]).await;

        let response = adjust_handler(
            State(state),
            Path(user_id),
            Ok(Json(adjust_payload(json!({
                "proposedAllocations": { "gold": 1000.0 },
                "proposedSavings": 5000.0
            })))),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["safeSavings"], 20000.0);
    }

    #[tokio::test]
    async fn predictions_include_projection_for_requested_years() {
        let state = sample_state();
        let user_id = onboard(&state, &["INFY.NS"]).await;

        let response = predictions_handler(
            State(state),
            Path(user_id),
            Ok(Query(PredictionsQuery { years: Some(5) })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["projectedValues"]["years"], 5);
        assert_eq!(body["safeSavings"], 20000.0);
        assert_eq!(body["disposableAmount"], 80000.0);
        let infy = stock_id_for_symbol("INFY.NS");
        assert_eq!(body["stockMetadata"][infy.as_str()]["symbol"], "INFY.NS");
    }

    #[tokio::test]
    async fn stock_search_respects_limit() {
        let response = list_stocks_handler(
            State(sample_state()),
            Ok(Query(StockSearchQuery {
                search: Some("tata".to_string()),
                limit: Some(2),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let stocks = body.as_array().expect("array body");
        assert_eq!(stocks.len(), 2);
        assert!(stocks.iter().all(|s| s["priceSource"] == "fallback"));
    }

    #[tokio::test]
    async fn gold_price_requires_state_parameter() {
        let response = gold_price_handler(
            State(sample_state()),
            Ok(Query(GoldPriceQuery::default())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
