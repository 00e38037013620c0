use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use station_core::{UserId, UserStateEntry};
use station_purchase::TransactionEntry;

use crate::{error::AppError, middleware::auth::Identity, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApplyOfferListRequest {
    #[serde(default)]
    pub offer_ids: Vec<String>,
    #[serde(default)]
    pub history_from_time: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionList {
    pub total_results: usize,
    pub transactions: Vec<TransactionEntry>,
}

impl From<Vec<TransactionEntry>> for TransactionList {
    fn from(transactions: Vec<TransactionEntry>) -> Self {
        Self {
            total_results: transactions.len(),
            transactions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserRef {
    #[serde(rename = "Id")]
    pub id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserStatesResponse {
    pub user_state_list: Vec<UserStateEntry>,
    pub time_stamp: i64,
    pub user: UserRef,
}

/// Wrap `data` the way game clients expect: `{"<key>": {"retCode": 0, "data": ...}}`
pub fn envelope(key: &str, data: impl Serialize) -> Result<Json<Value>, AppError> {
    let data = serde_json::to_value(data)
        .map_err(|e| AppError::InternalServerError(format!("Response encoding failed: {}", e)))?;

    let mut body = Map::new();
    body.insert(key.to_string(), json!({ "retCode": 0, "data": data }));
    Ok(Json(Value::Object(body)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/UserService.svc/ApplyOfferListAndGetTransactionHistory",
            post(apply_offer_list),
        )
        .route("/UserService.svc/GetTransactionHistory", post(transaction_history))
        .route("/UserService.svc/GetUserStates", post(user_states))
        .route("/UserService.svc/GetItemOffers", post(item_offers))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /UserService.svc/ApplyOfferListAndGetTransactionHistory
pub async fn apply_offer_list(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(req): Json<ApplyOfferListRequest>,
) -> Result<Json<Value>, AppError> {
    let entries = state
        .service
        .apply_offers(user_id, &req.offer_ids, req.history_from_time)
        .await?;

    info!("User {:?} applied {} offers", user_id, entries.len());
    envelope("ApplyOfferListAndGetTransactionHistory", TransactionList::from(entries))
}

/// POST /UserService.svc/GetTransactionHistory
pub async fn transaction_history(
    State(state): State<AppState>,
    Identity(user_id): Identity,
) -> Result<Json<Value>, AppError> {
    let entries = state.service.transaction_history(user_id).await?;
    envelope("GetTransactionHistoryResult", TransactionList::from(entries))
}

/// POST /UserService.svc/GetUserStates
pub async fn user_states(
    State(state): State<AppState>,
    Identity(user_id): Identity,
) -> Result<Json<Value>, AppError> {
    let user_state_list = state.service.user_states(user_id).await?;
    // user_states already rejected a missing user
    let id = user_id.unwrap_or_default();

    envelope(
        "GetUserStatesResult",
        UserStatesResponse {
            user_state_list,
            time_stamp: Utc::now().timestamp(),
            user: UserRef { id },
        },
    )
}

/// POST /UserService.svc/GetItemOffers
pub async fn item_offers(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let catalog = state.service.catalog().current();
    envelope("GetItemOffersResult", catalog.documents())
}
