//! Coffee fund endpoints.
//!
//! Handlers only translate HTTP to [`FundService`](crate::services::FundService)
//! calls; the signed-in user comes from [`CurrentUser`].

use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_coffee_name;
use super::{
    ApiError, ApiResponse, AppState, CoffeeDto, FavoriteRequest, NextPayerDto, PurchaseRequest,
};
use crate::constants::NO_PAYER;
use crate::db::PublicUser;
use crate::models::HistoryEntry;
use crate::services::ledger::{Reconciliation, SpendTotals};
use crate::services::{Dashboard, RecordedPurchase, SettledRound};

/// GET /dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let dashboard = state.fund().dashboard(&username).await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

/// GET /coffees
pub async fn list_coffees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CoffeeDto>>>, ApiError> {
    let prices = state.fund().coffee_prices().await?;
    let coffees = prices
        .iter()
        .map(|(name, price)| CoffeeDto {
            name: name.to_string(),
            price,
        })
        .collect();
    Ok(Json(ApiResponse::success(coffees)))
}

/// GET /ledger/totals
pub async fn get_totals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SpendTotals>>, ApiError> {
    let totals = state.fund().spend_totals().await?;
    Ok(Json(ApiResponse::success(totals)))
}

/// GET /ledger/next-payer
pub async fn get_next_payer(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<NextPayerDto>>, ApiError> {
    let payer = state.fund().next_payer().await?;
    let dto = NextPayerDto {
        has_payer: payer.is_some(),
        payer: payer.unwrap_or_else(|| NO_PAYER.to_string()),
    };
    Ok(Json(ApiResponse::success(dto)))
}

/// GET /ledger/reconcile
pub async fn get_reconciliation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Reconciliation>>, ApiError> {
    let report = state.fund().reconcile().await?;
    Ok(Json(ApiResponse::success(report)))
}

/// POST /rounds
/// The least-spent user pays for every participant's favorite.
pub async fn settle_round(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<SettledRound>>, ApiError> {
    tracing::debug!("Round settlement requested by {username}");
    let settled = state.fund().settle_round().await?;
    Ok(Json(ApiResponse::success(settled)))
}

/// POST /purchases
pub async fn record_purchase(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Json(payload): Json<PurchaseRequest>,
) -> Result<Json<ApiResponse<RecordedPurchase>>, ApiError> {
    let coffee = validate_coffee_name(&payload.coffee)?;
    let recorded = state.fund().record_purchase(&username, coffee).await?;
    Ok(Json(ApiResponse::success(recorded)))
}

/// GET /history
/// The signed-in user's own history, oldest first.
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<HistoryEntry>>>, ApiError> {
    let history = state.fund().history_for(&username).await?;
    Ok(Json(ApiResponse::success(history)))
}

/// PUT /me/favorite
/// `{"favorite": null}` opts out of rounds.
pub async fn update_favorite(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
    Json(payload): Json<FavoriteRequest>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = state
        .fund()
        .update_favorite(&username, payload.favorite)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<PublicUser>>>, ApiError> {
    let users = state.auth().list_users().await?;
    Ok(Json(ApiResponse::success(users)))
}
