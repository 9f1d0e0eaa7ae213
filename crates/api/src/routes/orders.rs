//! Checkout and order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{Order, OrderStatus, Receipt, ShortfallReport};
use kv_store::KeyValueStore;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub discount_percent: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(id).map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}

// -- Handlers --

/// POST /checkout: turn the cart into a pending order.
#[tracing::instrument(skip(state, req))]
pub async fn checkout<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .desk
        .checkout(req.discount_percent, req.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/pending: open orders, most recent first.
pub async fn pending<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Order>> {
    let term = query.search.unwrap_or_default();
    Json(state.desk.orders.search_pending(&term).await)
}

/// GET /orders/history: every order, most recent first.
pub async fn history<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Order>> {
    let term = query.search.unwrap_or_default();
    Json(state.desk.orders.search_history(&term).await)
}

/// GET /orders/{id}
pub async fn get<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.desk.orders.get(order_id).await?))
}

/// PUT /orders/{id}/status: advance an open order.
#[tracing::instrument(skip(state, req))]
pub async fn set_status<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let status: OrderStatus = req.status.parse().map_err(ApiError::BadRequest)?;
    let order = state
        .desk
        .orders
        .set_status(order_id, status, req.notes)
        .await?;
    Ok(Json(order))
}

/// DELETE /orders/{id}: cancel an open order and release its stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.desk.orders.remove(order_id).await?))
}

/// DELETE /orders/{id}/history: delete a closed order for good.
#[tracing::instrument(skip(state))]
pub async fn purge<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let order_id = parse_order_id(&id)?;
    state.desk.orders.purge(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /orders/{id}/shortfall
pub async fn shortfall<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ShortfallReport>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.desk.orders.check_shortfall(order_id).await?))
}

/// GET /orders/{id}/receipt
pub async fn receipt<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Receipt>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.desk.orders.receipt(order_id).await?))
}
