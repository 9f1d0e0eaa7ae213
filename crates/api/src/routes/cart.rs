//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use domain::{CartSnapshot, ShortfallReport};
use kv_store::KeyValueStore;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: u32,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// GET /cart
pub async fn get<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<CartSnapshot> {
    Json(state.desk.cart.snapshot().await)
}

/// POST /cart/items: reserve stock and add it to the cart.
#[tracing::instrument(skip(state))]
pub async fn add_item<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let snapshot = state
        .desk
        .cart
        .add_item(ProductId::new(req.product_id), req.quantity)
        .await?;
    Ok(Json(snapshot))
}

/// DELETE /cart/items/{product_id}: drop the line and release its stock.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<u32>,
) -> Result<Json<CartSnapshot>, ApiError> {
    let snapshot = state
        .desk
        .cart
        .remove_item(ProductId::new(product_id))
        .await?;
    Ok(Json(snapshot))
}

/// DELETE /cart: empty the cart, releasing every reservation.
#[tracing::instrument(skip(state))]
pub async fn clear<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<StatusCode, ApiError> {
    state.desk.cart.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /cart/customer: update whichever customer fields are present.
#[tracing::instrument(skip(state))]
pub async fn set_customer<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CustomerRequest>,
) -> Result<Json<CartSnapshot>, ApiError> {
    if let Some(name) = &req.name {
        state.desk.cart.set_customer_name(name).await?;
    }
    if let Some(address) = &req.address {
        state.desk.cart.set_customer_address(address).await?;
    }
    Ok(Json(state.desk.cart.snapshot().await))
}

/// GET /cart/shortfall
pub async fn shortfall<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<ShortfallReport> {
    Json(state.desk.cart.check_shortfall().await)
}
