//! Vendor session endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::VendorSession;
use kv_store::KeyValueStore;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: String,
}

/// POST /session: log a vendor in, replacing any current session.
#[tracing::instrument(skip(state, req))]
pub async fn login<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<VendorSession>), ApiError> {
    let session = state.desk.vendors.login(&req.name).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /session: the logged-in vendor, or 401.
pub async fn current<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<VendorSession>, ApiError> {
    Ok(Json(state.desk.vendors.require().await?))
}

/// DELETE /session: log out.
#[tracing::instrument(skip(state))]
pub async fn logout<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<StatusCode, ApiError> {
    state.desk.vendors.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}
