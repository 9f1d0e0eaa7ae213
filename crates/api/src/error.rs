//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DomainError, OrderError, VendorError};
use projections::ProjectionError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Statistics request error.
    Projection(ProjectionError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Projection(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::InvalidQuantity { .. }
            | CartError::EmptyCart
            | CartError::CustomerNameRequired => StatusCode::BAD_REQUEST,
            CartError::ProductNotFound { .. } => StatusCode::NOT_FOUND,
            CartError::InsufficientStock { .. } => StatusCode::CONFLICT,
        },
        DomainError::Order(order_err) => match order_err {
            OrderError::InvalidDiscount { .. } => StatusCode::BAD_REQUEST,
            OrderError::OrderNotFound { .. } => StatusCode::NOT_FOUND,
            OrderError::InvalidStateTransition { .. } | OrderError::OrderStillOpen { .. } => {
                StatusCode::CONFLICT
            }
        },
        DomainError::Vendor(VendorError::VendorNameRequired) => StatusCode::BAD_REQUEST,
        DomainError::Vendor(VendorError::NotLoggedIn) => StatusCode::UNAUTHORIZED,
        DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Store error: {0}")]
    Store(#[from] kv_store::StoreError),

    #[error("Failed to restore desk state: {0}")]
    Domain(#[from] DomainError),

    #[error("Failed to install Prometheus recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}
