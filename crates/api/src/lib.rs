//! HTTP API server with observability for the order desk.
//!
//! Provides REST endpoints for the catalog, cart, vendor session, orders and
//! sales statistics, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{Catalog, DomainError, OrderDesk};
use kv_store::KeyValueStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
pub struct AppState<S: KeyValueStore> {
    pub desk: OrderDesk<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: KeyValueStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health::<S>))
        .route(
            "/session",
            post(routes::session::login::<S>)
                .get(routes::session::current::<S>)
                .delete(routes::session::logout::<S>),
        )
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route(
            "/cart",
            get(routes::cart::get::<S>).delete(routes::cart::clear::<S>),
        )
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/cart/items/{product_id}",
            delete(routes::cart::remove_item::<S>),
        )
        .route("/cart/customer", put(routes::cart::set_customer::<S>))
        .route("/cart/shortfall", get(routes::cart::shortfall::<S>))
        .route("/checkout", post(routes::orders::checkout::<S>))
        .route("/orders/pending", get(routes::orders::pending::<S>))
        .route("/orders/history", get(routes::orders::history::<S>))
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>).delete(routes::orders::cancel::<S>),
        )
        .route("/orders/{id}/status", put(routes::orders::set_status::<S>))
        .route("/orders/{id}/history", delete(routes::orders::purge::<S>))
        .route("/orders/{id}/shortfall", get(routes::orders::shortfall::<S>))
        .route("/orders/{id}/receipt", get(routes::orders::receipt::<S>))
        .route("/stats", get(routes::stats::get::<S>))
        .route("/stats/products.csv", get(routes::stats::products_csv::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Restores the desk from `store` over the standard catalog.
pub async fn create_default_state<S: KeyValueStore + Clone + 'static>(
    store: S,
) -> Result<Arc<AppState<S>>, DomainError> {
    let desk = OrderDesk::load(store, Catalog::standard()).await?;
    Ok(Arc::new(AppState { desk }))
}
