//! Sales statistics endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, header};
use axum::response::IntoResponse;
use chrono::{DateTime, FixedOffset, Local, Utc};
use kv_store::KeyValueStore;
use projections::{Stats, TimeFilter, compute_stats, products_csv_filename};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub period: Option<String>,
    /// Caller's offset from UTC in minutes, east positive. Defaults to the
    /// server's local zone.
    pub utc_offset_minutes: Option<i32>,
}

impl StatsQuery {
    fn filter(&self) -> Result<TimeFilter, ApiError> {
        Ok(self.period.as_deref().unwrap_or_default().parse()?)
    }

    fn now(&self) -> Result<DateTime<FixedOffset>, ApiError> {
        match self.utc_offset_minutes {
            None => Ok(Local::now().fixed_offset()),
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .map(|offset| Utc::now().with_timezone(&offset))
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("Invalid UTC offset: {minutes} minutes"))
                }),
        }
    }
}

async fn stats_for<S: KeyValueStore + Clone + 'static>(
    state: &AppState<S>,
    query: &StatsQuery,
) -> Result<(Stats, DateTime<FixedOffset>), ApiError> {
    let filter = query.filter()?;
    let now = query.now()?;
    let history = state.desk.orders.history().await;
    Ok((compute_stats(&history, filter, &now), now))
}

/// GET /stats: totals plus product and vendor rollups for the period.
#[tracing::instrument(skip(state))]
pub async fn get<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Stats>, ApiError> {
    let (stats, _) = stats_for(&state, &query).await?;
    Ok(Json(stats))
}

/// GET /stats/products.csv: the product rollup as a CSV download.
#[tracing::instrument(skip(state))]
pub async fn products_csv<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (stats, now) = stats_for(&state, &query).await?;
    let filename = products_csv_filename(now.date_naive());
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    metrics::counter!("stats_csv_exports_total").increment(1);
    tracing::info!(rows = stats.products.len(), %filename, "exported product stats");

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        projections::products_csv(&stats),
    ))
}
