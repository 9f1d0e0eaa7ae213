//! Catalog browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::ProductId;
use domain::{Category, Money, Product};
use kv_store::KeyValueStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
    pub category: Option<Category>,
    pub low_stock: bool,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            category: Category::of(product.id),
            low_stock: product.is_low_stock(),
            id: product.id,
            name: product.name,
            price: product.price,
            stock: product.stock,
        }
    }
}

/// `"all"` or an absent value means no category filter.
fn parse_category(value: Option<&str>) -> Result<Option<Category>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(ApiError::BadRequest),
    }
}

/// GET /products: catalog with live stock, filtered by name and category.
#[tracing::instrument(skip(state))]
pub async fn list<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let category = parse_category(query.category.as_deref())?;
    let term = query.search.unwrap_or_default();
    let products = state.desk.ledger.search(&term, category).await;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/{id}
pub async fn get<S: KeyValueStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<u32>,
) -> Result<Json<ProductResponse>, ApiError> {
    state
        .desk
        .ledger
        .product(ProductId::new(id))
        .await
        .map(|p| Json(p.into()))
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category(None).unwrap(), None);
        assert_eq!(parse_category(Some("ALL")).unwrap(), None);
        assert_eq!(parse_category(Some("seeds")).unwrap(), Some(Category::Seeds));
        assert!(parse_category(Some("candy")).is_err());
    }
}
