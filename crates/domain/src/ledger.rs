//! Stock ledger: the only writer of product stock.

use std::sync::Arc;

use common::ProductId;
use kv_store::{KeyValueStore, KeyValueStoreExt, keys};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::catalog::{Catalog, Category, Product, StockRecord};
use crate::error::DomainError;

/// A line whose requested quantity exceeds what is in stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shortage {
    pub product_id: ProductId,
    pub name: String,
    pub requested: u32,
    pub available: u32,
}

/// Result of a shortfall check over a set of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortfallReport {
    pub has_shortage: bool,
    pub shortages: Vec<Shortage>,
}

impl ShortfallReport {
    fn new(shortages: Vec<Shortage>) -> Self {
        Self {
            has_shortage: !shortages.is_empty(),
            shortages,
        }
    }
}

/// Tracks available stock per product and persists it after every change.
///
/// Cloning is cheap; clones share the same catalog.
pub struct StockLedger<S: KeyValueStore> {
    store: S,
    catalog: Arc<RwLock<Catalog>>,
}

impl<S: KeyValueStore + Clone> Clone for StockLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<S: KeyValueStore> StockLedger<S> {
    /// Creates a ledger over `catalog` without reading persisted stock.
    pub fn new(store: S, catalog: Catalog) -> Self {
        Self {
            store,
            catalog: Arc::new(RwLock::new(catalog)),
        }
    }

    /// Creates a ledger and overlays any persisted stock onto `catalog`.
    pub async fn load(store: S, catalog: Catalog) -> Result<Self, DomainError> {
        let ledger = Self::new(store, catalog);
        ledger.load_persisted().await?;
        Ok(ledger)
    }

    /// Overlays persisted stock by product id.
    ///
    /// A malformed blob is logged and ignored, leaving the defaults in place.
    #[tracing::instrument(skip(self))]
    pub async fn load_persisted(&self) -> Result<usize, DomainError> {
        let records: Option<Vec<StockRecord>> = self.store.load_json(keys::CATALOG_STOCK).await?;
        let Some(records) = records else {
            return Ok(0);
        };

        let applied = self.catalog.write().await.overlay_stock(&records);
        tracing::info!(applied, "loaded persisted stock");
        Ok(applied)
    }

    /// Returns the current stock of a product, or 0 for an unknown id.
    pub async fn stock_of(&self, product_id: ProductId) -> u32 {
        self.catalog
            .read()
            .await
            .get(product_id)
            .map_or(0, |p| p.stock)
    }

    /// Returns true if at least `quantity` units are in stock.
    pub async fn has_enough(&self, product_id: ProductId, quantity: u32) -> bool {
        match self.catalog.read().await.get(product_id) {
            Some(product) => product.stock >= quantity,
            None => false,
        }
    }

    /// Takes `quantity` units out of stock, clamping at zero.
    ///
    /// An unknown id is ignored and nothing is persisted.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<(), DomainError> {
        let mut catalog = self.catalog.write().await;
        let Some(product) = catalog.get_mut(product_id) else {
            tracing::debug!(%product_id, "reserve on unknown product ignored");
            return Ok(());
        };
        product.stock = product.stock.saturating_sub(quantity);
        self.persist(&catalog).await
    }

    /// Puts `quantity` units back into stock.
    ///
    /// There is no upper bound; stock may exceed its starting value.
    #[tracing::instrument(skip(self))]
    pub async fn release(&self, product_id: ProductId, quantity: u32) -> Result<(), DomainError> {
        let mut catalog = self.catalog.write().await;
        let Some(product) = catalog.get_mut(product_id) else {
            tracing::debug!(%product_id, "release on unknown product ignored");
            return Ok(());
        };
        product.stock = product.stock.saturating_add(quantity);
        self.persist(&catalog).await
    }

    /// Puts several lines back into stock with a single write.
    #[tracing::instrument(skip(self, lines))]
    pub async fn release_all<I>(&self, lines: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = (ProductId, u32)>,
    {
        let mut catalog = self.catalog.write().await;
        let mut changed = false;
        for (product_id, quantity) in lines {
            if let Some(product) = catalog.get_mut(product_id) {
                product.stock = product.stock.saturating_add(quantity);
                changed = true;
            }
        }
        if changed {
            self.persist(&catalog).await?;
        }
        Ok(())
    }

    /// Reports every line whose quantity exceeds current stock.
    pub async fn shortfall<'a, I>(&self, lines: I) -> ShortfallReport
    where
        I: IntoIterator<Item = (ProductId, &'a str, u32)>,
    {
        let catalog = self.catalog.read().await;
        let shortages = lines
            .into_iter()
            .filter_map(|(product_id, name, requested)| {
                let available = catalog.get(product_id).map_or(0, |p| p.stock);
                (requested > available).then(|| Shortage {
                    product_id,
                    name: name.to_string(),
                    requested,
                    available,
                })
            })
            .collect();
        ShortfallReport::new(shortages)
    }

    /// Returns a snapshot of every product.
    pub async fn products(&self) -> Vec<Product> {
        self.catalog.read().await.products().to_vec()
    }

    /// Returns a snapshot of a single product.
    pub async fn product(&self, product_id: ProductId) -> Option<Product> {
        self.catalog.read().await.get(product_id).cloned()
    }

    /// Searches the catalog by name, optionally within a category.
    pub async fn search(&self, term: &str, category: Option<Category>) -> Vec<Product> {
        self.catalog
            .read()
            .await
            .search(term, category)
            .into_iter()
            .cloned()
            .collect()
    }

    async fn persist(&self, catalog: &Catalog) -> Result<(), DomainError> {
        self.store
            .set_json(keys::CATALOG_STOCK, catalog.products())
            .await?;
        Ok(())
    }
}
