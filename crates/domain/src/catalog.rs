//! The fixed product catalog.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// Products with less stock than this are flagged as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// A product offered by the store.
///
/// Products are never created or destroyed at runtime; only `stock` changes,
/// and only through the [`StockLedger`](crate::StockLedger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub stock: u32,
}

impl Product {
    /// Creates a product with a whole-unit price.
    pub fn new(id: u32, name: impl Into<String>, price: i64, stock: u32) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            price: Money::from_units(price),
            stock,
        }
    }

    /// Returns true if the product is running low.
    pub fn is_low_stock(&self) -> bool {
        self.stock < LOW_STOCK_THRESHOLD
    }

    /// Returns true if at least one unit is in stock.
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }

    /// Case-insensitive substring match on the product name.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty() || self.name.to_lowercase().contains(&term)
    }
}

/// Catalog section a product is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Nuts,
    Dried,
    Seeds,
    Mixes,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 4] = [
        Category::Nuts,
        Category::Dried,
        Category::Seeds,
        Category::Mixes,
    ];

    /// Returns the ids of the products listed in this category.
    pub fn product_ids(&self) -> &'static [u32] {
        match self {
            Category::Nuts => &[1, 2, 3, 4, 5, 6],
            Category::Dried => &[8, 9, 10, 11, 12],
            Category::Seeds => &[14, 15, 16, 17],
            Category::Mixes => &[7, 13, 18],
        }
    }

    /// Returns true if the product is listed in this category.
    pub fn contains(&self, id: ProductId) -> bool {
        self.product_ids().contains(&id.get())
    }

    /// Returns the category a product is listed under.
    pub fn of(id: ProductId) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.contains(id))
    }

    /// Returns the category name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Nuts => "nuts",
            Category::Dried => "dried",
            Category::Seeds => "seeds",
            Category::Mixes => "mixes",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Persisted stock entry. Only `id` and `stock` are read back.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StockRecord {
    pub id: ProductId,
    pub stock: u32,
}

/// The product catalog, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Creates a catalog from a list of products.
    pub fn new(mut products: Vec<Product>) -> Self {
        products.sort_by_key(|p| p.id);
        products.dedup_by_key(|p| p.id);
        Self { products }
    }

    /// The store's eighteen products with their default stock.
    pub fn standard() -> Self {
        Self::new(vec![
            Product::new(1, "Nueces Peladas", 3500, 50),
            Product::new(2, "Almendras", 4200, 45),
            Product::new(3, "Castañas de Cajú", 3800, 30),
            Product::new(4, "Pistachos", 5000, 25),
            Product::new(5, "Avellanas", 4500, 35),
            Product::new(6, "Maní Tostado", 2200, 100),
            Product::new(7, "Mix Tropical", 3900, 40),
            Product::new(8, "Pasas de Uva", 2800, 60),
            Product::new(9, "Arándanos Secos", 4100, 20),
            Product::new(10, "Dátiles", 3600, 30),
            Product::new(11, "Higos Secos", 3300, 25),
            Product::new(12, "Ciruelas Pasas", 2900, 40),
            Product::new(13, "Mix Energético", 4300, 35),
            Product::new(14, "Semillas de Girasol", 2500, 70),
            Product::new(15, "Semillas de Calabaza", 2700, 55),
            Product::new(16, "Semillas de Chía", 3100, 45),
            Product::new(17, "Semillas de Lino", 2400, 50),
            Product::new(18, "Mix Premium", 4800, 30),
        ])
    }

    /// Returns all products.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Returns the number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns true if the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Looks up a product by id.
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|idx| &self.products[idx])
    }

    pub(crate) fn get_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        self.products
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(move |idx| &mut self.products[idx])
    }

    /// Products whose name contains `term`, optionally restricted to a category.
    pub fn search(&self, term: &str, category: Option<Category>) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| category.is_none_or(|c| c.contains(p.id)))
            .filter(|p| p.matches(term))
            .collect()
    }

    /// Products currently running low on stock.
    pub fn low_stock(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_low_stock()).collect()
    }

    /// Overwrites stock from persisted records, matching by id.
    ///
    /// Unknown ids are skipped. Returns the number of products updated.
    pub(crate) fn overlay_stock(&mut self, records: &[StockRecord]) -> usize {
        let mut applied = 0;
        for record in records {
            if let Some(product) = self.get_mut(record.id) {
                product.stock = record.stock;
                applied += 1;
            }
        }
        applied
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
