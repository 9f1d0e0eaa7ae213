//! Cart aggregate.

use common::ProductId;
use serde::{Deserialize, Serialize};

use super::CartError;
use crate::catalog::Product;
use crate::value_objects::Money;

/// A product in the cart with the quantity requested.
///
/// `product` is a snapshot taken when the line was first added; its price is
/// the one charged at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    /// Returns the product id.
    pub fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Returns price times quantity.
    pub fn line_total(&self) -> Money {
        self.product.price.multiply(self.quantity)
    }
}

/// The cart being built for the current customer.
///
/// Holds no stock logic of its own; the [`CartService`](super::CartService)
/// reserves and releases stock around every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    customer_name: String,
    customer_address: String,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from persisted parts.
    ///
    /// Lines repeating a product id are merged into the first one.
    pub fn from_parts(
        lines: Vec<CartLine>,
        customer_name: impl Into<String>,
        customer_address: impl Into<String>,
    ) -> Self {
        let mut cart = Self {
            lines: Vec::with_capacity(lines.len()),
            customer_name: customer_name.into(),
            customer_address: customer_address.into(),
        };
        for line in lines.into_iter().filter(|l| l.quantity > 0) {
            cart.add(line.product, line.quantity);
        }
        cart
    }

    /// Validates a requested quantity.
    pub fn validate_quantity(quantity: i64) -> Result<u32, CartError> {
        u32::try_from(quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(CartError::InvalidQuantity { quantity })
    }

    /// Returns the lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns the line for a product, if any.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id() == product_id)
    }

    /// Returns the quantity of a product in the cart.
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |l| l.quantity)
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Σ price × quantity over the line snapshots.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_address(&self) -> &str {
        &self.customer_address
    }

    pub fn set_customer_name(&mut self, name: impl Into<String>) {
        self.customer_name = name.into();
    }

    pub fn set_customer_address(&mut self, address: impl Into<String>) {
        self.customer_address = address.into();
    }

    /// Adds `quantity` of `product`, merging into an existing line.
    ///
    /// A merged line keeps its original product snapshot.
    pub fn add(&mut self, product: Product, quantity: u32) {
        match self
            .lines
            .iter_mut()
            .find(|l| l.product_id() == product.id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine { product, quantity }),
        }
    }

    /// Removes and returns the line for a product.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartLine> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.product_id() == product_id)?;
        Some(self.lines.remove(idx))
    }

    /// Removes and returns every line, leaving customer fields untouched.
    pub fn take_lines(&mut self) -> Vec<CartLine> {
        std::mem::take(&mut self.lines)
    }

    /// Clears the customer name and address.
    pub fn clear_customer(&mut self) {
        self.customer_name.clear();
        self.customer_address.clear();
    }

    /// Returns a serializable view of the cart.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.lines.clone(),
            customer_name: self.customer_name.clone(),
            customer_address: self.customer_address.clone(),
            item_count: self.item_count(),
            total: self.total(),
        }
    }
}

/// Read-only view of the cart handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartLine>,
    pub customer_name: String,
    pub customer_address: String,
    pub item_count: u32,
    pub total: Money,
}
