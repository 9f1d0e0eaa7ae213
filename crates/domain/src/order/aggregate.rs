//! Order entity and its receipt view.

use chrono::{DateTime, SubsecRound, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};

use super::{OrderError, OrderStatus};
use crate::cart::{CartError, CartLine};
use crate::value_objects::{DiscountPercent, Money};

/// A product line frozen into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub quantity: u32,
}

impl OrderLine {
    /// Creates an order line.
    pub fn new(product_id: ProductId, product_name: impl Into<String>, price: Money, quantity: u32) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            price,
            quantity,
        }
    }

    /// Returns price times quantity.
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self::new(
            line.product.id,
            line.product.name.clone(),
            line.product.price,
            line.quantity,
        )
    }
}

/// A finalized order.
///
/// Everything except `status` and `notes` is fixed at checkout. The serialized
/// field names match the persisted order blobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    #[serde(with = "common::timestamp")]
    date: DateTime<Utc>,
    customer_name: String,
    #[serde(default)]
    customer_address: String,
    #[serde(default)]
    vendor_name: String,
    #[serde(rename = "items")]
    lines: Vec<OrderLine>,
    #[serde(rename = "total", alias = "subtotal")]
    subtotal: Money,
    #[serde(default)]
    discount: DiscountPercent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_total: Option<Money>,
    #[serde(default)]
    status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl Order {
    /// Creates a new order builder.
    pub fn builder() -> OrderBuilder {
        OrderBuilder::default()
    }

    /// Checks checkout preconditions and freezes cart lines into a new order.
    ///
    /// The order starts `Pending`, stamped with `now`.
    pub fn checkout(
        lines: &[CartLine],
        customer_name: &str,
        customer_address: &str,
        vendor_name: &str,
        discount: DiscountPercent,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Order, CartError> {
        if lines.is_empty() {
            return Err(CartError::EmptyCart);
        }
        if customer_name.trim().is_empty() {
            return Err(CartError::CustomerNameRequired);
        }

        Ok(Order::builder()
            .date(now)
            .customer_name(customer_name.trim())
            .customer_address(customer_address.trim())
            .vendor_name(vendor_name)
            .lines(lines.iter().map(OrderLine::from))
            .discount(discount)
            .notes(notes)
            .build())
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_address(&self) -> &str {
        &self.customer_address
    }

    pub fn vendor_name(&self) -> &str {
        &self.vendor_name
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discount(&self) -> DiscountPercent {
        self.discount
    }

    /// Returns the amount taken off the subtotal.
    pub fn discount_amount(&self) -> Money {
        self.subtotal - self.final_total()
    }

    /// Returns the charged total.
    ///
    /// Older persisted orders may lack it; those fall back to the subtotal.
    pub fn final_total(&self) -> Money {
        self.final_total.unwrap_or(self.subtotal)
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns true while the order is in the pending queue.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Returns the total number of units across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Case-insensitive substring match on customer or product names.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.customer_name.to_lowercase().contains(&term)
            || self
                .lines
                .iter()
                .any(|l| l.product_name.to_lowercase().contains(&term))
    }

    /// Moves the order to `next`, replacing notes when given.
    pub(crate) fn transition(
        &mut self,
        next: OrderStatus,
        notes: Option<String>,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStateTransition {
                current: self.status,
                requested: next,
            });
        }
        self.status = next;
        if let Some(notes) = notes {
            self.notes = Some(notes);
        }
        Ok(())
    }

    /// Marks an open order whose pending entry is gone as delivered.
    pub(crate) fn close_as_delivered(&mut self) {
        if self.is_open() {
            self.status = OrderStatus::Delivered;
        }
    }

    /// Overwrites status and notes from a pending-queue entry.
    pub(crate) fn adopt_progress(&mut self, other: &Order) {
        self.status = other.status;
        if other.notes.is_some() {
            self.notes.clone_from(&other.notes);
        }
    }

    /// Builds the printable receipt for this order.
    pub fn receipt(&self) -> Receipt {
        let discount = (!self.discount.is_zero()).then(|| ReceiptDiscount {
            percent: self.discount,
            amount: self.discount_amount(),
        });

        Receipt {
            order_id: self.id,
            date: self.date,
            customer_name: self.customer_name.clone(),
            customer_address: self.customer_address.clone(),
            vendor_name: self.vendor_name.clone(),
            lines: self
                .lines
                .iter()
                .map(|l| ReceiptLine {
                    product_name: l.product_name.clone(),
                    price: l.price,
                    quantity: l.quantity,
                    line_total: l.line_total(),
                })
                .collect(),
            subtotal: self.subtotal,
            discount,
            final_total: self.final_total(),
            status: self.status,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }
}

/// Builder for constructing orders.
///
/// Subtotal and final total are computed from the lines and discount.
#[derive(Debug, Default)]
pub struct OrderBuilder {
    id: Option<OrderId>,
    date: Option<DateTime<Utc>>,
    customer_name: String,
    customer_address: String,
    vendor_name: String,
    lines: Vec<OrderLine>,
    discount: DiscountPercent,
    status: OrderStatus,
    notes: Option<String>,
}

impl OrderBuilder {
    /// Sets the order ID. If not set, a new ID will be generated.
    pub fn id(mut self, id: OrderId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the order date. If not set, the current time will be used.
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = name.into();
        self
    }

    pub fn customer_address(mut self, address: impl Into<String>) -> Self {
        self.customer_address = address.into();
        self
    }

    pub fn vendor_name(mut self, name: impl Into<String>) -> Self {
        self.vendor_name = name.into();
        self
    }

    /// Appends a single line.
    pub fn line(mut self, line: OrderLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Appends several lines.
    pub fn lines(mut self, lines: impl IntoIterator<Item = OrderLine>) -> Self {
        self.lines.extend(lines);
        self
    }

    pub fn discount(mut self, discount: DiscountPercent) -> Self {
        self.discount = discount;
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the notes. Blank notes are dropped.
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// Builds the order.
    ///
    /// The date is truncated to milliseconds, the precision it is stored at.
    pub fn build(self) -> Order {
        let subtotal: Money = self.lines.iter().map(OrderLine::line_total).sum();
        let final_total = subtotal - subtotal.percent(self.discount);

        Order {
            id: self.id.unwrap_or_default(),
            date: self.date.unwrap_or_else(Utc::now).trunc_subsecs(3),
            customer_name: self.customer_name,
            customer_address: self.customer_address,
            vendor_name: self.vendor_name,
            lines: self.lines,
            subtotal,
            discount: self.discount,
            final_total: Some(final_total),
            status: self.status,
            notes: self.notes,
        }
    }
}

/// A receipt line with its computed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_name: String,
    pub price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// Discount shown on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptDiscount {
    pub percent: DiscountPercent,
    pub amount: Money,
}

/// The data printed on a customer receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub order_id: OrderId,
    #[serde(with = "common::timestamp")]
    pub date: DateTime<Utc>,
    pub customer_name: String,
    pub customer_address: String,
    pub vendor_name: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<ReceiptDiscount>,
    pub final_total: Money,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::Product;

    fn percent(n: i64) -> DiscountPercent {
        DiscountPercent::new(Decimal::from(n)).unwrap()
    }

    fn cart_lines() -> Vec<CartLine> {
        vec![
            CartLine {
                product: Product::new(1, "Nueces Peladas", 3500, 50),
                quantity: 2,
            },
            CartLine {
                product: Product::new(6, "Maní Tostado", 2200, 100),
                quantity: 1,
            },
        ]
    }

    #[test]
    fn test_checkout_computes_totals() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let order = Order::checkout(&cart_lines(), " Ana ", "", "Luis", percent(10), None, now)
            .unwrap();

        assert_eq!(order.subtotal(), Money::from_units(9200));
        assert_eq!(order.final_total(), Money::from_units(8280));
        assert_eq!(order.discount_amount(), Money::from_units(920));
        assert_eq!(order.customer_name(), "Ana");
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.date(), now);
        assert_eq!(order.item_count(), 3);
    }

    #[test]
    fn test_checkout_discount_bounds() {
        let now = Utc::now();
        let free = Order::checkout(&cart_lines(), "Ana", "", "Luis", percent(100), None, now)
            .unwrap();
        assert_eq!(free.final_total(), Money::zero());

        let full = Order::checkout(&cart_lines(), "Ana", "", "Luis", percent(0), None, now)
            .unwrap();
        assert_eq!(full.final_total(), full.subtotal());
    }

    #[test]
    fn test_checkout_preconditions() {
        let now = Utc::now();
        assert_eq!(
            Order::checkout(&[], "Ana", "", "Luis", DiscountPercent::NONE, None, now),
            Err(CartError::EmptyCart)
        );
        assert_eq!(
            Order::checkout(&cart_lines(), "   ", "", "Luis", DiscountPercent::NONE, None, now),
            Err(CartError::CustomerNameRequired)
        );
    }

    #[test]
    fn test_transition_keeps_notes_unless_replaced() {
        let mut order = Order::builder()
            .customer_name("Ana")
            .notes(Some("timbre roto".to_string()))
            .build();

        order.transition(OrderStatus::Preparing, None).unwrap();
        assert_eq!(order.notes(), Some("timbre roto"));

        order
            .transition(OrderStatus::Ready, Some("dejar en portería".to_string()))
            .unwrap();
        assert_eq!(order.notes(), Some("dejar en portería"));

        let err = order.transition(OrderStatus::Pending, None).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidStateTransition {
                current: OrderStatus::Ready,
                requested: OrderStatus::Pending
            }
        ));
    }

    #[test]
    fn test_matches_customer_or_product() {
        let order = Order::builder()
            .customer_name("Ana López")
            .line(OrderLine::new(ProductId::new(4), "Pistachos", Money::from_units(5000), 1))
            .build();

        assert!(order.matches("lópez"));
        assert!(order.matches("PISTA"));
        assert!(order.matches(""));
        assert!(!order.matches("almendras"));
    }

    #[test]
    fn test_receipt_omits_zero_discount_and_blank_notes() {
        let order = Order::builder()
            .customer_name("Ana")
            .line(OrderLine::new(ProductId::new(2), "Almendras", Money::from_units(4200), 2))
            .notes(Some("   ".to_string()))
            .build();

        let receipt = order.receipt();
        assert!(receipt.discount.is_none());
        assert!(receipt.notes.is_none());
        assert_eq!(receipt.lines[0].line_total, Money::from_units(8400));

        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("discount").is_none());
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_receipt_includes_discount() {
        let order = Order::builder()
            .customer_name("Ana")
            .line(OrderLine::new(ProductId::new(2), "Almendras", Money::from_units(4200), 1))
            .discount(percent(15))
            .notes(Some("sin sal".to_string()))
            .build();

        let receipt = order.receipt();
        let discount = receipt.discount.unwrap();
        assert_eq!(discount.amount, Money::from_units(630));
        assert_eq!(receipt.final_total, Money::from_units(3570));
        assert_eq!(receipt.notes.as_deref(), Some("sin sal"));
    }

    #[test]
    fn test_persisted_shape_uses_legacy_field_names() {
        let order = Order::builder()
            .customer_name("Ana")
            .line(OrderLine::new(ProductId::new(2), "Almendras", Money::from_units(4200), 1))
            .build();
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["items"][0]["productName"], "Almendras");
        assert_eq!(json["total"], 4200);
        assert_eq!(json["finalTotal"], 4200);
        assert_eq!(json["discount"], 0);
        assert_eq!(json["status"], "pending");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_legacy_order_without_final_total_loads() {
        let raw = r#"{
            "id": "6f1c5a2e-8a6b-4a8e-9d0e-2b7f6d1f9a11",
            "date": "2024-05-01T12:00:00.000Z",
            "customerName": "Ana",
            "items": [{"productId": 1, "productName": "Nueces Peladas", "price": 3500, "quantity": 2}],
            "total": 7000,
            "discount": 0,
            "status": "entregado"
        }"#;

        let order: Order = serde_json::from_str(raw).unwrap();
        assert_eq!(order.final_total(), Money::from_units(7000));
        assert_eq!(order.status(), OrderStatus::Delivered);
        assert_eq!(order.vendor_name(), "");
    }
}
