//! Sales statistics rolled up from the order history.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, TimeZone};
use common::ProductId;
use domain::{Money, Order, OrderStatus};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::period::TimeFilter;

/// Label used for orders without a vendor name.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Sales of one product over the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStat {
    pub product_id: ProductId,
    pub name: String,
    pub units_sold: u64,
    /// Σ price × quantity, before order discounts.
    pub revenue: Money,
    /// Share of total revenue in percent, one decimal place.
    pub percent_of_total: Decimal,
}

/// Sales by one vendor over the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorStat {
    pub name: String,
    pub units_sold: u64,
    /// Σ order final totals.
    pub revenue: Money,
    pub order_count: u64,
    pub percent_of_total: Decimal,
}

/// Statistics for one reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub period: TimeFilter,
    pub total_revenue: Money,
    pub total_orders: u64,
    pub total_customers: u64,
    pub average_ticket: Money,
    /// Sorted by revenue, highest first.
    pub products: Vec<ProductStat>,
    /// Sorted by revenue, highest first.
    pub vendors: Vec<VendorStat>,
}

/// Rolls `history` up into statistics for `filter`.
///
/// Cancelled orders are left out. Rows with equal revenue keep the order in
/// which they were first seen in `history`.
#[tracing::instrument(skip(history, now), fields(orders = history.len()))]
pub fn compute_stats<Tz: TimeZone>(
    history: &[Order],
    filter: TimeFilter,
    now: &DateTime<Tz>,
) -> Stats {
    let orders: Vec<&Order> = history
        .iter()
        .filter(|o| o.status() != OrderStatus::Cancelled)
        .filter(|o| filter.contains(o.date(), now))
        .collect();

    let total_revenue: Money = orders.iter().map(|o| o.final_total()).sum();
    let total_orders = orders.len() as u64;
    let total_customers = orders
        .iter()
        .map(|o| o.customer_name().trim().to_lowercase())
        .collect::<HashSet<_>>()
        .len() as u64;
    let average_ticket = total_revenue.average_over(orders.len());

    let mut products = product_rollup(&orders, total_revenue);
    products.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    let mut vendors = vendor_rollup(&orders, total_revenue);
    vendors.sort_by(|a, b| b.revenue.cmp(&a.revenue));

    metrics::counter!("stats_computed_total", "period" => filter.as_str()).increment(1);

    Stats {
        period: filter,
        total_revenue,
        total_orders,
        total_customers,
        average_ticket,
        products,
        vendors,
    }
}

fn percent_of(part: Money, total: Money) -> Decimal {
    part.share_of(total).unwrap_or(Decimal::ZERO)
}

fn product_rollup(orders: &[&Order], total_revenue: Money) -> Vec<ProductStat> {
    let mut index: HashMap<ProductId, usize> = HashMap::new();
    let mut rows: Vec<ProductStat> = Vec::new();

    for line in orders.iter().flat_map(|o| o.lines()) {
        let idx = *index.entry(line.product_id).or_insert_with(|| {
            rows.push(ProductStat {
                product_id: line.product_id,
                name: line.product_name.clone(),
                units_sold: 0,
                revenue: Money::zero(),
                percent_of_total: Decimal::ZERO,
            });
            rows.len() - 1
        });
        let row = &mut rows[idx];
        row.units_sold += u64::from(line.quantity);
        row.revenue += line.line_total();
    }

    for row in &mut rows {
        row.percent_of_total = percent_of(row.revenue, total_revenue);
    }
    rows
}

fn vendor_rollup(orders: &[&Order], total_revenue: Money) -> Vec<VendorStat> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<VendorStat> = Vec::new();

    for order in orders {
        let name = match order.vendor_name().trim() {
            "" => UNKNOWN_VENDOR,
            name => name,
        };
        let idx = *index.entry(name.to_string()).or_insert_with(|| {
            rows.push(VendorStat {
                name: name.to_string(),
                units_sold: 0,
                revenue: Money::zero(),
                order_count: 0,
                percent_of_total: Decimal::ZERO,
            });
            rows.len() - 1
        });
        let row = &mut rows[idx];
        row.units_sold += u64::from(order.item_count());
        row.revenue += order.final_total();
        row.order_count += 1;
    }

    for row in &mut rows {
        row.percent_of_total = percent_of(row.revenue, total_revenue);
    }
    rows
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use domain::{DiscountPercent, OrderLine};

    use super::*;

    fn line(product: u32, name: &str, price: i64, quantity: u32) -> OrderLine {
        OrderLine::new(ProductId::new(product), name, Money::from_units(price), quantity)
    }

    #[test]
    fn test_empty_history() {
        let stats = compute_stats(&[], TimeFilter::All, &Utc::now());

        assert_eq!(stats.total_revenue, Money::zero());
        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.average_ticket, Money::zero());
        assert!(stats.products.is_empty());
        assert!(stats.vendors.is_empty());
    }

    #[test]
    fn test_revenue_uses_discounted_total() {
        let order = Order::builder()
            .customer_name("Ana")
            .vendor_name("Luis")
            .line(line(1, "Nueces Peladas", 1000, 2))
            .discount(DiscountPercent::new(Decimal::from(50)).unwrap())
            .build();

        let stats = compute_stats(&[order], TimeFilter::All, &Utc::now());

        assert_eq!(stats.total_revenue, Money::from_units(1000));
        assert_eq!(stats.products[0].revenue, Money::from_units(2000));
        assert_eq!(stats.products[0].percent_of_total.to_string(), "200.0");
        assert_eq!(stats.vendors[0].revenue, Money::from_units(1000));
    }

    #[test]
    fn test_cancelled_orders_are_excluded() {
        let kept = Order::builder()
            .customer_name("Ana")
            .line(line(1, "Nueces Peladas", 100, 1))
            .build();
        let cancelled = Order::builder()
            .customer_name("Luis")
            .line(line(2, "Almendras", 100, 1))
            .status(OrderStatus::Cancelled)
            .build();

        let stats = compute_stats(&[kept, cancelled], TimeFilter::All, &Utc::now());

        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.products.len(), 1);
    }

    #[test]
    fn test_unknown_vendor_label() {
        let order = Order::builder()
            .customer_name("Ana")
            .vendor_name("  ")
            .line(line(1, "Nueces Peladas", 100, 3))
            .build();

        let stats = compute_stats(&[order], TimeFilter::All, &Utc::now());

        assert_eq!(stats.vendors[0].name, UNKNOWN_VENDOR);
        assert_eq!(stats.vendors[0].units_sold, 3);
        assert_eq!(stats.vendors[0].order_count, 1);
        assert_eq!(stats.vendors[0].percent_of_total.to_string(), "100.0");
    }

    #[test]
    fn test_rollups_sorted_by_revenue_with_stable_ties() {
        let now = Utc::now();
        let orders = vec![
            Order::builder()
                .customer_name("Ana")
                .vendor_name("Luis")
                .date(now - Duration::minutes(1))
                .line(line(2, "Almendras", 100, 1))
                .line(line(3, "Castañas de Cajú", 100, 1))
                .build(),
            Order::builder()
                .customer_name("Eva")
                .vendor_name("Marta")
                .date(now - Duration::minutes(2))
                .line(line(4, "Pistachos", 500, 1))
                .build(),
        ];

        let stats = compute_stats(&orders, TimeFilter::All, &now);

        let ids: Vec<_> = stats.products.iter().map(|p| p.product_id.get()).collect();
        assert_eq!(ids, vec![4, 2, 3]);
        let vendors: Vec<_> = stats.vendors.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(vendors, vec!["Marta", "Luis"]);
    }

    #[test]
    fn test_average_ticket() {
        let orders: Vec<_> = [100, 200, 400]
            .into_iter()
            .map(|price| {
                Order::builder()
                    .customer_name("Ana")
                    .line(line(1, "Nueces Peladas", price, 1))
                    .build()
            })
            .collect();

        let stats = compute_stats(&orders, TimeFilter::All, &Utc::now());

        assert_eq!(stats.total_customers, 1);
        assert_eq!(stats.average_ticket, Money::new(Decimal::new(23333, 2)));
    }
}
