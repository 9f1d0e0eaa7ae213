//! CSV export of the product rollup.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::stats::Stats;

const HEADER: &str = "Product,UnitsSold,Revenue,PercentOfTotal";

/// Renders the product rollup as CSV, one row per product in rollup order.
///
/// Product names are always quoted. Percentages carry one decimal place and
/// a trailing `%`, or read `0%` when there is no revenue.
pub fn products_csv(stats: &Stats) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + stats.products.len() * 48);
    out.push_str(HEADER);
    out.push('\n');

    for product in &stats.products {
        let percent = if stats.total_revenue.is_zero() {
            "0".to_string()
        } else {
            product.percent_of_total.to_string()
        };
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{},{},{},{}%",
            quote(&product.name),
            product.units_sold,
            product.revenue.amount().normalize(),
            percent
        );
    }
    out
}

/// Download file name for an export made on `date`.
pub fn products_csv_filename(date: NaiveDate) -> String {
    format!("product-stats_{}.csv", date.format("%Y-%m-%d"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
