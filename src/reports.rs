//! Back-office sales reports, computed over order snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderStatus, PaymentStatus, Product};

/// Creation-time window; either end may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Parse query bounds. A bare `YYYY-MM-DD` end date covers that whole day.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, &'static str> {
        let start = non_empty(start).map(|s| parse_bound(s, false)).transpose().map_err(|()| "Invalid startDate")?;
        let end = non_empty(end).map(|s| parse_bound(s, true)).transpose().map_err(|()| "Invalid endDate")?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| at >= s) && self.end.map_or(true, |e| at <= e)
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, ()> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ())?;
    let at = if end_of_day {
        // Last instant of the day: start of the next one minus a nanosecond
        day.checked_add_days(Days::new(1)).ok_or(())?.and_time(NaiveTime::MIN) - chrono::Duration::nanoseconds(1)
    } else {
        day.and_time(NaiveTime::MIN)
    };
    Ok(at.and_utc())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusRevenue {
    #[serde(rename = "being processed", with = "rust_decimal::serde::float")]
    pub being_processed: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipped: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivered: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub total_orders: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_order_value: Decimal,
    pub status_breakdown: StatusRevenue,
}

/// Revenue over paid orders created inside `range`.
pub fn financial(orders: &[Order], range: DateRange) -> FinancialReport {
    let mut total_revenue = Decimal::ZERO;
    let mut total_orders = 0;
    let mut breakdown = StatusRevenue::default();

    for order in orders.iter().filter(|o| o.is_paid() && range.contains(o.created_at())) {
        let amount = order.total_amount().amount();
        total_revenue += amount;
        total_orders += 1;
        match order.status() {
            OrderStatus::BeingProcessed => breakdown.being_processed += amount,
            OrderStatus::Shipped => breakdown.shipped += amount,
            OrderStatus::Delivered => breakdown.delivered += amount,
            OrderStatus::Pending | OrderStatus::Cancelled => {}
        }
    }

    let average_order_value = if total_orders == 0 {
        Decimal::ZERO
    } else {
        (total_revenue / Decimal::from(total_orders)).round_dp(2)
    };

    FinancialReport { total_revenue, total_orders, average_order_value, status_breakdown: breakdown }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatistics {
    pub total_orders: usize,
    pub by_status: HashMap<&'static str, usize>,
    pub by_payment_status: HashMap<&'static str, usize>,
}

/// Order counts per fulfilment and payment status. Every status is listed, zero or not.
pub fn order_statistics(orders: &[Order]) -> OrderStatistics {
    let mut by_status: HashMap<&'static str, usize> = OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    let mut by_payment_status: HashMap<&'static str, usize> =
        PaymentStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();

    for order in orders {
        *by_status.entry(order.status().as_str()).or_default() += 1;
        *by_payment_status.entry(order.payment_status().as_str()).or_default() += 1;
    }

    OrderStatistics { total_orders: orders.len(), by_status, by_payment_status }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    pub product_id: Uuid,
    pub name: String,
    pub total_quantity: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_revenue: Decimal,
    pub order_count: usize,
    /// Zero when the product has been deleted since.
    pub current_stock: u32,
}

/// Sales per product over paid orders, best earners first.
pub fn product_performance(orders: &[Order], products: &[Product]) -> Vec<ProductPerformance> {
    let mut rows: Vec<ProductPerformance> = Vec::new();
    let mut index: HashMap<Uuid, usize> = HashMap::new();

    for order in orders.iter().filter(|o| o.is_paid()) {
        for item in order.items() {
            let at = *index.entry(item.product_id).or_insert_with(|| {
                rows.push(ProductPerformance {
                    product_id: item.product_id,
                    name: item.name.clone(),
                    total_quantity: 0,
                    total_revenue: Decimal::ZERO,
                    order_count: 0,
                    current_stock: 0,
                });
                rows.len() - 1
            });
            let row = &mut rows[at];
            row.total_quantity += u64::from(item.quantity);
            row.total_revenue += item.line_total().amount();
            row.order_count += 1;
        }
    }

    let stock: HashMap<Uuid, u32> = products.iter().map(|p| (p.id(), p.stock().value())).collect();
    for row in &mut rows {
        row.current_stock = stock.get(&row.product_id).copied().unwrap_or(0);
    }
    rows.sort_by(|a, b| b.total_revenue.cmp(&a.total_revenue));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderItem;
    use crate::domain::payment::GatewayReport;
    use crate::domain::value_objects::{Money, Quantity};

    fn product(name: &str, price: i64, stock: u32) -> Product {
        Product::create(name, "patch", Money::idr(Decimal::new(price, 0)), Quantity::new(stock)).unwrap()
    }

    fn order(lines: &[(&Product, u32)], paid: bool) -> Order {
        let items = lines
            .iter()
            .map(|(p, qty)| OrderItem {
                product_id: p.id(),
                name: p.name().to_string(),
                price: p.price().clone(),
                quantity: *qty,
                image: None,
            })
            .collect();
        let mut order = Order::place(Uuid::new_v4(), items, "").unwrap();
        if paid {
            order.apply_report(&GatewayReport::new("settlement", None));
        }
        order
    }

    #[test]
    fn test_financial_counts_only_paid() {
        let classic = product("Classic", 45_000, 10);
        let mut shipped = order(&[(&classic, 2)], true);
        shipped.set_status(OrderStatus::Shipped);
        let orders = vec![order(&[(&classic, 1)], true), shipped, order(&[(&classic, 5)], false)];

        let report = financial(&orders, DateRange::default());
        assert_eq!(report.total_orders, 2);
        assert_eq!(report.total_revenue, Decimal::new(135_000, 0));
        assert_eq!(report.average_order_value, Decimal::new(67_500, 0));
        assert_eq!(report.status_breakdown.being_processed, Decimal::new(45_000, 0));
        assert_eq!(report.status_breakdown.shipped, Decimal::new(90_000, 0));
        assert_eq!(report.status_breakdown.delivered, Decimal::ZERO);
    }

    #[test]
    fn test_financial_empty() {
        let report = financial(&[], DateRange::default());
        assert_eq!(report.total_orders, 0);
        assert_eq!(report.average_order_value, Decimal::ZERO);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["statusBreakdown"].get("being processed").is_some());
    }

    #[test]
    fn test_date_range_end_is_inclusive() {
        let range = DateRange::parse(Some("2026-01-01"), Some("2026-01-31")).unwrap();
        let last_evening = DateTime::parse_from_rfc3339("2026-01-31T23:30:00Z").unwrap().with_timezone(&Utc);
        let next_day = DateTime::parse_from_rfc3339("2026-02-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let before = DateTime::parse_from_rfc3339("2025-12-31T23:59:59Z").unwrap().with_timezone(&Utc);
        assert!(range.contains(last_evening));
        assert!(!range.contains(next_day));
        assert!(!range.contains(before));
        assert_eq!(DateRange::parse(Some(""), None).unwrap(), DateRange::default());
        assert_eq!(DateRange::parse(Some("yesterday"), None), Err("Invalid startDate"));
    }

    #[test]
    fn test_order_statistics_lists_every_status() {
        let classic = product("Classic", 45_000, 10);
        let mut cancelled = order(&[(&classic, 1)], false);
        cancelled.cancel().unwrap();
        let stats = order_statistics(&[order(&[(&classic, 1)], true), cancelled]);
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.by_status["being processed"], 1);
        assert_eq!(stats.by_status["cancelled"], 1);
        assert_eq!(stats.by_status["delivered"], 0);
        assert_eq!(stats.by_payment_status["paid"], 1);
        assert_eq!(stats.by_payment_status["cancelled"], 1);
        assert_eq!(stats.by_payment_status["failed"], 0);
    }

    #[test]
    fn test_product_performance_sorted_by_revenue() {
        let classic = product("Classic", 45_000, 10);
        let sport = product("Sport", 60_000, 3);
        let orders = vec![
            order(&[(&classic, 1), (&sport, 2)], true),
            order(&[(&classic, 1)], true),
            order(&[(&classic, 9)], false),
        ];
        let rows = product_performance(&orders, &[classic.clone()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Sport");
        assert_eq!(rows[0].total_revenue, Decimal::new(120_000, 0));
        assert_eq!(rows[0].current_stock, 0);
        assert_eq!(rows[1].total_quantity, 2);
        assert_eq!(rows[1].order_count, 2);
        assert_eq!(rows[1].current_stock, 10);
    }
}
