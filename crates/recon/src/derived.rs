//! Views layered on top of a computed snapshot: movement trend, stock
//! ranking, and line search.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::model::{InventoryLine, TrendPoint, TransactionRecord};

/// Daily inbound vs outbound totals, ascending by date. Undated
/// transactions are left out.
pub fn movement_trend(inbound: &[TransactionRecord], outbound: &[TransactionRecord]) -> Vec<TrendPoint> {
    let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for t in inbound {
        if let Some(date) = t.date {
            days.entry(date).or_insert((0.0, 0.0)).0 += t.quantity;
        }
    }
    for t in outbound {
        if let Some(date) = t.date {
            days.entry(date).or_insert((0.0, 0.0)).1 += t.quantity;
        }
    }

    days.into_iter()
        .map(|(date, (stock_in, stock_out))| TrendPoint {
            date,
            stock_in,
            stock_out,
        })
        .collect()
}

/// Highest current stock first; ties keep catalog order.
pub fn top_by_stock(lines: &[InventoryLine], n: usize) -> Vec<&InventoryLine> {
    let mut ranked: Vec<&InventoryLine> = lines.iter().collect();
    ranked.sort_by(|a, b| b.current_stock.total_cmp(&a.current_stock));
    ranked.truncate(n);
    ranked
}

/// Case-insensitive substring match on key or name. A blank query matches
/// everything.
pub fn search_lines<'a>(lines: &'a [InventoryLine], query: &str) -> Vec<&'a InventoryLine> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return lines.iter().collect();
    }
    lines
        .iter()
        .filter(|l| l.key.to_lowercase().contains(&needle) || l.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AlertTier;

    fn tx(day: u32, quantity: f64) -> TransactionRecord {
        TransactionRecord {
            key: "K".into(),
            quantity,
            date: NaiveDate::from_ymd_opt(2026, 1, day),
            unit_cost: None,
        }
    }

    fn line(key: &str, name: &str, stock: f64) -> InventoryLine {
        InventoryLine {
            key: key.into(),
            name: name.into(),
            unit: "kg".into(),
            total_in: stock,
            total_out: 0.0,
            current_stock: stock,
            unit_cost: 1.0,
            inventory_value: stock,
            reorder_level: 0.0,
            manual_reorder: false,
            alert_tier: AlertTier::Ok,
            reorder_quantity: 0.0,
        }
    }

    #[test]
    fn trend_merges_both_sides_by_day() {
        let undated = TransactionRecord { date: None, ..tx(1, 99.0) };
        let trend = movement_trend(&[tx(5, 10.0), tx(3, 2.0), tx(5, 1.0), undated], &[tx(4, 7.0), tx(5, 3.0)]);
        let days: Vec<(u32, f64, f64)> = trend
            .iter()
            .map(|p| (chrono::Datelike::day(&p.date), p.stock_in, p.stock_out))
            .collect();
        assert_eq!(days, vec![(3, 2.0, 0.0), (4, 0.0, 7.0), (5, 11.0, 3.0)]);
    }

    #[test]
    fn trend_empty() {
        assert!(movement_trend(&[], &[]).is_empty());
    }

    #[test]
    fn top_by_stock_is_stable() {
        let lines = vec![line("A", "a", 5.0), line("B", "b", 9.0), line("C", "c", 5.0), line("D", "d", -1.0)];
        let top: Vec<&str> = top_by_stock(&lines, 3).iter().map(|l| l.key.as_str()).collect();
        assert_eq!(top, vec!["B", "A", "C"]);
    }

    #[test]
    fn search_by_key_or_name() {
        let lines = vec![line("WHEA01", "Wheat Flour", 1.0), line("PANE04", "Paneer", 1.0)];
        assert_eq!(search_lines(&lines, " flour ").len(), 1);
        assert_eq!(search_lines(&lines, "pane")[0].key, "PANE04");
        assert_eq!(search_lines(&lines, "").len(), 2);
        assert!(search_lines(&lines, "rice").is_empty());
    }
}
