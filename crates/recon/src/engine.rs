use crate::aggregate::{build_lines, dedupe_catalog};
use crate::classify::{apply_alerts, summarize};
use crate::clean::{clean_catalog, clean_transactions};
use crate::config::StockConfig;
use crate::derived::movement_trend;
use crate::error::StockError;
use crate::metrics::compute_metrics;
use crate::model::{IntakeReport, RawCollections, RawRecord, RawValue, SnapshotMeta, StockSnapshot};

/// Reconcile the three raw collections into a snapshot.
///
/// Never fails: malformed cells fall back to defaults and incomplete rows are
/// dropped and counted in `intake`.
pub fn run(config: &StockConfig, raw: &RawCollections) -> StockSnapshot {
    let case = config.keys.case;
    let catalog = clean_catalog(&raw.catalog, &config.fields.catalog, case);
    let inbound = clean_transactions(&raw.inbound, &config.fields.inbound, case, "inbound");
    let outbound = clean_transactions(&raw.outbound, &config.fields.outbound, case, "outbound");

    let (materials, duplicate_catalog_keys) = dedupe_catalog(catalog.records);
    if materials.is_empty() {
        log::warn!("catalog is empty, snapshot has no lines");
    }

    let mut joined = build_lines(&materials, &inbound.records, &outbound.records);
    if joined.unmatched_inbound + joined.unmatched_outbound > 0 {
        log::warn!(
            "{} inbound and {} outbound transactions reference keys missing from the catalog",
            joined.unmatched_inbound,
            joined.unmatched_outbound
        );
    }

    let alerts = apply_alerts(&mut joined.lines, config.alerts.critical_ratio);
    let alert_summary = summarize(&alerts);
    let metrics = compute_metrics(&joined.lines, &alerts, config.metrics.high_value_threshold);
    let trend = movement_trend(&inbound.records, &outbound.records);

    log::info!(
        "reconciled {} items: {} critical, {} warning, total value {:.2}",
        metrics.item_count,
        alert_summary.critical,
        alert_summary.warning,
        metrics.total_value
    );

    StockSnapshot {
        meta: SnapshotMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        },
        lines: joined.lines,
        alerts,
        alert_summary,
        metrics,
        intake: IntakeReport {
            catalog: catalog.counts,
            inbound: inbound.counts,
            outbound: outbound.counts,
            duplicate_catalog_keys,
            unmatched_inbound: joined.unmatched_inbound,
            unmatched_outbound: joined.unmatched_outbound,
        },
        trend,
    }
}

/// Load CSV text into raw records. Headers are trimmed; blank cells are
/// `Empty`. `label` names the source in errors.
pub fn load_csv_records(label: &str, csv_data: &str) -> Result<Vec<RawRecord>, StockError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StockError::parse(label, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StockError::parse(label, e))?;
        let mut row = RawRecord::new();
        for (i, h) in headers.iter().enumerate() {
            if h.is_empty() {
                continue;
            }
            row.insert(h, RawValue::text(record.get(i).unwrap_or("")));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Load a JSON array of objects into raw records.
pub fn load_json_records(label: &str, json_data: &str) -> Result<Vec<RawRecord>, StockError> {
    let value: serde_json::Value =
        serde_json::from_str(json_data).map_err(|e| StockError::parse(label, e))?;
    let serde_json::Value::Array(items) = value else {
        return Err(StockError::parse(label, "expected an array of objects"));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let serde_json::Value::Object(map) = item else {
                return Err(StockError::parse(label, format!("element {i} is not an object")));
            };
            let mut row = RawRecord::new();
            for (k, v) in map {
                row.insert(&k, json_cell(v));
            }
            Ok(row)
        })
        .collect()
}

fn json_cell(value: serde_json::Value) -> RawValue {
    use serde_json::Value;
    match value {
        Value::Null => RawValue::Empty,
        Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Empty),
        Value::String(s) => RawValue::text(&s),
        Value::Bool(b) => RawValue::Text(b.to_string()),
        other => RawValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertReason, AlertTier, Priority};

    fn catalog(rows: &[(&str, &str, &str, &str)]) -> Vec<RawRecord> {
        rows.iter()
            .map(|(id, name, cost, reorder)| {
                RawRecord::from_pairs([
                    ("RM ID", *id),
                    ("Product Name", *name),
                    ("Unit", "kg"),
                    ("Cost per Unit", *cost),
                    ("Reorder Level", *reorder),
                ])
            })
            .collect()
    }

    fn movement(field: &str, id: &str, qty: &str) -> RawRecord {
        RawRecord::from_pairs([("RM ID", id), (field, qty), ("Date", "05/01/2026")])
    }

    #[test]
    fn wheat_scenario() {
        let raw = RawCollections {
            catalog: catalog(&[("WHEA01", "Wheat", "₹40", "100")]),
            inbound: vec![movement("Quantity", "WHEA01", "150")],
            outbound: vec![movement("Quantity Out", "WHEA01", "60")],
        };
        let snap = run(&StockConfig::default(), &raw);
        let line = &snap.lines[0];
        assert_eq!(line.current_stock, 90.0);
        assert_eq!(line.inventory_value, 3600.0);
        assert_eq!(line.alert_tier, AlertTier::Warning);
        assert_eq!(line.reorder_quantity, 10.0);
        assert_eq!(snap.alerts.len(), 1);
        assert_eq!(snap.alerts[0].priority, Priority::Low);
        assert_eq!(snap.trend.len(), 1);
        assert_eq!(snap.trend[0].stock_in, 150.0);
    }

    #[test]
    fn no_movements_is_out_of_stock() {
        let raw = RawCollections {
            catalog: catalog(&[("PANE04", "Paneer", "320", "20")]),
            ..RawCollections::default()
        };
        let snap = run(&StockConfig::default(), &raw);
        assert_eq!(snap.lines[0].current_stock, 0.0);
        assert_eq!(snap.lines[0].alert_tier, AlertTier::Critical);
        assert_eq!(snap.alerts[0].reason, AlertReason::OutOfStock);
        assert_eq!(snap.alerts[0].priority, Priority::High);
        assert_eq!(snap.alert_summary.out_of_stock, 1);
    }

    #[test]
    fn empty_input_is_valid() {
        let snap = run(&StockConfig::default(), &RawCollections::default());
        assert!(snap.lines.is_empty());
        assert!(snap.alerts.is_empty());
        assert_eq!(snap.metrics.item_count, 0);
        assert_eq!(snap.metrics.turnover_ratio, 0.0);
    }

    #[test]
    fn intake_reports_drops_duplicates_and_orphans() {
        let raw = RawCollections {
            catalog: catalog(&[("A", "a", "1", "0"), ("A", "a2", "2", "0"), ("", "", "1", "0")]),
            inbound: vec![movement("Quantity", "A", "5"), movement("Quantity", "ZZ", "3")],
            outbound: vec![movement("Quantity Out", "A", "-5")],
        };
        let snap = run(&StockConfig::default(), &raw);
        assert_eq!(snap.lines.len(), 1);
        assert_eq!(snap.lines[0].name, "a2");
        assert_eq!(snap.intake.duplicate_catalog_keys, 1);
        assert_eq!(snap.intake.catalog.dropped, 1);
        assert_eq!(snap.intake.unmatched_inbound, 1);
        assert_eq!(snap.intake.outbound.drop_reasons["non_positive_quantity"], 1);
        assert_eq!(snap.lines[0].total_out, 0.0);
    }

    #[test]
    fn fold_policy_joins_across_case() {
        let mut config = StockConfig::default();
        config.keys.case = crate::config::KeyCase::Fold;
        let raw = RawCollections {
            catalog: catalog(&[("WHEA01", "Wheat", "40", "0")]),
            inbound: vec![movement("Quantity", "whea01", "7")],
            outbound: vec![],
        };
        let snap = run(&config, &raw);
        assert_eq!(snap.lines[0].total_in, 7.0);
        assert_eq!(snap.intake.unmatched_inbound, 0);

        let strict = run(&StockConfig::default(), &raw);
        assert_eq!(strict.lines[0].total_in, 0.0);
        assert_eq!(strict.intake.unmatched_inbound, 1);
    }

    #[test]
    fn load_csv_trims_headers_and_blanks() {
        let csv = "\
 RM ID ,Product Name,Cost per Unit
WHEA01,Wheat,\"₹1,650\"
,Paneer,
";
        let rows = load_csv_records("catalog", csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("RM ID"), Some(&RawValue::Text("WHEA01".into())));
        assert_eq!(rows[0].get("Cost per Unit"), Some(&RawValue::Text("₹1,650".into())));
        assert_eq!(rows[1].get("RM ID"), Some(&RawValue::Empty));
        assert_eq!(rows[1].get("Cost per Unit"), Some(&RawValue::Empty));
    }

    #[test]
    fn load_csv_short_rows() {
        let rows = load_csv_records("inbound", "RM ID,Quantity,Date\nA,5\n").unwrap();
        assert_eq!(rows[0].get("Date"), Some(&RawValue::Empty));
    }

    #[test]
    fn load_json_cells() {
        let json = r#"[{"RM ID": "A", "Quantity": 12, "Date": null, "Manual Reorder": true}]"#;
        let rows = load_json_records("inbound", json).unwrap();
        assert_eq!(rows[0].get("Quantity"), Some(&RawValue::Number(12.0)));
        assert_eq!(rows[0].get("Date"), Some(&RawValue::Empty));
        assert_eq!(rows[0].get("Manual Reorder"), Some(&RawValue::Text("true".into())));
    }

    #[test]
    fn load_json_rejects_non_array() {
        let err = load_json_records("catalog.json", r#"{"RM ID": "A"}"#).unwrap_err();
        assert!(matches!(err, StockError::Parse { .. }));
        let err = load_json_records("catalog.json", "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("element 0"));
    }
}
