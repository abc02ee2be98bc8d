//! Record cleaning: raw rows into canonical catalog and transaction records.
//!
//! Rows that fail a required-field check are dropped and counted, never
//! reported as errors.

use crate::config::{CatalogFields, KeyCase, TransactionFields};
use crate::key::{join_key, resolve_key};
use crate::model::{
    DropReason, IntakeCounts, MaterialRecord, RawRecord, TransactionRecord,
};
use crate::normalize::{to_date, to_money, to_number};

/// Cleaned rows plus their intake counts.
#[derive(Debug, Clone, Default)]
pub struct Cleaned<T> {
    pub records: Vec<T>,
    pub counts: IntakeCounts,
}

/// Clean catalog rows. Key and name are required.
///
/// Duplicate keys are not collapsed here; the aggregator applies
/// last-write-wins.
pub fn clean_catalog(
    rows: &[RawRecord],
    fields: &CatalogFields,
    case: KeyCase,
) -> Cleaned<MaterialRecord> {
    let candidates = fields.key_candidates();
    let mut out = Cleaned {
        records: Vec::with_capacity(rows.len()),
        counts: IntakeCounts {
            raw: rows.len(),
            ..IntakeCounts::default()
        },
    };

    for (idx, row) in rows.iter().enumerate() {
        let key = resolve_key(row, &candidates);
        if key.is_empty() {
            log::debug!("catalog row {idx}: dropped, no identifier or name");
            out.counts.record_drop(DropReason::MissingKey);
            continue;
        }
        let name = row.text_of(&fields.name);
        if name.is_empty() {
            log::debug!("catalog row {idx} ({key}): dropped, no name");
            out.counts.record_drop(DropReason::MissingName);
            continue;
        }

        out.records.push(MaterialRecord {
            key: join_key(key, case),
            name,
            unit: row.text_of(&fields.unit),
            unit_cost: resolve_unit_cost(row, fields).max(0.0),
            reorder_level: row
                .first_present(&fields.reorder_level)
                .map(to_money)
                .unwrap_or(0.0)
                .max(0.0),
            manual_reorder: row.text_of(&fields.manual_reorder).to_uppercase() == "YES",
        });
    }

    out.counts.kept = out.records.len();
    out
}

/// Primary cost when non-zero, else the average cost, else zero.
fn resolve_unit_cost(row: &RawRecord, fields: &CatalogFields) -> f64 {
    let primary = row.first_present(&fields.cost).map(to_money).unwrap_or(0.0);
    if primary != 0.0 {
        return primary;
    }
    row.first_present(&fields.avg_cost).map(to_money).unwrap_or(0.0)
}

/// Clean inbound or outbound rows. Key and a positive quantity are required.
///
/// Non-positive quantities (returns, cancellations) are dropped.
pub fn clean_transactions(
    rows: &[RawRecord],
    fields: &TransactionFields,
    case: KeyCase,
    direction: &str,
) -> Cleaned<TransactionRecord> {
    let candidates = fields.key_candidates();
    let mut out = Cleaned {
        records: Vec::with_capacity(rows.len()),
        counts: IntakeCounts {
            raw: rows.len(),
            ..IntakeCounts::default()
        },
    };

    for (idx, row) in rows.iter().enumerate() {
        let key = resolve_key(row, &candidates);
        if key.is_empty() {
            log::debug!("{direction} row {idx}: dropped, no identifier or name");
            out.counts.record_drop(DropReason::MissingKey);
            continue;
        }

        let quantity = row.first_present(&fields.quantity).map(to_number).unwrap_or(0.0);
        if quantity <= 0.0 {
            log::debug!("{direction} row {idx} ({key}): dropped, quantity {quantity} is not positive");
            out.counts.record_drop(DropReason::NonPositiveQuantity);
            continue;
        }

        let unit_cost = if fields.unit_cost.is_empty() {
            None
        } else {
            row.first_present(&fields.unit_cost).map(|v| to_money(v).max(0.0))
        };

        out.records.push(TransactionRecord {
            key: join_key(key, case),
            quantity,
            date: row.first_present(&fields.date).and_then(to_date),
            unit_cost,
        });
    }

    out.counts.kept = out.records.len();
    out
}
