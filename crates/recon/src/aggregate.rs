use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{AlertTier, InventoryLine, MaterialRecord, TransactionRecord};

/// Sum quantities per key.
pub fn sum_by_key(records: &[TransactionRecord]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(record.key.clone()).or_insert(0.0) += record.quantity;
    }
    totals
}

/// Collapse duplicate catalog keys. Position is the first occurrence, values
/// come from the last. Returns the survivors and how many rows were overwritten.
pub fn dedupe_catalog(catalog: Vec<MaterialRecord>) -> (Vec<MaterialRecord>, usize) {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<MaterialRecord> = Vec::with_capacity(catalog.len());
    let mut duplicates = 0;

    for material in catalog {
        match position.get(&material.key) {
            Some(&idx) => {
                log::debug!("catalog key {} repeated, later row wins", material.key);
                out[idx] = material;
                duplicates += 1;
            }
            None => {
                position.insert(material.key.clone(), out.len());
                out.push(material);
            }
        }
    }
    (out, duplicates)
}

/// Output of the left join.
#[derive(Debug, Clone, Default)]
pub struct Joined {
    pub lines: Vec<InventoryLine>,
    /// Cleaned inbound transactions whose key has no catalog entry.
    pub unmatched_inbound: usize,
    pub unmatched_outbound: usize,
}

/// Left-join movement totals onto the catalog. One line per catalog key, in
/// catalog order. Lines leave here with tier `Ok`; the classifier sets it.
pub fn build_lines(
    catalog: &[MaterialRecord],
    inbound: &[TransactionRecord],
    outbound: &[TransactionRecord],
) -> Joined {
    let totals_in = sum_by_key(inbound);
    let totals_out = sum_by_key(outbound);

    let lines: Vec<InventoryLine> = catalog
        .iter()
        .map(|m| {
            let total_in = totals_in.get(&m.key).copied().unwrap_or(0.0);
            let total_out = totals_out.get(&m.key).copied().unwrap_or(0.0);
            let current_stock = total_in - total_out;
            InventoryLine {
                key: m.key.clone(),
                name: m.name.clone(),
                unit: m.unit.clone(),
                total_in,
                total_out,
                current_stock,
                unit_cost: m.unit_cost,
                inventory_value: current_stock * m.unit_cost,
                reorder_level: m.reorder_level,
                manual_reorder: m.manual_reorder,
                alert_tier: AlertTier::Ok,
                reorder_quantity: 0.0,
            }
        })
        .collect();

    let known: HashSet<&str> = catalog.iter().map(|m| m.key.as_str()).collect();
    let unmatched = |records: &[TransactionRecord]| {
        records
            .iter()
            .filter(|t| !known.contains(t.key.as_str()))
            .count()
    };

    Joined {
        unmatched_inbound: unmatched(inbound),
        unmatched_outbound: unmatched(outbound),
        lines,
    }
}
