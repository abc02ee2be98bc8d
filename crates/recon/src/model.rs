use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A scalar cell as delivered by the data source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Empty,
}

impl RawValue {
    /// Wrap a text cell; whitespace-only text becomes `Empty`.
    pub fn text(s: &str) -> Self {
        if s.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_string())
        }
    }

    /// Trimmed string form. Numbers print without a trailing `.0` when integral.
    pub fn as_trimmed(&self) -> String {
        match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Self::Number(n) => n.to_string(),
            Self::Empty => String::new(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
            Self::Empty => true,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::text(&s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// One row from a source collection, fields kept in insertion order.
///
/// Field names are trimmed on insert. Lookup is exact first, then
/// ASCII case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    fields: Vec<(String, RawValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<RawValue>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.insert(k.as_ref(), v.into());
        }
        record
    }

    /// Set a field. An existing field with the same trimmed name is replaced
    /// in place.
    pub fn insert(&mut self, field: &str, value: RawValue) {
        let field = field.trim();
        match self.fields.iter_mut().find(|(k, _)| k == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
    }

    /// Exact name, else the first inserted field equal ignoring ASCII case.
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        let field = field.trim();
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .or_else(|| self.fields.iter().find(|(k, _)| k.eq_ignore_ascii_case(field)))
            .map(|(_, v)| v)
    }

    /// First alias holding a non-blank value.
    pub fn first_present(&self, aliases: &[String]) -> Option<&RawValue> {
        aliases
            .iter()
            .filter_map(|a| self.get(a))
            .find(|v| !v.is_blank())
    }

    /// Trimmed text of the first non-blank alias, or empty.
    pub fn text_of(&self, aliases: &[String]) -> String {
        self.first_present(aliases)
            .map(RawValue::as_trimmed)
            .unwrap_or_default()
    }

    /// Field names and values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The three collections the engine consumes.
#[derive(Debug, Clone, Default)]
pub struct RawCollections {
    pub catalog: Vec<RawRecord>,
    pub inbound: Vec<RawRecord>,
    pub outbound: Vec<RawRecord>,
}

// ---------------------------------------------------------------------------
// Cleaned records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRecord {
    pub key: String,
    pub name: String,
    pub unit: String,
    pub unit_cost: f64,
    pub reorder_level: f64,
    pub manual_reorder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub key: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
}

// ---------------------------------------------------------------------------
// Lines + alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTier {
    Critical,
    Warning,
    Ok,
}

impl std::fmt::Display for AlertTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Warning => write!(f, "warning"),
            Self::Ok => write!(f, "ok"),
        }
    }
}

/// Why a line was alerted. Out-of-stock and critically-low share the
/// `Critical` tier and differ only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertReason {
    OutOfStock,
    CriticallyLow,
    BelowReorderLevel,
    ManualReorder,
}

impl AlertReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OutOfStock => "Out of stock",
            Self::CriticallyLow => "Critically low",
            Self::BelowReorderLevel => "At or below reorder level",
            Self::ManualReorder => "Manual reorder requested",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryLine {
    pub key: String,
    pub name: String,
    pub unit: String,
    pub total_in: f64,
    pub total_out: f64,
    pub current_stock: f64,
    pub unit_cost: f64,
    pub inventory_value: f64,
    pub reorder_level: f64,
    pub manual_reorder: bool,
    pub alert_tier: AlertTier,
    pub reorder_quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub key: String,
    pub name: String,
    pub unit: String,
    pub current_stock: f64,
    pub reorder_level: f64,
    pub tier: AlertTier,
    pub reason: AlertReason,
    pub label: &'static str,
    pub priority: Priority,
    pub reorder_quantity: f64,
    pub estimated_reorder_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub critical: usize,
    pub warning: usize,
    pub out_of_stock: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub estimated_reorder_value: f64,
}

// ---------------------------------------------------------------------------
// Rollup + intake
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub item_count: usize,
    pub total_value: f64,
    pub total_in: f64,
    pub total_out: f64,
    pub high_value_count: usize,
    pub average_unit_cost: f64,
    pub total_reorder_value: f64,
    pub turnover_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MissingKey,
    MissingName,
    NonPositiveQuantity,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingKey => write!(f, "missing_key"),
            Self::MissingName => write!(f, "missing_name"),
            Self::NonPositiveQuantity => write!(f, "non_positive_quantity"),
        }
    }
}

/// Raw vs kept counts for one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntakeCounts {
    pub raw: usize,
    pub kept: usize,
    pub dropped: usize,
    pub drop_reasons: BTreeMap<String, usize>,
}

impl IntakeCounts {
    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        self.dropped += 1;
        *self.drop_reasons.entry(reason.to_string()).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntakeReport {
    pub catalog: IntakeCounts,
    pub inbound: IntakeCounts,
    pub outbound: IntakeCounts,
    /// Catalog rows overwritten by a later row with the same key.
    pub duplicate_catalog_keys: usize,
    /// Cleaned transactions whose key is not in the catalog.
    pub unmatched_inbound: usize,
    pub unmatched_outbound: usize,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub stock_in: f64,
    pub stock_out: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMeta {
    pub config_name: String,
    pub engine_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockSnapshot {
    pub meta: SnapshotMeta,
    pub lines: Vec<InventoryLine>,
    pub alerts: Vec<Alert>,
    pub alert_summary: AlertSummary,
    pub metrics: Metrics,
    pub intake: IntakeReport,
    pub trend: Vec<TrendPoint>,
}
