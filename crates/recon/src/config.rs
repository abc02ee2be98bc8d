use serde::{Deserialize, Deserializer};

use crate::error::StockError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub sources: SourceFiles,
    #[serde(default)]
    pub fields: FieldAliases,
    #[serde(default)]
    pub keys: KeyConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_name() -> String {
    "inventory".into()
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            sources: SourceFiles::default(),
            fields: FieldAliases::default(),
            keys: KeyConfig::default(),
            alerts: AlertConfig::default(),
            metrics: MetricsConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// File names of the three collections, relative to the data directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub catalog: String,
    pub inbound: String,
    pub outbound: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            catalog: "raw_material_master.csv".into(),
            inbound: "stock_in.csv".into(),
            outbound: "stock_out.csv".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field aliases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    pub catalog: CatalogFields,
    #[serde(deserialize_with = "inbound_over_defaults")]
    pub inbound: TransactionFields,
    #[serde(deserialize_with = "outbound_over_defaults")]
    pub outbound: TransactionFields,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            catalog: CatalogFields::default(),
            inbound: TransactionFields::inbound(),
            outbound: TransactionFields::outbound(),
        }
    }
}

/// Catalog column aliases. Each list is tried in order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogFields {
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub unit: Vec<String>,
    pub cost: Vec<String>,
    pub avg_cost: Vec<String>,
    pub reorder_level: Vec<String>,
    pub manual_reorder: Vec<String>,
}

impl Default for CatalogFields {
    fn default() -> Self {
        Self {
            id: names(&["RM ID", "Product ID"]),
            name: names(&["Product Name"]),
            unit: names(&["Unit"]),
            cost: names(&["Cost per Unit"]),
            avg_cost: names(&["Avg. Cost per Unit"]),
            reorder_level: names(&["Reorder Level"]),
            manual_reorder: names(&["Manual Reorder"]),
        }
    }
}

impl CatalogFields {
    /// Join-key candidates: identifiers first, then the display name.
    pub fn key_candidates(&self) -> Vec<String> {
        self.id.iter().chain(self.name.iter()).cloned().collect()
    }
}

/// Inbound/outbound column aliases.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFields {
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub quantity: Vec<String>,
    pub date: Vec<String>,
    pub unit_cost: Vec<String>,
}

impl TransactionFields {
    pub fn inbound() -> Self {
        Self {
            id: names(&["RM ID", "Product ID"]),
            name: names(&["Product Name"]),
            quantity: names(&["Quantity", "Quantity In"]),
            date: names(&["Date"]),
            unit_cost: names(&["Cost per Unit"]),
        }
    }

    pub fn outbound() -> Self {
        Self {
            quantity: names(&["Quantity Out"]),
            unit_cost: Vec::new(),
            ..Self::inbound()
        }
    }

    pub fn key_candidates(&self) -> Vec<String> {
        self.id.iter().chain(self.name.iter()).cloned().collect()
    }
}

/// A `[fields.inbound]` / `[fields.outbound]` table; absent lists keep the
/// direction's defaults.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialTransactionFields {
    id: Option<Vec<String>>,
    name: Option<Vec<String>>,
    quantity: Option<Vec<String>>,
    date: Option<Vec<String>>,
    unit_cost: Option<Vec<String>>,
}

impl PartialTransactionFields {
    fn over(self, defaults: TransactionFields) -> TransactionFields {
        TransactionFields {
            id: self.id.unwrap_or(defaults.id),
            name: self.name.unwrap_or(defaults.name),
            quantity: self.quantity.unwrap_or(defaults.quantity),
            date: self.date.unwrap_or(defaults.date),
            unit_cost: self.unit_cost.unwrap_or(defaults.unit_cost),
        }
    }
}

fn inbound_over_defaults<'de, D>(deserializer: D) -> Result<TransactionFields, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialTransactionFields::deserialize(deserializer)?.over(TransactionFields::inbound()))
}

fn outbound_over_defaults<'de, D>(deserializer: D) -> Result<TransactionFields, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(PartialTransactionFields::deserialize(deserializer)?.over(TransactionFields::outbound()))
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Keys, alerts, metrics, cache
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCase {
    /// Keys join only when their trimmed text is identical.
    #[default]
    Sensitive,
    /// Keys are lower-cased before joining.
    Fold,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub case: KeyCase,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Stock at or below `reorder_level * critical_ratio` is critical.
    pub critical_ratio: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            critical_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub high_value_threshold: f64,
    pub top_n: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: 10_000.0,
            top_n: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl StockConfig {
    pub fn from_toml(input: &str) -> Result<Self, StockError> {
        let config: StockConfig =
            toml::from_str(input).map_err(|e| StockError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StockError> {
        let ratio = self.alerts.critical_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(StockError::ConfigValidation(format!(
                "alerts.critical_ratio must be between 0 and 1, got {ratio}"
            )));
        }

        let threshold = self.metrics.high_value_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(StockError::ConfigValidation(format!(
                "metrics.high_value_threshold must be a non-negative number, got {threshold}"
            )));
        }

        if self.cache.ttl_secs == 0 {
            return Err(StockError::ConfigValidation(
                "cache.ttl_secs must be greater than 0".into(),
            ));
        }

        for (label, file) in [
            ("sources.catalog", &self.sources.catalog),
            ("sources.inbound", &self.sources.inbound),
            ("sources.outbound", &self.sources.outbound),
        ] {
            if file.trim().is_empty() {
                return Err(StockError::ConfigValidation(format!("{label} is empty")));
            }
        }

        let required: [(&str, &[String]); 5] = [
            ("fields.catalog.name", &self.fields.catalog.name),
            ("fields.inbound.name", &self.fields.inbound.name),
            ("fields.inbound.quantity", &self.fields.inbound.quantity),
            ("fields.outbound.name", &self.fields.outbound.name),
            ("fields.outbound.quantity", &self.fields.outbound.quantity),
        ];
        for (label, aliases) in required {
            if aliases.iter().all(|a| a.trim().is_empty()) {
                return Err(StockError::ConfigValidation(format!(
                    "{label} needs at least one column name"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
