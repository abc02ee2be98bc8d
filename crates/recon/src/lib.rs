//! `stockroom-recon` — Inventory reconciliation engine.
//!
//! Pure engine: receives raw catalog / inbound / outbound records, returns
//! inventory lines, tiered alerts and metrics. File access and caching live
//! in [`source`]; nothing else does IO.

pub mod aggregate;
pub mod classify;
pub mod clean;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod key;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod source;

pub use config::StockConfig;
pub use engine::run;
pub use error::StockError;
pub use model::{RawCollections, RawRecord, RawValue, StockSnapshot};
pub use source::{DirSource, Direction, RecordSource, SnapshotCache};
