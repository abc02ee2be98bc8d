//! `stockroom` commands: reconcile, report, search, validate, record.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Serialize;

use stockroom_recon::config::TransactionFields;
use stockroom_recon::derived::{search_lines, top_by_stock};
use stockroom_recon::key::{join_key, resolve_key};
use stockroom_recon::model::{Alert, AlertSummary, AlertTier, InventoryLine, StockSnapshot};
use stockroom_recon::normalize::to_number;
use stockroom_recon::{DirSource, Direction, RawRecord, RawValue, RecordSource, SnapshotCache, StockConfig};

use crate::exit_codes::{
    EXIT_ALERTS_CRITICAL, EXIT_ALERTS_WARNING, EXIT_CONFIG_INVALID, EXIT_ERROR,
};
use crate::CliError;

const CONFIG_FILE: &str = "stockroom.toml";

/// Which alert tier turns into a non-zero exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    Critical,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecordKind {
    /// Stock received
    In,
    /// Stock issued
    Out,
}

impl From<RecordKind> for Direction {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::In => Direction::Inbound,
            RecordKind::Out => Direction::Outbound,
        }
    }
}

// ============================================================================
// Config discovery
// ============================================================================

/// Resolved config plus the directory the data files live in.
pub struct Context {
    pub config: StockConfig,
    pub config_path: Option<PathBuf>,
    pub data_dir: PathBuf,
}

impl Context {
    fn source(&self) -> DirSource {
        DirSource::new(&self.data_dir, self.config.sources.clone())
    }

    fn snapshot(&self) -> Result<StockSnapshot, CliError> {
        let raw = self.source().fetch()?;
        Ok(stockroom_recon::run(&self.config, &raw))
    }
}

/// `--config`, then `./stockroom.toml`, then the user config dir, then
/// defaults. Data files resolve against `--data`, else the directory of an
/// explicit `--config`, else the current directory.
pub fn load_context(config: Option<PathBuf>, data: Option<PathBuf>) -> Result<Context, CliError> {
    let explicit = config.is_some();
    let config_path = config.or_else(discover_config);

    let loaded = match &config_path {
        Some(path) => {
            tracing::debug!("using config {}", path.display());
            read_config(path)?
        }
        None => {
            tracing::debug!("no {CONFIG_FILE} found, using defaults");
            StockConfig::default()
        }
    };

    let data_dir = match (data, explicit, &config_path) {
        (Some(dir), _, _) => dir,
        (None, true, Some(path)) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        _ => PathBuf::from("."),
    };

    Ok(Context {
        config: loaded,
        config_path,
        data_dir,
    })
}

fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("stockroom").join(CONFIG_FILE);
    user.is_file().then_some(user)
}

fn read_config(path: &Path) -> Result<StockConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_CONFIG_INVALID,
        message: format!("cannot read config {}: {e}", path.display()),
        hint: None,
    })?;
    StockConfig::from_toml(&text).map_err(|e| {
        CliError::from(e).with_hint(format!("check {}", path.display()))
    })
}

// ============================================================================
// Output helpers
// ============================================================================

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })
}

fn print_lines(lines: &[&InventoryLine]) {
    println!(
        "{:<10} {:<24} {:>10} {:<5} {:>10} {:>12} {:>8}",
        "KEY", "NAME", "STOCK", "UNIT", "REORDER", "VALUE", "TIER"
    );
    for l in lines {
        println!(
            "{:<10} {:<24} {:>10.2} {:<5} {:>10.2} {:>12.2} {:>8}",
            l.key,
            l.name,
            l.current_stock,
            l.unit,
            l.reorder_level,
            l.inventory_value,
            l.alert_tier.to_string()
        );
    }
}

fn print_alerts(alerts: &[Alert]) {
    for a in alerts {
        println!(
            "{:<6} {:<10} {:<24} {:<26} stock {:.2} {}, reorder {:.2} (~{:.2})",
            a.priority.to_string(),
            a.key,
            a.name,
            a.label,
            a.current_stock,
            a.unit,
            a.reorder_quantity,
            a.estimated_reorder_value
        );
    }
}

fn summary_line(snapshot: &StockSnapshot) -> String {
    let m = &snapshot.metrics;
    let s = &snapshot.alert_summary;
    format!(
        "{}: {} items, value {:.2}, in {:.2}, out {:.2} | {} critical ({} out of stock), {} warning",
        snapshot.meta.config_name,
        m.item_count,
        m.total_value,
        m.total_in,
        m.total_out,
        s.critical,
        s.out_of_stock,
        s.warning,
    )
}

/// Exit code gate for `--fail-on`.
pub fn check_fail_on(summary: &AlertSummary, fail_on: Option<FailOn>) -> Result<(), CliError> {
    let Some(level) = fail_on else {
        return Ok(());
    };
    if summary.critical > 0 {
        return Err(CliError {
            code: EXIT_ALERTS_CRITICAL,
            message: format!("{} critical alert(s)", summary.critical),
            hint: None,
        });
    }
    if level == FailOn::Warning && summary.warning > 0 {
        return Err(CliError {
            code: EXIT_ALERTS_WARNING,
            message: format!("{} warning(s)", summary.warning),
            hint: None,
        });
    }
    Ok(())
}

// ============================================================================
// run / alerts / search / top
// ============================================================================

pub fn cmd_run(
    ctx: &Context,
    json_output: bool,
    output_file: Option<PathBuf>,
    fail_on: Option<FailOn>,
) -> Result<(), CliError> {
    let snapshot = ctx.snapshot()?;
    let json_str = to_json(&snapshot)?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        print_lines(&snapshot.lines.iter().collect::<Vec<_>>());
    }

    eprintln!("{}", summary_line(&snapshot));
    let intake = &snapshot.intake;
    let dropped = intake.catalog.dropped + intake.inbound.dropped + intake.outbound.dropped;
    if dropped + intake.unmatched_inbound + intake.unmatched_outbound > 0 {
        eprintln!(
            "intake: {dropped} rows dropped, {} unmatched transactions, {} duplicate catalog keys",
            intake.unmatched_inbound + intake.unmatched_outbound,
            intake.duplicate_catalog_keys,
        );
    }

    check_fail_on(&snapshot.alert_summary, fail_on)
}

#[derive(Serialize)]
struct AlertsOutput<'a> {
    summary: &'a AlertSummary,
    alerts: &'a [Alert],
}

pub fn cmd_alerts(ctx: &Context, json_output: bool, fail_on: Option<FailOn>) -> Result<(), CliError> {
    let snapshot = ctx.snapshot()?;

    if json_output {
        println!(
            "{}",
            to_json(&AlertsOutput {
                summary: &snapshot.alert_summary,
                alerts: &snapshot.alerts,
            })?
        );
    } else if snapshot.alerts.is_empty() {
        eprintln!("no alerts");
    } else {
        print_alerts(&snapshot.alerts);
        eprintln!(
            "{} alerts, estimated reorder value {:.2}",
            snapshot.alert_summary.total, snapshot.alert_summary.estimated_reorder_value
        );
    }

    check_fail_on(&snapshot.alert_summary, fail_on)
}

pub fn cmd_search(ctx: &Context, query: &str, json_output: bool) -> Result<(), CliError> {
    let snapshot = ctx.snapshot()?;
    let hits = search_lines(&snapshot.lines, query);

    if json_output {
        println!("{}", to_json(&hits)?);
    } else {
        print_lines(&hits);
        eprintln!("{} of {} items match", hits.len(), snapshot.lines.len());
    }
    Ok(())
}

pub fn cmd_top(ctx: &Context, n: Option<usize>, json_output: bool) -> Result<(), CliError> {
    let snapshot = ctx.snapshot()?;
    let top = top_by_stock(&snapshot.lines, n.unwrap_or(ctx.config.metrics.top_n));

    if json_output {
        println!("{}", to_json(&top)?);
    } else {
        print_lines(&top);
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(ctx: &Context) -> Result<(), CliError> {
    match &ctx.config_path {
        Some(path) => eprintln!("config ok: {} ({})", ctx.config.name, path.display()),
        None => eprintln!("no config file, using defaults"),
    }

    let raw = ctx.source().fetch()?;
    let snapshot = stockroom_recon::run(&ctx.config, &raw);
    let intake = &snapshot.intake;
    for (label, counts) in [
        ("catalog", &intake.catalog),
        ("inbound", &intake.inbound),
        ("outbound", &intake.outbound),
    ] {
        let reasons: Vec<String> = counts
            .drop_reasons
            .iter()
            .map(|(reason, n)| format!("{reason}={n}"))
            .collect();
        eprintln!(
            "{label:<9} {} rows, {} kept{}",
            counts.raw,
            counts.kept,
            if reasons.is_empty() {
                String::new()
            } else {
                format!(" (dropped: {})", reasons.join(", "))
            }
        );
    }
    if intake.duplicate_catalog_keys > 0 {
        eprintln!("{} duplicate catalog key(s), later rows win", intake.duplicate_catalog_keys);
    }
    if intake.unmatched_inbound + intake.unmatched_outbound > 0 {
        eprintln!(
            "{} inbound / {} outbound transaction(s) have no catalog entry",
            intake.unmatched_inbound, intake.unmatched_outbound
        );
    }
    Ok(())
}

// ============================================================================
// record in / out
// ============================================================================

/// Parse `FIELD=VALUE` arguments into a record.
pub fn parse_fields(args: &[String]) -> Result<RawRecord, CliError> {
    let mut record = RawRecord::new();
    for arg in args {
        let Some((field, value)) = arg.split_once('=') else {
            return Err(CliError::args(format!("expected FIELD=VALUE, got {arg:?}"))
                .with_hint("quote fields with spaces: \"RM ID=WHEA01\""));
        };
        if field.trim().is_empty() {
            return Err(CliError::args(format!("empty field name in {arg:?}")));
        }
        record.insert(field, RawValue::text(value));
    }
    Ok(record)
}

/// Place a record's values under the file's own column names.
///
/// Columns named by the user are copied as-is. An alias group (identifier,
/// name, quantity, date, unit cost) with no filled column puts its first
/// present value under the first header column in that group. The result
/// must still carry a key and a quantity.
pub fn fit_to_headers(
    record: &RawRecord,
    headers: &[String],
    aliases: &TransactionFields,
) -> Result<RawRecord, CliError> {
    let groups = [&aliases.id, &aliases.name, &aliases.quantity, &aliases.date, &aliases.unit_cost];
    let mut fitted = RawRecord::new();
    for header in headers {
        if let Some(value) = record.get(header) {
            fitted.insert(header, value.clone());
        }
    }

    for group in groups {
        let columns: Vec<&String> = headers
            .iter()
            .filter(|h| group.iter().any(|a| a.trim().eq_ignore_ascii_case(h)))
            .collect();
        if columns.iter().any(|c| fitted.get(c).is_some_and(|v| !v.is_blank())) {
            continue;
        }
        if let (Some(column), Some(value)) = (columns.first(), record.first_present(group)) {
            fitted.insert(column, value.clone());
        }
    }

    let columns = headers.join(", ");
    if resolve_key(&fitted, &aliases.key_candidates()).is_empty() {
        return Err(CliError::args("the file has no column for the identifier given")
            .with_hint(format!("columns are: {columns}")));
    }
    if fitted.first_present(&aliases.quantity).is_none() {
        return Err(CliError::args("the file has no column for the quantity given")
            .with_hint(format!("columns are: {columns}")));
    }

    for (field, _) in record.iter() {
        let known = headers.iter().any(|h| h.eq_ignore_ascii_case(field))
            || groups.iter().any(|g| g.iter().any(|a| a.trim().eq_ignore_ascii_case(field)));
        if !known {
            tracing::warn!("no column named {field:?}, value not written");
        }
    }
    Ok(fitted)
}

pub fn cmd_record(
    ctx: &Context,
    kind: RecordKind,
    fields: &[String],
    date: Option<String>,
) -> Result<(), CliError> {
    let direction = Direction::from(kind);
    let aliases = match direction {
        Direction::Inbound => &ctx.config.fields.inbound,
        Direction::Outbound => &ctx.config.fields.outbound,
    };

    let mut record = parse_fields(fields)?;

    let key = resolve_key(&record, &aliases.key_candidates());
    if key.is_empty() {
        return Err(CliError::args("record needs an identifier or product name")
            .with_hint(format!("set one of: {}", aliases.key_candidates().join(", "))));
    }
    let quantity = record.first_present(&aliases.quantity).map(to_number).unwrap_or(0.0);
    if quantity <= 0.0 {
        return Err(CliError::args(format!("quantity must be a positive number, got {quantity}"))
            .with_hint(format!("set one of: {}", aliases.quantity.join(", "))));
    }

    if let Some(date_field) = aliases.date.first() {
        if record.first_present(&aliases.date).is_none() {
            let value = date.unwrap_or_else(|| chrono::Local::now().date_naive().format("%d %b %Y").to_string());
            record.insert(date_field, RawValue::text(&value));
        }
    }

    let cache = SnapshotCache::new(ctx.source(), ctx.config.clone());
    let headers = cache.source().header_row(direction)?;
    let record = fit_to_headers(&record, &headers, aliases)?;
    let join = join_key(key, ctx.config.keys.case);
    let stock_of = |snapshot: &StockSnapshot| {
        snapshot
            .lines
            .iter()
            .find(|l| l.key == join)
            .map(|l| (l.current_stock, l.unit.clone(), l.alert_tier))
    };

    let before = stock_of(&*cache.get()?);
    let path = cache.source().append(direction, &record)?;
    cache.invalidate();
    let after = stock_of(&*cache.get()?);

    eprintln!("appended {direction} row to {}", path.display());
    match (before, after) {
        (Some((was, _, _)), Some((now, unit, tier))) => {
            println!("{join}: {was:.2} -> {now:.2} {unit} ({tier})");
            if tier != AlertTier::Ok {
                tracing::info!("{join} is still on the alert list");
            }
        }
        _ => {
            tracing::warn!("{join} is not in the catalog; the row will not count toward stock");
            println!("{join}: not in catalog");
        }
    }
    Ok(())
}
