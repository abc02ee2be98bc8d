// Integration tests for the stockroom binary: stdout contract and exit codes.
// Run with: cargo test -p stockroom-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixtures_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures").join(name)
}

/// Temp dir holding a copy of a fixture set (or nothing).
fn workspace(fixture: Option<&str>) -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    if let Some(name) = fixture {
        for entry in fs::read_dir(fixtures_dir(name)).unwrap() {
            let entry = entry.unwrap();
            fs::copy(entry.path(), tmp.path().join(entry.file_name())).unwrap();
        }
    }
    tmp
}

/// The binary, isolated from the caller's config and log settings.
fn stockroom(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_stockroom"));
    cmd.current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env("HOME", dir)
        .env_remove("STOCKROOM_CONFIG")
        .env_remove("STOCKROOM_DATA")
        .env_remove("RUST_LOG");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    stockroom(dir).args(args).output().expect("spawn stockroom")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\n{stdout}"))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ===========================================================================
// run / alerts / search / top
// ===========================================================================

#[test]
fn run_json_is_the_full_snapshot() {
    let tmp = workspace(Some("kitchen"));
    let output = run(tmp.path(), &["run", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let snap = stdout_json(&output);
    assert_eq!(snap["meta"]["config_name"], "Central kitchen");
    assert_eq!(snap["lines"].as_array().unwrap().len(), 5);
    assert_eq!(snap["lines"][0]["key"], "WHEA01");
    assert_eq!(snap["lines"][0]["current_stock"], 90.0);
    assert_eq!(snap["metrics"]["item_count"], 5);
    assert_eq!(snap["intake"]["unmatched_inbound"], 1);
}

#[test]
fn run_writes_output_file() {
    let tmp = workspace(Some("kitchen"));
    let out = tmp.path().join("snapshot.json");
    let output = run(tmp.path(), &["run", "--output", out.to_str().unwrap()]);
    assert!(output.status.success());

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["alert_summary"]["total"], 4);
    assert!(String::from_utf8_lossy(&output.stdout).contains("WHEA01"));
}

#[test]
fn piped_stderr_has_no_color_codes() {
    let tmp = workspace(Some("kitchen"));
    let output = run(tmp.path(), &["run"]);
    let err = stderr(&output);
    assert!(err.contains("WARN"), "{err}");
    assert!(!err.contains('\x1b'), "{err:?}");
}

#[test]
fn fail_on_critical_exits_5() {
    let tmp = workspace(Some("kitchen"));
    let output = run(tmp.path(), &["run", "--fail-on", "critical"]);
    assert_eq!(output.status.code(), Some(5));
    assert!(stderr(&output).contains("critical"));
}

#[test]
fn fail_on_warning_without_criticals_exits_6() {
    let tmp = workspace(None);
    fs::write(
        tmp.path().join("raw_material_master.csv"),
        "RM ID,Product Name,Reorder Level\nA,Alpha,10\n",
    )
    .unwrap();
    fs::write(tmp.path().join("stock_in.csv"), "RM ID,Quantity\nA,8\n").unwrap();

    let output = run(tmp.path(), &["alerts", "--fail-on", "warning"]);
    assert_eq!(output.status.code(), Some(6), "stderr: {}", stderr(&output));

    let output = run(tmp.path(), &["alerts", "--fail-on", "critical"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn alerts_json_shape() {
    let tmp = workspace(Some("kitchen"));
    let output = run(tmp.path(), &["alerts", "--json"]);
    assert!(output.status.success());

    let val = stdout_json(&output);
    assert_eq!(val["summary"]["critical"], 2);
    let alerts = val["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 4);
    assert_eq!(alerts[3]["key"], "PANE04");
    assert_eq!(alerts[3]["priority"], "High");
}

#[test]
fn search_and_top() {
    let tmp = workspace(Some("kitchen"));

    let hits = stdout_json(&run(tmp.path(), &["search", "PANEER", "--json"]));
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["key"], "PANE04");

    let top = stdout_json(&run(tmp.path(), &["top", "--json"]));
    let keys: Vec<&str> = top.as_array().unwrap().iter().map(|l| l["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["OIL03", "WHEA01"]);

    let top = stdout_json(&run(tmp.path(), &["top", "-n", "1", "--json"]));
    assert_eq!(top.as_array().unwrap().len(), 1);
}

#[test]
fn explicit_config_resolves_data_next_to_it() {
    let tmp = workspace(None);
    let config = fixtures_dir("json").join("stockroom.toml");
    let output = run(tmp.path(), &["--config", config.to_str().unwrap(), "run", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout_json(&output)["meta"]["config_name"], "Spice rack");
}

#[test]
fn no_config_and_no_files_is_an_empty_snapshot() {
    let tmp = workspace(None);
    let output = run(tmp.path(), &["run", "--json", "--fail-on", "warning"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let snap = stdout_json(&output);
    assert_eq!(snap["meta"]["config_name"], "inventory");
    assert!(snap["lines"].as_array().unwrap().is_empty());
}

// ===========================================================================
// validate + error codes
// ===========================================================================

#[test]
fn validate_reports_intake() {
    let tmp = workspace(Some("kitchen"));
    let output = run(tmp.path(), &["validate"]);
    assert!(output.status.success());
    let err = stderr(&output);
    assert!(err.contains("config ok: Central kitchen"), "{err}");
    assert!(err.contains("missing_key=1"), "{err}");
    assert!(err.contains("non_positive_quantity=1"), "{err}");
}

#[test]
fn invalid_config_exits_3() {
    let tmp = workspace(None);
    fs::write(tmp.path().join("stockroom.toml"), "[alerts]\ncritical_ratio = 2.0\n").unwrap();
    let output = run(tmp.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("critical_ratio"));
}

#[test]
fn unreadable_config_exits_3() {
    let tmp = workspace(None);
    let output = run(tmp.path(), &["--config", "nope.toml", "run"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn unsupported_source_exits_4() {
    let tmp = workspace(None);
    fs::write(tmp.path().join("stockroom.toml"), "[sources]\ncatalog = \"master.xlsx\"\n").unwrap();
    let output = run(tmp.path(), &["run"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn malformed_json_source_exits_4() {
    let tmp = workspace(None);
    fs::write(tmp.path().join("stockroom.toml"), "[sources]\ncatalog = \"catalog.json\"\n").unwrap();
    fs::write(tmp.path().join("catalog.json"), "{not json").unwrap();
    let output = run(tmp.path(), &["run"]);
    assert_eq!(output.status.code(), Some(4));
}

// ===========================================================================
// record
// ===========================================================================

#[test]
fn record_in_appends_and_reports_new_stock() {
    let tmp = workspace(Some("kitchen"));
    let output = run(
        tmp.path(),
        &["record", "in", "RM ID=PANE04", "Product Name=Paneer", "Quantity=25", "--date", "09 Jan 2026"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "PANE04: 0.00 -> 25.00 kg (ok)");

    let content = fs::read_to_string(tmp.path().join("stock_in.csv")).unwrap();
    assert!(content.ends_with("09 Jan 2026,PANE04,Paneer,25,\n"), "{content}");
}

#[test]
fn record_out_fills_todays_date() {
    let tmp = workspace(Some("kitchen"));
    let output = run(tmp.path(), &["record", "out", "RM ID=WHEA01", "Quantity Out=10"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("WHEA01: 90.00 -> 80.00"));

    let content = fs::read_to_string(tmp.path().join("stock_out.csv")).unwrap();
    let last = content.lines().last().unwrap();
    assert!(last.ends_with(",WHEA01,,10"), "{last}");
    assert!(!last.starts_with(','), "date should be filled: {last}");
}

#[test]
fn record_rejects_bad_input() {
    let tmp = workspace(Some("kitchen"));
    assert_eq!(run(tmp.path(), &["record", "in", "WHEA01"]).status.code(), Some(2));
    assert_eq!(run(tmp.path(), &["record", "in", "RM ID=WHEA01", "Quantity=-3"]).status.code(), Some(2));
    assert_eq!(run(tmp.path(), &["record", "in", "Quantity=3"]).status.code(), Some(2));
    assert_eq!(run(tmp.path(), &["record", "sideways", "RM ID=A"]).status.code(), Some(2));

    let content = fs::read_to_string(tmp.path().join("stock_in.csv")).unwrap();
    assert_eq!(content.lines().count(), 8);
}

#[test]
fn record_writes_quantity_under_the_files_alias_column() {
    let tmp = workspace(Some("kitchen"));
    fs::write(
        tmp.path().join("stock_in.csv"),
        "Date,RM ID,Product Name,Quantity In\n05/01/2026,WHEA01,Wheat Flour,100\n",
    )
    .unwrap();

    let output = run(tmp.path(), &["record", "in", "RM ID=WHEA01", "Quantity=25", "--date", "09 Jan 2026"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "WHEA01: 40.00 -> 65.00 kg (warning)");

    let content = fs::read_to_string(tmp.path().join("stock_in.csv")).unwrap();
    assert!(content.ends_with("09 Jan 2026,WHEA01,,25\n"), "{content}");
}

#[test]
fn record_without_a_quantity_column_exits_2() {
    let tmp = workspace(Some("kitchen"));
    let before = "Date,RM ID,Qty\n".to_string();
    fs::write(tmp.path().join("stock_in.csv"), &before).unwrap();

    let output = run(tmp.path(), &["record", "in", "RM ID=WHEA01", "Quantity=25"]);
    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("hint:"));
    assert_eq!(fs::read_to_string(tmp.path().join("stock_in.csv")).unwrap(), before);
}

#[test]
fn record_into_headerless_file_exits_4() {
    let tmp = workspace(Some("kitchen"));
    fs::write(tmp.path().join("stock_out.csv"), "").unwrap();
    let output = run(tmp.path(), &["record", "out", "RM ID=WHEA01", "Quantity Out=1"]);
    assert_eq!(output.status.code(), Some(4));
}
