//! Integration tests for the tbom CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const NETLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<export version="D">
  <design>
    <source>/home/me/amp/amp.sch</source>
    <date>Wed 01 May 2024 10:00:00</date>
    <sheet number="1" name="/" tstamps="/">
      <title_block>
        <title>Amp</title>
        <rev>B</rev>
        <date>2024-05-01</date>
      </title_block>
    </sheet>
  </design>
  <components>
    <comp ref="R2">
      <value>10k</value>
      <fields><field name="internal_part">RES-10K</field></fields>
    </comp>
    <comp ref="R1">
      <value>10k</value>
      <fields><field name="internal_part">RES-10K</field></fields>
    </comp>
    <comp ref="C1">
      <value>100n</value>
      <fields><field name="internal_part">CAP-100N</field></fields>
    </comp>
    <comp ref="D1">
      <value>RED</value>
      <fields><field name="internal_part">LED-RED</field></fields>
    </comp>
    <comp ref="TP1">
      <value>TP</value>
    </comp>
  </components>
</export>
"#;

/// Helper to get a tbom command
///
/// The user config directory points somewhere empty so a developer's own
/// `config.yaml` never leaks into a test.
fn tbom() -> Command {
    let home = std::env::temp_dir().join("tbom-tests-no-home");
    let mut cmd = Command::cargo_bin("tbom").unwrap();
    cmd.env_remove("TBOM_FIELD")
        .env_remove("TBOM_TABLE")
        .env_remove("TBOM_KEY_COLUMN")
        .env_remove("TBOM_LOG")
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("APPDATA", &home);
    cmd
}

/// Temp directory holding `amp.xml` and `parts.sqlite`
struct Fixture {
    tmp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("amp.xml"), NETLIST).unwrap();

        let conn = Connection::open(tmp.path().join("parts.sqlite")).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE parts (internal_part TEXT, description TEXT, datasheet TEXT, unit_price REAL);
            INSERT INTO parts VALUES ('RES-10K', 'Resistor 10k 1%', 'res.pdf', 0.01);
            INSERT INTO parts VALUES ('CAP-100N', 'Capacitor 100n', NULL, 0.02);
            "#,
        )
        .unwrap();

        Self { tmp }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    fn arg(&self, name: &str) -> String {
        self.path(name).display().to_string()
    }

    fn generate(&self) -> Command {
        let mut cmd = tbom();
        cmd.current_dir(self.tmp.path()).args([
            "generate",
            self.arg("amp.xml").as_str(),
            self.arg("amp").as_str(),
            self.arg("parts.sqlite").as_str(),
        ]);
        cmd
    }
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help_displays() {
    tbom()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("inspect"))
        .stdout(predicate::str::contains("columns"));
}

#[test]
fn test_version_displays() {
    tbom()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tbom"));
}

#[test]
fn test_unknown_command_fails() {
    tbom().arg("frobnicate").assert().failure();
}

#[test]
fn test_generate_requires_positional_args() {
    tbom().args(["generate", "amp.xml"]).assert().failure();
}

// ============================================================================
// Generate Tests
// ============================================================================

#[test]
fn test_generate_writes_csv_html_and_stylesheet() {
    let fx = Fixture::new();
    fx.generate()
        .assert()
        .success()
        .stdout(predicate::str::contains("BOM written to"));

    assert!(fx.path("amp.csv").is_file());
    assert!(fx.path("amp.html").is_file());
    assert!(fx.path("style.css").is_file());
    assert!(!fx.path("amp.md").exists());
}

#[test]
fn test_generate_csv_contents() {
    let fx = Fixture::new();
    fx.generate().assert().success();

    let csv = fs::read_to_string(fx.path("amp.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Quantity,Reference(s),Internal Part,Description,Datasheet,Unit Price",
            "1,C1,CAP-100N,Capacitor 100n,,0.02",
            "2,\"R2, R1\",RES-10K,Resistor 10k 1%,res.pdf,0.01",
        ]
    );
}

#[test]
fn test_generate_reports_unresolved_and_missing() {
    let fx = Fixture::new();
    fx.generate()
        .assert()
        .success()
        .stdout(predicate::str::contains("Line items:      2"))
        .stdout(predicate::str::contains("Part references: 5"))
        .stdout(predicate::str::contains("reference(s) without internal_part field: TP1"))
        .stdout(predicate::str::contains("LED-RED not in catalog: D1"));

    let html = fs::read_to_string(fx.path("amp.html")).unwrap();
    assert!(html.contains("TP1"));
    assert!(html.contains("LED-RED"));
}

#[test]
fn test_generate_html_title_and_stylesheet_link() {
    let fx = Fixture::new();
    fx.generate().assert().success();

    let html = fs::read_to_string(fx.path("amp.html")).unwrap();
    assert!(html.contains("Bill of Materials: Amp vB"));
    assert!(html.contains("style.css"));
    assert!(html.contains("<th"));
}

#[test]
fn test_generate_trailing_layout() {
    let fx = Fixture::new();
    fx.generate()
        .args(["--format", "csv", "--layout", "trailing"])
        .assert()
        .success();

    let csv = fs::read_to_string(fx.path("amp.csv")).unwrap();
    assert!(csv.starts_with("Internal Part,Description,Datasheet,Unit Price,Quantity,Reference(s)\n"));
}

#[test]
fn test_generate_markdown_and_json() {
    let fx = Fixture::new();
    fx.generate()
        .args(["--format", "md,json"])
        .assert()
        .success();

    assert!(!fx.path("amp.csv").exists());
    assert!(!fx.path("style.css").exists());

    let md = fs::read_to_string(fx.path("amp.md")).unwrap();
    assert!(md.starts_with("# Bill of Materials: Amp vB"));
    assert!(md.contains("| Quantity |"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fx.path("amp.json")).unwrap()).unwrap();
    assert_eq!(json["summary"]["total_references"], 5);
    assert_eq!(json["summary"]["unresolved"][0], "TP1");
    assert_eq!(json["summary"]["missing"][0]["part_id"], "LED-RED");
}

#[test]
fn test_generate_visible_columns_and_link() {
    let fx = Fixture::new();
    fx.generate()
        .arg(fx.arg("sheets"))
        .args([
            "--format",
            "html",
            "--visible-columns",
            "0,1,2",
            "--link-column",
            "internal_part",
            "--link-target-column",
            "datasheet",
        ])
        .assert()
        .success();

    let html = fs::read_to_string(fx.path("amp.html")).unwrap();
    assert!(html.contains("class=\"hide\""));
    assert!(html.contains("res.pdf\""));
}

#[test]
fn test_generate_visible_column_out_of_range_fails() {
    let fx = Fixture::new();
    fx.generate()
        .args(["--visible-columns", "0,42"])
        .assert()
        .failure();

    assert!(!fx.path("amp.csv").exists());
}

#[test]
fn test_generate_no_stylesheet() {
    let fx = Fixture::new();
    fx.generate().arg("--no-stylesheet").assert().success();

    assert!(fx.path("amp.html").is_file());
    assert!(!fx.path("style.css").exists());
}

#[test]
fn test_generate_quiet_prints_only_dropped_references() {
    let fx = Fixture::new();
    fx.generate()
        .args(["--quiet", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reference(s) without internal_part field: TP1"))
        .stdout(predicate::str::contains("LED-RED not in catalog: D1"))
        .stdout(predicate::str::contains("BOM written").not())
        .stdout(predicate::str::contains("Line items").not());

    assert!(fx.path("amp.csv").is_file());
}

#[test]
fn test_generate_quiet_clean_run_prints_nothing() {
    let fx = Fixture::new();
    fs::write(
        fx.path("clean.xml"),
        r#"<export><components>
  <comp ref="R1"><fields><field name="internal_part">RES-10K</field></fields></comp>
</components></export>"#,
    )
    .unwrap();

    tbom()
        .args([
            "generate",
            fx.arg("clean.xml").as_str(),
            fx.arg("clean").as_str(),
            fx.arg("parts.sqlite").as_str(),
            "--quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_generate_datasheet_dir_links_datasheet_column() {
    let fx = Fixture::new();
    fx.generate()
        .arg(fx.arg("sheets"))
        .assert()
        .success();

    let html = fs::read_to_string(fx.path("amp.html")).unwrap();
    let href = format!("<a href=\"{}/res.pdf\">res.pdf</a>", fx.arg("sheets"));
    assert!(html.contains(&href), "missing {} in {}", href, html);
    assert_eq!(html.matches("<a href").count(), 1);
}

#[test]
fn test_generate_datasheet_dir_without_datasheet_column_warns() {
    let fx = Fixture::new();
    let conn = Connection::open(fx.path("parts.sqlite")).unwrap();
    conn.execute_batch("CREATE TABLE bare (internal_part TEXT); INSERT INTO bare VALUES ('RES-10K');")
        .unwrap();
    drop(conn);

    fx.generate()
        .arg(fx.arg("sheets"))
        .args(["--table", "bare"])
        .assert()
        .success()
        .stderr(predicate::str::contains("datasheet directory unused"));

    let html = fs::read_to_string(fx.path("amp.html")).unwrap();
    assert!(!html.contains("<a href"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_generate_reads_user_config() {
    let fx = Fixture::new();
    let config_dir = fx.path("xdg").join("tbom");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.yaml"), "formats: [json]\n").unwrap();

    fx.generate()
        .env("XDG_CONFIG_HOME", fx.path("xdg"))
        .assert()
        .success();

    assert!(fx.path("amp.json").is_file());
    assert!(!fx.path("amp.csv").exists());
}

#[test]
fn test_generate_custom_table_and_key_column() {
    let fx = Fixture::new();
    let conn = Connection::open(fx.path("parts.sqlite")).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE inventory (mpn TEXT, stock INTEGER);
        INSERT INTO inventory VALUES ('RES-10K', 500);
        "#,
    )
    .unwrap();
    drop(conn);

    fx.generate()
        .args(["--table", "inventory", "--key-column", "mpn", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CAP-100N not in catalog: C1"));

    let csv = fs::read_to_string(fx.path("amp.csv")).unwrap();
    assert_eq!(csv, "Quantity,Reference(s),Mpn,Stock\n2,\"R2, R1\",RES-10K,500\n");
}

#[test]
fn test_generate_env_field() {
    let fx = Fixture::new();
    fx.generate()
        .env("TBOM_FIELD", "mpn")
        .args(["--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 reference(s) without mpn field"));

    let csv = fs::read_to_string(fx.path("amp.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

#[test]
fn test_generate_config_file() {
    let fx = Fixture::new();
    fs::write(fx.path("tbom.yaml"), "formats: [md]\nlayout: trailing\n").unwrap();

    fx.generate()
        .args(["--config", fx.arg("tbom.yaml").as_str()])
        .assert()
        .success();

    assert!(fx.path("amp.md").is_file());
    assert!(!fx.path("amp.csv").exists());
}

#[test]
fn test_generate_bad_config_fails() {
    let fx = Fixture::new();
    fs::write(fx.path("tbom.yaml"), "colour: red\n").unwrap();

    fx.generate()
        .args(["--config", fx.arg("tbom.yaml").as_str()])
        .assert()
        .failure();
}

#[test]
fn test_generate_missing_catalog_fails() {
    let fx = Fixture::new();
    tbom()
        .args([
            "generate",
            fx.arg("amp.xml").as_str(),
            fx.arg("amp").as_str(),
            fx.arg("nope.sqlite").as_str(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.sqlite"));

    assert!(!fx.path("amp.csv").exists());
    assert!(!fx.path("nope.sqlite").exists());
}

#[test]
fn test_generate_missing_table_fails() {
    let fx = Fixture::new();
    fx.generate()
        .args(["--table", "components"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("components"));
}

#[test]
fn test_generate_malformed_netlist_fails() {
    let fx = Fixture::new();
    fs::write(fx.path("amp.xml"), "<export><components><comp ref=\"R1\">").unwrap();

    fx.generate().assert().failure();

    assert!(!fx.path("amp.csv").exists());
    assert!(!fx.path("amp.html").exists());
}

#[test]
fn test_generate_missing_netlist_fails() {
    let fx = Fixture::new();
    fs::remove_file(fx.path("amp.xml")).unwrap();

    fx.generate().assert().failure();
}

#[test]
fn test_generate_strict() {
    let fx = Fixture::new();
    fx.generate()
        .arg("--strict")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 reference(s) unresolved"));

    // Files are still written so the partial BOM can be inspected
    assert!(fx.path("amp.csv").is_file());
}

#[test]
fn test_generate_strict_clean_run_succeeds() {
    let fx = Fixture::new();
    fs::write(
        fx.path("clean.xml"),
        r#"<export><components>
  <comp ref="R1"><fields><field name="internal_part">RES-10K</field></fields></comp>
</components></export>"#,
    )
    .unwrap();

    tbom()
        .args([
            "generate",
            fx.arg("clean.xml").as_str(),
            fx.arg("clean").as_str(),
            fx.arg("parts.sqlite").as_str(),
            "--strict",
        ])
        .assert()
        .success();
}

// ============================================================================
// Inspect / Columns Tests
// ============================================================================

#[test]
fn test_inspect_shows_groups() {
    let fx = Fixture::new();
    tbom()
        .args(["inspect", fx.arg("amp.xml").as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Amp"))
        .stdout(predicate::str::contains("RES-10K"))
        .stdout(predicate::str::contains("R2, R1"))
        .stdout(predicate::str::contains("TP1"));
}

#[test]
fn test_inspect_quiet_is_tab_separated() {
    let fx = Fixture::new();
    tbom()
        .args(["inspect", fx.arg("amp.xml").as_str(), "--quiet"])
        .assert()
        .success()
        .stdout("RES-10K\t2\nCAP-100N\t1\nLED-RED\t1\n");
}

#[test]
fn test_columns_lists_header() {
    let fx = Fixture::new();
    tbom()
        .args(["columns", fx.arg("parts.sqlite").as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rows"))
        .stdout(predicate::str::contains("Unit Price"))
        .stdout(predicate::str::contains("unit_price"));
}

#[test]
fn test_columns_quiet() {
    let fx = Fixture::new();
    tbom()
        .args(["columns", fx.arg("parts.sqlite").as_str(), "--quiet"])
        .assert()
        .success()
        .stdout("0\tQuantity\n1\tReference(s)\n2\tInternal Part\n3\tDescription\n4\tDatasheet\n5\tUnit Price\n");
}

#[test]
fn test_completions_bash() {
    tbom()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tbom"));
}
