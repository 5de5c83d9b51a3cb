use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join("stacks").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

#[test]
fn cli_renders_pdf_smoke() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("out.pdf");

    let exe = assert_cmd::cargo_bin!("strata-cli");
    Command::new(exe)
        .args([
            "render",
            "--title",
            "pin cell",
            "--out",
            out.to_string_lossy().as_ref(),
            fixture("pin_cell.json").to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let bytes = fs::read(&out).expect("read pdf");
    assert!(bytes.starts_with(b"%PDF-"), "output is not a PDF");
    assert!(String::from_utf8_lossy(&bytes).contains("(pin cell)"));
}

#[test]
fn cli_writes_pdf_next_to_the_input_by_default() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("draft.yaml");
    fs::copy(fixture("unverified.yaml"), &input).expect("copy fixture");

    let exe = assert_cmd::cargo_bin!("strata-cli");
    Command::new(exe)
        .arg(input.to_string_lossy().as_ref())
        .assert()
        .success();

    let bytes = fs::read(input.with_extension("pdf")).expect("read pdf");
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn cli_renders_svg_to_stdout_with_config() {
    let config = repo_root()
        .join("fixtures")
        .join("config")
        .join("narrow.yaml");
    let exe = assert_cmd::cargo_bin!("strata-cli");
    let output = Command::new(exe)
        .args([
            "render",
            "--format",
            "svg",
            "--config",
            config.to_string_lossy().as_ref(),
            fixture("pin_cell.json").to_string_lossy().as_ref(),
        ])
        .output()
        .expect("run");
    assert!(output.status.success());
    let svg = String::from_utf8(output.stdout).expect("utf-8");
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("HF dip"));
}

#[test]
fn cli_layout_prints_json_from_stdin() {
    let exe = assert_cmd::cargo_bin!("strata-cli");
    let output = assert_cmd::Command::new(exe)
        .arg("layout")
        .write_stdin(r#"[{"thickness": 500, "color": "orange", "comments": "absorber", "verified": true}]"#)
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["layers"][0]["name"], "absorber");
    assert!(value["size"]["width"].as_f64().unwrap() > 0.0);
    assert_eq!(value["placement"]["labels"][0]["kind"], "direct");
}

#[test]
fn cli_reports_invalid_layers() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("bad.pdf");
    let exe = assert_cmd::cargo_bin!("strata-cli");
    let output = assert_cmd::Command::new(exe)
        .args(["--out", out.to_string_lossy().as_ref(), "-"])
        .write_stdin("- thickness: 100\n  color: octarine\n  comments: x\n")
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid layer #0"));
    assert!(!out.exists());
}

#[test]
fn cli_usage_errors_exit_with_2() {
    let exe = assert_cmd::cargo_bin!("strata-cli");
    Command::new(exe)
        .args(["render", "--format", "png"])
        .assert()
        .code(2);
}
