use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn okpicker(config_dir: &std::path::Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_okpicker"));
    command
        .env("OKPICKER_CONFIG_DIR", config_dir)
        .env_remove("OKPICKER_CONFIG")
        .env("RUST_LOG", "warn");
    command
}

#[test]
fn cpu_export_writes_png() {
    let root = TempDir::new().unwrap();
    let output = root.path().join("out").join("square.png");

    let status = okpicker(root.path())
        .args(["export", "--backend", "cpu", "--size", "32x24", "--hue", "140", "--output"])
        .arg(&output)
        .status()
        .expect("failed to run okpicker export");

    assert!(status.success());
    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn config_init_then_check() {
    let root = TempDir::new().unwrap();

    let init = okpicker(root.path())
        .args(["config", "init"])
        .status()
        .expect("failed to run okpicker config init");
    assert!(init.success());
    assert!(root.path().join("okpicker.toml").exists());

    let again = okpicker(root.path())
        .args(["config", "init"])
        .status()
        .expect("failed to rerun okpicker config init");
    assert!(!again.success());

    let check = okpicker(root.path())
        .args(["config", "check"])
        .output()
        .expect("failed to run okpicker config check");
    assert!(check.status.success());
    let stdout = String::from_utf8_lossy(&check.stdout);
    assert!(stdout.contains("Configuration OK"));
}

#[test]
fn config_check_rejects_invalid_file() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("okpicker.toml"),
        "version = 1\n[ring]\nlightness = 1.5\n",
    )
    .unwrap();

    let check = okpicker(root.path())
        .args(["config", "check"])
        .output()
        .expect("failed to run okpicker config check");
    assert!(!check.status.success());
    let stderr = String::from_utf8_lossy(&check.stderr);
    assert!(stderr.contains("ring.lightness"));
}

#[test]
fn probe_reports_json() {
    let root = TempDir::new().unwrap();

    let inside = okpicker(root.path())
        .args(["probe", "0.6", "0.05", "--json"])
        .output()
        .expect("failed to run okpicker probe");
    assert!(inside.status.success());
    let stdout = String::from_utf8_lossy(&inside.stdout);
    assert!(stdout.contains("\"in_gamut\": true"));
    assert!(stdout.contains("\"hex\": \"#"));

    let outside = okpicker(root.path())
        .args(["probe", "0.05", "0.95", "--json"])
        .output()
        .expect("failed to run okpicker probe");
    assert!(outside.status.success());
    let stdout = String::from_utf8_lossy(&outside.stdout);
    assert!(stdout.contains("\"in_gamut\": false"));
    assert!(stdout.contains("\"hex\": null"));
}

#[test]
fn probe_rejects_out_of_range_point() {
    let root = TempDir::new().unwrap();
    let status = okpicker(root.path())
        .args(["probe", "1.5", "0.5"])
        .status()
        .expect("failed to run okpicker probe");
    assert!(!status.success());
}
