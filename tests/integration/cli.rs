use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary with its configuration pointed at a private, absent file.
fn netmap_sync(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("netmap-sync").unwrap();
    cmd.env("NETMAP_SYNC_CONFIG", temp.path().join("config.toml"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_place_center_label() {
    let temp = TempDir::new().unwrap();
    netmap_sync(&temp)
        .args(["place", "--from", "0,0", "--to", "1100,0", "--percent", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("550,0"));
}

#[test]
fn test_place_uses_configured_percent() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "label_percent = 0\n").unwrap();

    netmap_sync(&temp)
        .args(["place", "--from", "0,0", "--to", "1100,0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("400,0"));
}

#[test]
fn test_place_json_output() {
    let temp = TempDir::new().unwrap();
    let output = netmap_sync(&temp)
        .args(["place", "--from", "0,0", "--to", "1100,0", "--percent", "50", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["x"], 550.0);
    assert_eq!(json["y"], 0.0);
    assert_eq!(json["location"], "center");
}

#[test]
fn test_place_rejects_invalid_percent() {
    let temp = TempDir::new().unwrap();
    netmap_sync(&temp)
        .args(["place", "--from", "0,0", "--to", "1100,0", "--percent", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("percent"));
}

#[test]
fn test_config_init_and_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");

    netmap_sync(&temp)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    netmap_sync(&temp).args(["config", "init"]).assert().success();
    assert!(path.exists());

    netmap_sync(&temp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("label_percent = 50"));
}

#[test]
fn test_simulate_small_run() {
    let temp = TempDir::new().unwrap();
    netmap_sync(&temp)
        .args(["simulate", "--views", "2", "--nodes", "3", "--rounds", "1"])
        .args(["--period-ms", "10", "--telemetry"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Link labels"))
        .stdout(predicate::str::contains("closed map#2"));
}
