//! CLI Integration Tests
//!
//! These tests run the compiled binary against the built-in demo household
//! and a throwaway config directory, so no Home Assistant is needed.
//!
//! ```
//! cargo test --package solarflow-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

/// Run solarflow with a private config file and no inherited credentials.
fn run_solarflow(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_solarflow"))
        .args(args)
        .env("SOLARFLOW_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("SOLARFLOW_HA_URL")
        .env_remove("SOLARFLOW_HA_TOKEN")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute solarflow binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ==================== Help and version ====================

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_solarflow(&dir.path().join("config.toml"), &["--help"]);
    assert!(output.status.success());

    let text = stdout(&output);
    for command in ["read", "watch", "config", "completions"] {
        assert!(text.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_solarflow(&dir.path().join("config.toml"), &["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_solarflow(&dir.path().join("config.toml"), &["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("solarflow"));
}

// ==================== Config ====================

#[test]
fn test_config_path_uses_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    let output = run_solarflow(&path, &["config", "path"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), path.display().to_string());
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let output = run_solarflow(&path, &["config", "init"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(path.exists());

    let again = run_solarflow(&path, &["config", "init"]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));

    let show = run_solarflow(&path, &["config", "show"]);
    assert!(show.status.success());
    let text = stdout(&show);
    assert!(text.contains("[home_assistant]"));
    assert!(text.contains("homeassistant.local"));
}

#[test]
fn test_config_show_redacts_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[home_assistant]\nurl = \"http://ha.lan:8123\"\ntoken = \"super-secret\"\n",
    )
    .unwrap();

    let output = run_solarflow(&path, &["config", "show"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("http://ha.lan:8123"));
    assert!(!text.contains("super-secret"));
}

// ==================== Read ====================

#[test]
fn test_read_demo_text() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_solarflow(&dir.path().join("config.toml"), &["read", "--demo", "-q"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert!(text.contains("Solar"));
    assert!(text.contains("Battery"));
    assert!(text.contains("Grid"));
}

#[test]
fn test_read_honours_no_color_convention() {
    let dir = tempfile::tempdir().unwrap();
    for value in ["1", "yes", "true"] {
        let output = Command::new(env!("CARGO_BIN_EXE_solarflow"))
            .args(["read", "--demo", "-q"])
            .env("SOLARFLOW_CONFIG", dir.path().join("config.toml"))
            .env("NO_COLOR", value)
            .env_remove("SOLARFLOW_HA_URL")
            .env_remove("SOLARFLOW_HA_TOKEN")
            .output()
            .expect("Failed to execute solarflow binary");
        assert!(
            output.status.success(),
            "NO_COLOR={value}: {}",
            stderr(&output)
        );
        assert!(!stdout(&output).contains('\x1b'), "NO_COLOR={value} left escapes");
    }
}

#[test]
fn test_read_demo_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_solarflow(
        &dir.path().join("config.toml"),
        &["read", "--demo", "-q", "-f", "json"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert!(json["solar_power"].is_i64());
    assert!(json["battery_level"].as_u64().unwrap() <= 100);
    assert!(json["self_sufficiency"].as_u64().unwrap() <= 100);
    assert!(json["flows"].is_array());
    assert!(json["timestamp"].is_string());
}

#[test]
fn test_read_demo_csv_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("reading.csv");
    let output = run_solarflow(
        &dir.path().join("config.toml"),
        &["read", "--demo", "-q", "-f", "csv", "-o", out.to_str().unwrap()],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let content = std::fs::read_to_string(&out).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().starts_with("timestamp,solar_w,"));
    assert_eq!(lines.count(), 1);
}

#[test]
fn test_read_without_token_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_solarflow(&dir.path().join("config.toml"), &["read"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("SOLARFLOW_HA_TOKEN"));
}

// ==================== Watch ====================

#[test]
fn test_watch_demo_csv_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[dashboard]\ndemo_interval_secs = 1\n").unwrap();

    let output = run_solarflow(&config, &["watch", "--demo", "-q", "-n", "2", "-f", "csv"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "header plus two rows: {text}");
    assert!(lines[0].starts_with("timestamp,"));
}

#[test]
fn test_watch_demo_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[dashboard]\ndemo_interval_secs = 1\n").unwrap();

    let output = run_solarflow(&config, &["watch", "--demo", "-q", "-n", "1", "-f", "json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    assert_eq!(text.lines().count(), 1);
    let json: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert!(json["house_consumption"].is_i64());
}
