//! CLI integration tests
//!
//! Tests the pcli binary using assert_cmd, against a mock service where a
//! server is needed.

use assert_cmd::assert::{Assert, OutputAssertExt};
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// pcli with a private home directory
fn pcli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pcli")
        .expect("Failed to locate pcli binary - ensure it's built before running tests");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("PROPEL_URL")
        .env_remove("RUST_LOG");
    cmd
}

/// Run a blocking command while the mock server keeps serving
async fn run(mut cmd: Command) -> Assert {
    let output = tokio::task::spawn_blocking(move || cmd.output())
        .await
        .unwrap()
        .unwrap();
    output.assert()
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    pcli(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pcli"))
        .stdout(predicate::str::contains("Propel agent service"));
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    pcli(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pcli"));
}

#[test]
fn test_cli_agents_help() {
    let home = TempDir::new().unwrap();
    pcli(&home)
        .args(["agents", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ensure-deleted"))
        .stdout(predicate::str::contains("deploy"));
}

#[test]
fn test_cli_unknown_command() {
    let home = TempDir::new().unwrap();
    pcli(&home)
        .arg("nonexistent-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_cli_call_without_credentials() {
    let home = TempDir::new().unwrap();
    pcli(&home)
        .args(["--url", "http://127.0.0.1:9", "call", "/v1/models"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No credentials found! Please, login first!"));
}

#[test]
fn test_cli_call_invalid_payload() {
    let home = TempDir::new().unwrap();
    pcli(&home)
        .args(["call", "/v1/completions", "{not json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("payload not a valid json!"));
}

#[test]
fn test_cli_config_path_follows_flag() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    pcli(&home)
        .args(["--config", config.to_str().unwrap(), "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.toml"));
}

#[test]
fn test_cli_config_show_reads_file() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, "base_url = \"http://from-file\"\n").unwrap();

    pcli(&home)
        .args(["--config", config.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://from-file"));
}

#[tokio::test]
async fn test_cli_login_then_seats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api2/token-auth/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "t0k"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api2/seats"))
        .and(header("Authorization", "Token t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"n_available": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();

    let mut login = pcli(&home);
    login.args(["--url", &server.uri(), "login", "-u", "user", "-p", "secret"]);
    run(login)
        .await
        .success()
        .stdout(predicate::str::contains("Logged in"));
    assert!(home.path().join(".pcli").join("creds.json").exists());

    let mut seats = pcli(&home);
    seats.args(["--url", &server.uri(), "seats", "ensure"]);
    run(seats)
        .await
        .success()
        .stdout(predicate::str::contains("Seats are ok: 3"));
}

#[tokio::test]
async fn test_cli_failed_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api2/token-auth/"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut login = pcli(&home);
    login.args(["--url", &server.uri(), "login", "-u", "user", "-p", "wrong"]);
    run(login)
        .await
        .code(1)
        .stderr(predicate::str::contains("Login failed"));
}

#[tokio::test]
async fn test_cli_ensure_deleted_on_missing_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api2/agents/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"detail":"Not found."}"#))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let creds = home.path().join(".pcli");
    std::fs::create_dir_all(&creds).unwrap();
    std::fs::write(creds.join("creds.json"), r#"{"Authorization":"Token t0k"}"#).unwrap();

    let mut cmd = pcli(&home);
    cmd.args(["--url", &server.uri(), "agents", "ensure-deleted", "ghost"]);
    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("[Agent: ghost] already deleted"));
}

#[cfg(unix)]
#[test]
fn test_cli_service_deploy_with_non_utf8_environment() {
    use std::ffi::OsString;
    use std::os::unix::ffi::OsStringExt;

    let home = TempDir::new().unwrap();
    let service = home.path().join("service");
    std::fs::create_dir_all(&service).unwrap();
    std::fs::write(
        service.join("service.yaml"),
        "name: svc\n---\nconfig:\n  rpc: ${RPC:str:http://localhost}\n",
    )
    .unwrap();

    pcli(&home)
        .env("RPC", "http://rpc")
        .env("UNRELATED_BINARY", OsString::from_vec(vec![0xff, 0xfe]))
        .args(["--url", "http://127.0.0.1:9", "service", "deploy", "--keys", "1", "--name", "svc"])
        .arg("--service-dir")
        .arg(&service)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("panicked").not())
        .stderr(predicate::str::contains("No credentials found"));
}

#[tokio::test]
async fn test_cli_stop_prints_reply() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api2/agents/a/stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"agent_state": "STOPPING"})))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let creds = home.path().join(".pcli");
    std::fs::create_dir_all(&creds).unwrap();
    std::fs::write(creds.join("creds.json"), r#"{"Authorization":"Token t0k"}"#).unwrap();

    let mut cmd = pcli(&home);
    cmd.args(["--url", &server.uri(), "agents", "stop", "a"]);
    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains("[Agent: a] stop triggered."))
        .stdout(predicate::str::contains("STOPPING"));
}
