#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HANDLE: &str = "alice.test";
pub const DID: &str = "did:plc:alice";
pub const COLLECTION: &str = "org.tern.test.record";

/// Runs the CLI with every lookup pointed at `server` and state kept in
/// `data_dir`.
pub async fn run_cli(server: &MockServer, data_dir: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tern"));
    cmd.args(args)
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--plc-directory")
        .arg(server.uri())
        .arg("--doh-endpoint")
        .arg(format!("{}/dns-query", server.uri()))
        .env_remove("TERN_PASSWORD")
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "warn");
    tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute CLI"))
        .await
        .unwrap()
}

pub async fn run_cli_success(server: &MockServer, data_dir: &Path, args: &[&str]) -> String {
    let output = run_cli(server, data_dir, args).await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub async fn run_cli_failure(server: &MockServer, data_dir: &Path, args: &[&str]) -> String {
    let output = run_cli(server, data_dir, args).await;
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Serves the handle's TXT record and its PLC document, naming `server` as
/// the PDS.
pub async fn mount_identity(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/dns-query"))
        .and(query_param("name", format!("_atproto.{}", HANDLE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Status": 0,
            "Answer": [{"type": 16, "data": format!("\"did={}\"", DID)}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}", DID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": DID,
            "alsoKnownAs": [format!("at://{}", HANDLE)],
            "service": [{
                "id": "#atproto_pds",
                "type": "AtprotoPersonalDataServer",
                "serviceEndpoint": server.uri()
            }]
        })))
        .mount(server)
        .await;
}

/// Accepts any password for the handle. The access token carries no expiry.
pub async fn mount_create_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/xrpc/com.atproto.server.createSession"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "did": DID,
            "handle": HANDLE,
            "accessJwt": "access-token",
            "refreshJwt": "refresh-token"
        })))
        .mount(server)
        .await;
}

pub fn sessions_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("sessions")
}
