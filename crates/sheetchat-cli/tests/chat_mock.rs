use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_sheet(dir: &TempDir, name: &str, len: usize) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, vec![b'x'; len]).unwrap();
    path
}

async fn mount_upload(server: &MockServer, room_id: &str) {
    Mock::given(method("POST"))
        .and(path("/upload_file/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": ".XLSX file uploaded and processed",
            "room_id": room_id
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_status_prints_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "message": "Excel Chat AI Backend is running" }),
        ))
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Excel Chat AI Backend is running"));
}

#[tokio::test]
async fn test_base_url_flag_beats_env() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "message": "up" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", "http://127.0.0.1:1")
        .args(["status", "--base-url", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("up"));
}

#[tokio::test]
async fn test_upload_prints_session_id() {
    let server = MockServer::start().await;
    mount_upload(&server, "r1").await;
    let home = tempdir().unwrap();
    let sheet = write_sheet(&home, "data.xlsx", 2048);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("upload")
        .arg(&sheet)
        .assert()
        .success()
        .stdout(predicate::str::contains("r1"))
        .stderr(predicate::str::contains("File \"data.xlsx\" selected successfully"))
        .stderr(predicate::str::contains("data.xlsx (2.00 KB)"))
        .stderr(predicate::str::contains("Starting chat with your data..."));
}

#[tokio::test]
async fn test_upload_rejects_wrong_type_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_file/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();
    let notes = write_sheet(&home, "notes.txt", 10);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("upload")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid file type"));
}

#[tokio::test]
async fn test_upload_rejects_csv_when_disabled() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    fs::write(
        home.path().join("config.toml"),
        "[upload]\naccept_csv = false\n",
    )
    .unwrap();
    let csv = write_sheet(&home, "rows.csv", 10);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("upload")
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains(".xlsx or .xls"));
}

#[tokio::test]
async fn test_upload_rejects_oversized_file() {
    let server = MockServer::start().await;
    let home = tempdir().unwrap();
    let sheet = write_sheet(&home, "big.xlsx", 10 * 1024 * 1024 + 1);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("upload")
        .arg(&sheet)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File too large"));
}

#[tokio::test]
async fn test_upload_failure_reports_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload_file/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            serde_json::json!({ "error": "Only .xlsx, .xls, .csv files are supported" }),
        ))
        .mount(&server)
        .await;
    let home = tempdir().unwrap();
    let sheet = write_sheet(&home, "data.xlsx", 64);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("upload")
        .arg(&sheet)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Upload failed: HTTP 400: Only .xlsx, .xls, .csv files are supported",
        ));
}

#[tokio::test]
async fn test_chat_answers_and_exits_on_quit() {
    let server = MockServer::start().await;
    mount_upload(&server, "r1").await;
    Mock::given(method("POST"))
        .and(path("/query/"))
        .and(body_json(serde_json::json!({
            "query": "Which supplier had the highest spend?",
            "room_id": "r1"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "Acme Corp" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();
    let sheet = write_sheet(&home, "data.xlsx", 2048);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("chat")
        .arg(&sheet)
        .write_stdin("Which supplier had the highest spend?\n:q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Session: r1"))
        .stdout(predicate::str::contains("Ask me anything about your uploaded data."))
        .stdout(predicate::str::contains("Assistant: Acme Corp"))
        .stdout(predicate::str::contains("Goodbye!"));
}

#[tokio::test]
async fn test_chat_skips_blank_lines() {
    let server = MockServer::start().await;
    mount_upload(&server, "r1").await;
    Mock::given(method("POST"))
        .and(path("/query/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "Got it" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();
    let sheet = write_sheet(&home, "data.xlsx", 128);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("chat")
        .arg(&sheet)
        .write_stdin("\n   \ntest\n:q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Assistant: Got it"));
}

#[tokio::test]
async fn test_chat_continuation_line_sends_multiline_query() {
    let server = MockServer::start().await;
    mount_upload(&server, "r1").await;
    Mock::given(method("POST"))
        .and(path("/query/"))
        .and(body_json(serde_json::json!({
            "query": "List purchases\nby commodity",
            "room_id": "r1"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "Steel: 3" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();
    let sheet = write_sheet(&home, "data.xlsx", 128);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("chat")
        .arg(&sheet)
        .write_stdin("List purchases\\\nby commodity\n:q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Assistant: Steel: 3"));
}

#[tokio::test]
async fn test_chat_error_shows_apology_and_continues() {
    let server = MockServer::start().await;
    mount_upload(&server, "r1").await;
    Mock::given(method("POST"))
        .and(path("/query/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();
    let sheet = write_sheet(&home, "data.xlsx", 128);

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .arg("chat")
        .arg(&sheet)
        .write_stdin("x\nx again\n:q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Assistant: Sorry, an error occurred while fetching the answer.",
        ))
        .stdout(predicate::str::contains("You: x again"))
        .stdout(predicate::str::contains("Goodbye!"));
}

#[tokio::test]
async fn test_ask_prints_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/"))
        .and(body_json(serde_json::json!({ "query": "total spend?", "room_id": "abc" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "answer": "42" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .args(["ask", "--room", "abc", "total spend?"])
        .assert()
        .success()
        .stdout(predicate::str::diff("42\n"));
}

#[tokio::test]
async fn test_ask_unknown_room_prints_apology() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({ "message": "Room not found" })),
        )
        .mount(&server)
        .await;
    let home = tempdir().unwrap();

    cargo_bin_cmd!("sheetchat")
        .env("SHEETCHAT_HOME", home.path())
        .env("SHEETCHAT_BASE_URL", server.uri())
        .args(["ask", "--room", "missing", "anything"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Sorry, an error occurred while fetching the answer.",
        ));
}
