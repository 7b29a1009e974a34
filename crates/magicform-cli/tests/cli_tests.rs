//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const QUESTIONS: &str = r#"{
  "questions": [
    {
      "title": "What is DevOps?",
      "type": "RADIO",
      "options": ["A language", "A set of practices", "A database"],
      "correct": "A set of practices"
    },
    {"type": "TEXT"},
    {"title": "Favourite CI tool", "type": "DROPDOWN", "options": ["Jenkins", "Actions"]}
  ]
}"#;

fn magicform() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("magicform").unwrap()
}

/// A command isolated from the user's config and tokens.
fn isolated(dir: &Path) -> Command {
    let mut cmd = magicform();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("MAGICFORM_CLIENT_ID")
        .env_remove("MAGICFORM_CLIENT_SECRET")
        .env_remove("MAGICFORM_REDIRECT_URL")
        .env_remove("MAGICFORM_TOKEN_PATH")
        .env_remove("MAGICFORM_FORMS_BASE_URL");
    cmd
}

fn write_questions(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("questions.json");
    std::fs::write(&path, QUESTIONS).unwrap();
    path
}

#[test]
fn validate_lists_questions_and_warnings() {
    let dir = TempDir::new().unwrap();
    let questions = write_questions(dir.path());

    isolated(dir.path())
        .arg("validate")
        .arg("--questions")
        .arg(&questions)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 entries"))
        .stdout(predicate::str::contains("What is DevOps?"))
        .stdout(predicate::str::contains("[1] WARNING: missing 'title'"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .arg("validate")
        .arg("--questions")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let questions = write_questions(dir.path());

    isolated(dir.path())
        .arg("validate")
        .arg("--questions")
        .arg(&questions)
        .arg("--config")
        .arg("missing.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn preview_prints_requests_offline() {
    let dir = TempDir::new().unwrap();
    let questions = write_questions(dir.path());

    let output = isolated(dir.path())
        .arg("preview")
        .arg("--questions")
        .arg(&questions)
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipping question at index 1"))
        .get_output()
        .stdout
        .clone();

    let calls: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(calls[0]["call"], "createForm");
    assert_eq!(calls[0]["title"], "Untitled quiz");
    assert_eq!(
        calls[1]["body"]["requests"][0]["updateSettings"]["updateMask"],
        "quizSettings.isQuiz"
    );
    let items = calls[2]["body"]["requests"].as_array().unwrap();
    assert_eq!(calls[2]["formId"], "mock-form-1");
    assert_eq!(items.len(), 2);
    assert_eq!(items[1]["createItem"]["location"]["index"], 2);
    assert_eq!(
        items[1]["createItem"]["item"]["questionItem"]["question"]["choiceQuestion"]["type"],
        "DROP_DOWN"
    );
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    isolated(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created magicform.toml"))
        .stdout(predicate::str::contains("Created questions.json"));

    assert!(dir.path().join("magicform.toml").exists());

    // The generated files are usable as-is.
    isolated(dir.path())
        .arg("validate")
        .arg("--questions")
        .arg("questions.json")
        .arg("--config")
        .arg("magicform.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("All questions valid."));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("questions.json"), "{}").unwrap();

    isolated(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("questions.json already exists"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("questions.json")).unwrap(),
        "{}"
    );
}

#[test]
fn create_without_client_secrets_fails() {
    let dir = TempDir::new().unwrap();
    let questions = write_questions(dir.path());

    isolated(dir.path())
        .arg("create")
        .arg("--questions")
        .arg(&questions)
        .arg("--title")
        .arg("Quiz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("client_secret.json"));
}

#[test]
fn create_rejects_empty_prompted_title() {
    let dir = TempDir::new().unwrap();
    let questions = write_questions(dir.path());

    isolated(dir.path())
        .arg("create")
        .arg("--questions")
        .arg(&questions)
        .write_stdin("\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Enter the form title"))
        .stderr(predicate::str::contains("form title must not be empty"));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/forms"))
        .and(header("authorization", "Bearer ya29.cli"))
        .and(body_partial_json(serde_json::json!({"info": {"title": "DevOps quiz"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "formId": "cli-form",
            "responderUri": "https://docs.google.com/forms/d/e/cli-form/viewform"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/forms/cli-form:batchUpdate"))
        .and(body_partial_json(serde_json::json!({
            "requests": [{"updateSettings": {"updateMask": "quizSettings.isQuiz"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/forms/cli-form:batchUpdate"))
        .and(body_partial_json(serde_json::json!({
            "requests": [{"createItem": {"location": {"index": 0}}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let questions = write_questions(dir.path());
    let token_path = dir.path().join("token.json");
    let expiry = chrono::Utc::now() + chrono::Duration::hours(1);
    std::fs::write(
        &token_path,
        serde_json::json!({
            "token": "ya29.cli",
            "refresh_token": "1//cli",
            "token_uri": format!("{}/token", server.uri()),
            "client_id": "cid",
            "client_secret": "csecret",
            "scopes": ["https://www.googleapis.com/auth/drive"],
            "expiry": expiry.to_rfc3339()
        })
        .to_string(),
    )
    .unwrap();

    isolated(dir.path())
        .env("MAGICFORM_CLIENT_ID", "cid")
        .env("MAGICFORM_CLIENT_SECRET", "csecret")
        .env("MAGICFORM_TOKEN_PATH", &token_path)
        .env("MAGICFORM_FORMS_BASE_URL", server.uri())
        .arg("create")
        .arg("--questions")
        .arg(&questions)
        .arg("--title")
        .arg("DevOps quiz")
        .assert()
        .success()
        .stdout(predicate::str::contains("Form created with ID: cli-form"))
        .stdout(predicate::str::contains(
            "Form URL: https://docs.google.com/forms/d/e/cli-form/viewform",
        ))
        .stdout(predicate::str::contains("Questions added to the form."))
        .stdout(predicate::str::contains("1 question(s) skipped"));
}

#[test]
fn help_lists_commands() {
    magicform()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("serve"));
}
