#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TICKET: &str = "# T-1 Fix login redirect\n\n\
Users land on /home after login instead of the page they came from.\n\n\
## Files touched\n\
- `src/login.ts`\n\
- None\n\n\
## Acceptance\n\
- redirect honours ?next=\n";

fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

/// A git repository with one commit and a ticket under `tickets/`.
fn project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    git(root, &["init", "-q"]);
    git(root, &["config", "user.email", "dev@example.com"]);
    git(root, &["config", "user.name", "Dev"]);
    git(root, &["config", "commit.gpgsign", "false"]);
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(root.join("src/login.ts"), "export const next = '/home';\n").unwrap();
    git(root, &["add", "."]);
    git(root, &["commit", "-q", "-m", "add login"]);

    std::fs::create_dir_all(root.join("tickets")).unwrap();
    let ticket = root.join("tickets/T-1.md");
    std::fs::write(&ticket, TICKET).unwrap();
    (dir, ticket)
}

fn orchestrator(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("orchestrator").unwrap();
    cmd.current_dir(dir.path())
        .env("ORCH_RUNS_ROOT", dir.path().join("runs"))
        .env_remove("ORCH_CONFIG")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_MODEL")
        .env_remove("OPENAI_MODEL")
        .env_remove("ANTHROPIC_BASE_URL")
        .env_remove("OPENAI_BASE_URL");
    cmd
}

fn run_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("runs/T-1")
}

// ---------------------------------------------------------------------------
// orchestrator run
// ---------------------------------------------------------------------------

#[test]
fn run_creates_artifact_set() {
    let (dir, _) = project();
    orchestrator(&dir)
        .args(["run", "tickets/T-1.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created run artifacts:"))
        .stdout(predicate::str::contains("review.packet.md"));

    let run = run_dir(&dir);
    for name in [
        "ticket.md",
        "claude.prompt.txt",
        "codex.prompt.txt",
        "run.md",
        "review.packet.md",
    ] {
        assert!(run.join(name).is_file(), "{name} missing");
    }
    assert!(!run.join("claude.output.md").exists());
    assert!(!run.join("codex.verdict.txt").exists());

    let ticket = std::fs::read_to_string(run.join("ticket.md")).unwrap();
    assert_eq!(ticket, TICKET);

    let packet = std::fs::read_to_string(run.join("review.packet.md")).unwrap();
    assert!(packet.contains("src/login.ts"));
    assert!(packet.contains("add login"));
    assert!(packet.contains("### git log per touched file"));
}

#[test]
fn run_is_idempotent() {
    let (dir, _) = project();
    orchestrator(&dir).args(["run", "tickets/T-1.md"]).assert().success();
    let first = std::fs::read_to_string(run_dir(&dir).join("claude.prompt.txt")).unwrap();
    let first_md = std::fs::read_to_string(run_dir(&dir).join("run.md")).unwrap();

    orchestrator(&dir).args(["run", "tickets/T-1.md"]).assert().success();
    let second = std::fs::read_to_string(run_dir(&dir).join("claude.prompt.txt")).unwrap();
    let second_md = std::fs::read_to_string(run_dir(&dir).join("run.md")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_md, second_md);
}

#[test]
fn run_missing_ticket_exits_3() {
    let (dir, _) = project();
    orchestrator(&dir)
        .args(["run", "tickets/nope.md"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ticket not found"));
    assert!(!dir.path().join("runs/nope").exists());
}

#[test]
fn run_outside_repository_exits_3() {
    let dir = TempDir::new().unwrap();
    let ticket = dir.path().join("T-9.md");
    std::fs::write(&ticket, "# lonely\n").unwrap();
    // A repository above the temp dir would make this test meaningless.
    if dir.path().ancestors().any(|p| p.join(".git").exists()) {
        return;
    }
    orchestrator(&dir).args(["run", "T-9.md"]).assert().code(3);
}

#[test]
fn run_json_reports_pack() {
    let (dir, _) = project();
    let out = orchestrator(&dir)
        .args(["--json", "run", "tickets/T-1.md"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["ticket_id"], "T-1");
    assert_eq!(v["files_written"].as_array().unwrap().len(), 5);
}

#[test]
fn default_runs_root_is_audit_runs_under_cwd() {
    let (dir, _) = project();
    orchestrator(&dir)
        .env_remove("ORCH_RUNS_ROOT")
        .args(["run", "tickets/T-1.md"])
        .assert()
        .success();
    assert!(dir.path().join("audit/runs/T-1/review.packet.md").is_file());
}

// ---------------------------------------------------------------------------
// orchestrator exec
// ---------------------------------------------------------------------------

#[test]
fn exec_missing_credentials_exits_3_without_run_dir() {
    let (dir, _) = project();
    orchestrator(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .args(["exec", "tickets/T-1.md"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ANTHROPIC_API_KEY"));
    assert!(!run_dir(&dir).exists());

    orchestrator(&dir)
        .env("ANTHROPIC_API_KEY", "sk-ant-test")
        .args(["exec", "tickets/T-1.md"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("OPENAI_API_KEY"));
    assert!(!run_dir(&dir).exists());
}

const SSE_BODY: &str = "event: message_start\n\
data: {\"type\":\"message_start\",\"message\":{\"usage\":{\"input_tokens\":10,\"output_tokens\":1}}}\n\n\
event: content_block_delta\n\
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"1) Plan: read next param\\n\"}}\n\n\
event: content_block_delta\n\
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"4) STOP\"}}\n\n\
event: message_delta\n\
data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":7}}\n\n\
event: message_stop\n\
data: {\"type\":\"message_stop\"}\n\n";

fn with_providers(cmd: &mut Command, server: &mockito::ServerGuard) {
    cmd.env("ANTHROPIC_API_KEY", "sk-ant-test")
        .env("OPENAI_API_KEY", "sk-test")
        .env("ANTHROPIC_BASE_URL", server.url())
        .env("OPENAI_BASE_URL", format!("{}/v1", server.url()));
}

#[test]
fn exec_blocked_verdict_exits_1() {
    let (dir, _) = project();
    let mut server = mockito::Server::new();
    let build = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(SSE_BODY)
        .create();
    let review = server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::Regex("4\\) STOP".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"choices":[{"message":{"role":"assistant","content":"VERDICT: BLOCKED\nreason: no tests for ?next="}}]}"#,
        )
        .create();

    let mut cmd = orchestrator(&dir);
    with_providers(&mut cmd, &server);
    cmd.args(["exec", "tickets/T-1.md"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1) Plan: read next param"))
        .stdout(predicate::str::contains("Verdict: BLOCKED"));

    build.assert();
    review.assert();

    let run = run_dir(&dir);
    let output = std::fs::read_to_string(run.join("claude.output.md")).unwrap();
    assert_eq!(output, "1) Plan: read next param\n4) STOP");

    let packet = std::fs::read_to_string(run.join("review.packet.md")).unwrap();
    assert!(packet.contains("4) STOP"));

    let verdict = std::fs::read_to_string(run.join("codex.verdict.txt")).unwrap();
    assert!(verdict.starts_with("VERDICT: BLOCKED"));
    assert!(verdict.contains("reason: no tests for ?next="));

    let log = std::fs::read_to_string(run.join("exec.log")).unwrap();
    assert!(log.contains("Verdict: BLOCKED"));
}

#[test]
fn exec_approved_verdict_exits_0() {
    let (dir, _) = project();
    let mut server = mockito::Server::new();
    let _build = server
        .mock("POST", "/v1/messages")
        .with_status(200)
        .with_body(SSE_BODY)
        .create();
    let _review = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"All good.\nVERDICT: APPROVED"}}]}"#)
        .create();

    let mut cmd = orchestrator(&dir);
    with_providers(&mut cmd, &server);
    cmd.args(["exec", "tickets/T-1.md"]).assert().success();
}

#[test]
fn exec_rate_limited_builder_exits_3_and_logs() {
    let (dir, _) = project();
    let mut server = mockito::Server::new();
    let _build = server
        .mock("POST", "/v1/messages")
        .with_status(429)
        .with_body(r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#)
        .create();
    let review = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create();

    let mut cmd = orchestrator(&dir);
    with_providers(&mut cmd, &server);
    cmd.args(["exec", "tickets/T-1.md"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("exec.log"));
    review.assert();

    let run = run_dir(&dir);
    assert!(!run.join("claude.output.md").exists());
    assert!(!run.join("codex.verdict.txt").exists());
    let log = std::fs::read_to_string(run.join("exec.log")).unwrap();
    assert!(log.contains("rate limit exceeded"));
    assert!(!log.contains("sk-ant-test"));
}
