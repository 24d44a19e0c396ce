#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn osint(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("osint").unwrap();
    cmd.current_dir(dir.path())
        .env("OSINT_ROOT", dir.path())
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

// ---------------------------------------------------------------------------
// osint config
// ---------------------------------------------------------------------------

#[test]
fn config_init_writes_defaults() {
    let dir = TempDir::new().unwrap();
    osint(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.yaml"));

    let data = std::fs::read_to_string(dir.path().join(".osint/config.yaml")).unwrap();
    let cfg: serde_yaml::Value = serde_yaml::from_str(&data).unwrap();
    assert_eq!(cfg["engine"]["max_iterations"].as_u64(), Some(15));

    osint(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn config_show_reports_effective_values() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".osint")).unwrap();
    std::fs::write(
        dir.path().join(".osint/config.yaml"),
        "engine:\n  batch_size: 7\n",
    )
    .unwrap();

    let json = stdout_json(osint(&dir).args(["--json", "config", "show"]));
    assert_eq!(json["engine"]["batch_size"], 7);
    assert_eq!(json["engine"]["pacing_ms"], 500);
    assert_eq!(json["orchestrator"]["campaign_delay_ms"], 2000);
}

#[test]
fn config_validate_fails_on_errors() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".osint")).unwrap();
    std::fs::write(
        dir.path().join(".osint/config.yaml"),
        "engine:\n  batch_size: 0\n",
    )
    .unwrap();
    osint(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("batch_size"));
}

// ---------------------------------------------------------------------------
// osint investigate / audit
// ---------------------------------------------------------------------------

#[test]
fn offline_investigation_saves_bundle_and_audit_trail() {
    let dir = TempDir::new().unwrap();
    let result = stdout_json(osint(&dir).args([
        "--offline",
        "--json",
        "investigate",
        "profile",
        "example.org",
        "--format",
        "text",
    ]));
    assert_eq!(result["objective"], "profile example.org");
    assert!(result["report"].is_string());

    let id = result["investigation_id"].as_str().unwrap();
    let saved = dir.path().join(format!(".osint/investigations/{id}.json"));
    assert!(saved.exists());

    let trail = stdout_json(osint(&dir).args(["--json", "audit", id]));
    let trail = trail.as_array().unwrap();
    assert!(!trail.is_empty());
    assert!(trail.iter().all(|e| e["investigation_id"] == id));

    let limited = stdout_json(osint(&dir).args(["--json", "audit", id, "--limit", "1"]));
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[test]
fn investigate_rejects_bad_constraints() {
    let dir = TempDir::new().unwrap();
    osint(&dir)
        .args(["--offline", "investigate", "x", "--constraints", "[1,2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--constraints"));
}

#[test]
fn investigate_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    osint(&dir)
        .args(["--offline", "investigate", "x", "--format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pdf"));
}

// ---------------------------------------------------------------------------
// osint workflow
// ---------------------------------------------------------------------------

#[test]
fn workflow_run_persists_state() {
    let dir = TempDir::new().unwrap();
    let out = stdout_json(osint(&dir).args([
        "--offline",
        "--json",
        "workflow",
        "run",
        "--name",
        "vendor check",
        "--objective",
        "profile example.net",
        "--alert",
        "finding_count:100:high",
    ]));
    let id = out["workflow_id"].as_str().unwrap().to_string();
    assert!(id.starts_with("wf_"));
    assert!(out["alerts"].as_array().unwrap().is_empty());
    assert!(dir.path().join(".osint/exports/workflows.json").exists());

    let list = stdout_json(osint(&dir).args(["--offline", "--json", "workflow", "list"]));
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], id.as_str());
    assert_eq!(list[0]["status"], "completed");
    assert_eq!(list[0]["executions"], 1);
}

#[test]
fn workflow_run_rejects_invalid_alert_spec() {
    let dir = TempDir::new().unwrap();
    osint(&dir)
        .args([
            "--offline",
            "workflow",
            "run",
            "--name",
            "x",
            "--objective",
            "y",
            "--alert",
            "finding_count:lots",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("finding_count:lots"));
    assert!(!dir.path().join(".osint/exports/workflows.json").exists());
}

#[test]
fn acknowledging_unknown_alert_fails() {
    let dir = TempDir::new().unwrap();
    osint(&dir)
        .args(["--offline", "workflow", "ack", "alert_nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alert_nope"));
}

// ---------------------------------------------------------------------------
// osint campaign
// ---------------------------------------------------------------------------

#[test]
fn campaign_writes_result_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("vendors.json");
    osint(&dir)
        .args([
            "--offline",
            "campaign",
            "--name",
            "vendors",
            "--template",
            "Investigate {target}",
            "--target",
            "a.example",
            "--target",
            "b.example",
            "--parallel",
            "--out",
        ])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 completed, 0 failed"));

    let result: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(result["campaign_name"], "vendors");
    assert_eq!(result["results"][0]["objective"], "Investigate a.example");
    assert_eq!(result["results"][1]["objective"], "Investigate b.example");
}

#[test]
fn campaign_defaults_to_export_dir() {
    let dir = TempDir::new().unwrap();
    osint(&dir)
        .args([
            "--offline",
            "campaign",
            "--name",
            "Q3 Vendors",
            "--template",
            "Investigate {target}",
            "--target",
            "solo.example",
        ])
        .assert()
        .success();
    assert!(dir
        .path()
        .join(".osint/exports/campaign_q3_vendors.json")
        .exists());
}

#[test]
fn campaign_requires_a_target() {
    let dir = TempDir::new().unwrap();
    osint(&dir)
        .args(["--offline", "campaign", "--name", "n", "--template", "{target}"])
        .assert()
        .failure();
}
