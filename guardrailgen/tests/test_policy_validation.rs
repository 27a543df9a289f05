mod common;

use std::io::Write;

use common::{fixture, spawn_command, stderr, stdout};

// ============================================================================
// Fail-fast (default)
// ============================================================================

#[test]
fn valid_policy_prints_ok() {
    let output = spawn_command(&["validate", &fixture("valid.yml")]);
    assert!(
        output.status.success(),
        "valid.yml should pass: {}",
        stderr(&output)
    );
    assert_eq!(stdout(&output).trim(), "OK validate");
}

#[test]
fn minimal_document_accepted() {
    let output = spawn_command(&["validate", &fixture("no_secrets.yml")]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "OK validate");
}

#[test]
fn merge_keys_resolved() {
    let output = spawn_command(&["validate", &fixture("merge_keys.yml")]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn version_two_rejected() {
    let path = fixture("version_two.yml");
    let output = spawn_command(&["validate", &path]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stderr(&output).trim(),
        format!("error: {path}: policy.version must be 1")
    );
    assert!(stdout(&output).is_empty());
}

#[test]
fn policies_mapping_rejected() {
    let output = spawn_command(&["validate", &fixture("policies_mapping.yml")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("policy.policies must be a list"));
}

#[test]
fn missing_tools_rejected() {
    let output = spawn_command(&["validate", &fixture("missing_tools.yml")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("policy p1 applies_to.tools required"));
}

#[test]
fn missing_id_rejected() {
    let output = spawn_command(&["validate", &fixture("missing_id.yml")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("policy missing id"));
}

#[test]
fn error_names_the_file() {
    let path = fixture("missing_tools.yml");
    let output = spawn_command(&["validate", &path]);
    assert!(stderr(&output).contains(&path));
}

#[test]
fn empty_file_rejected_as_bad_version() {
    let output = spawn_command(&["validate", &fixture("empty.yml")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("policy.version must be 1"));
}

#[test]
fn syntax_error_is_config_error() {
    let output = spawn_command(&["validate", &fixture("syntax_error.yml")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("parse error"));
}

#[test]
fn missing_file_is_config_error() {
    let output = spawn_command(&["validate", "/nonexistent/guardrailgen/policy.yml"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("file not found"));
}

#[test]
fn stops_at_first_invalid_file() {
    let output = spawn_command(&[
        "validate",
        &fixture("version_two.yml"),
        &fixture("missing_tools.yml"),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("policy.version must be 1"));
    assert!(!err.contains("applies_to.tools required"));
}

#[test]
fn multiple_valid_files() {
    let output = spawn_command(&["validate", &fixture("valid.yml"), &fixture("duplicate_ids.yml")]);
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn oversize_file_rejected() {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    file.write_all(b"version: 1\npolicies: []\n# padding padding padding\n")
        .unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_guardrailgen"))
        .args(["--quiet", "validate", file.path().to_str().unwrap()])
        .env("GUARDRAILGEN_MAX_POLICY_SIZE", "16")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("file_size"));
}

// ============================================================================
// --all / --strict
// ============================================================================

#[test]
fn all_reports_every_error() {
    let output = spawn_command(&[
        "validate",
        "--all",
        &fixture("many_errors.yml"),
        &fixture("valid.yml"),
        &fixture("version_two.yml"),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let err = stderr(&output);
    assert!(err.contains("policy a missing rule"));
    assert!(err.contains("policy b applies_to.tools required"));
    assert!(err.contains("policy.version must be 1"));
    assert!(err.contains("2 file(s) failed validation"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn all_continues_past_unparsable_file() {
    let output = spawn_command(&[
        "validate",
        "--all",
        &fixture("syntax_error.yml"),
        &fixture("version_two.yml"),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let err = stderr(&output);
    assert!(err.contains("parse error"));
    assert!(err.contains("policy.version must be 1"));
    assert!(err.contains("2 file(s) failed validation"));
}

#[test]
fn warnings_pass_unless_strict() {
    let path = fixture("typo_key.yml");

    let lenient = spawn_command(&["validate", &path]);
    assert!(lenient.status.success(), "{}", stderr(&lenient));

    let strict = spawn_command(&["validate", "--strict", &path]);
    assert_eq!(strict.status.code(), Some(1));
    assert!(stderr(&strict).contains("did you mean 'policies'"));
}

#[test]
fn strict_rejects_duplicate_ids() {
    let output = spawn_command(&["validate", "--strict", "--all", &fixture("duplicate_ids.yml")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("duplicate policy id 'p1'"));
}

// ============================================================================
// JSON output
// ============================================================================

#[test]
fn json_output_for_valid_file() {
    let output = spawn_command(&["validate", "--format", "json", &fixture("valid.yml")]);
    assert!(output.status.success(), "{}", stderr(&output));

    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["summary"]["total"], 1);
    assert_eq!(parsed["summary"]["valid"], 1);
    assert_eq!(parsed["files"][0]["valid"], true);
    assert_eq!(parsed["files"][0]["errors"].as_array().unwrap().len(), 0);
}

#[test]
fn json_output_covers_every_file() {
    let output = spawn_command(&[
        "validate",
        "-f",
        "json",
        &fixture("many_errors.yml"),
        "/nonexistent/guardrailgen/policy.yml",
        &fixture("valid.yml"),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["summary"]["total"], 3);
    assert_eq!(parsed["summary"]["valid"], 1);
    assert_eq!(parsed["summary"]["invalid"], 2);

    let errors = parsed["files"][0]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["kind"], "missing_rule");
    assert_eq!(errors[0]["policy_id"], "a");
    assert_eq!(errors[1]["path"], "policies[1].applies_to.tools");

    assert_eq!(parsed["files"][1]["errors"][0]["kind"], "missing_file");
}

// ============================================================================
// --run-tests
// ============================================================================

#[test]
fn run_tests_passes_for_consistent_document() {
    let output = spawn_command(&["validate", "--run-tests", &fixture("valid.yml")]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "OK validate");
}

#[test]
fn run_tests_reports_failing_case() {
    let path = fixture("failing_tests.yml");

    let plain = spawn_command(&["validate", &path]);
    assert!(plain.status.success(), "{}", stderr(&plain));

    let output = spawn_command(&["validate", "--run-tests", &path]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("test no-shell/expects_exec_allowed failed"));
    assert!(err.contains("blocked by policy"));
    assert!(err.contains("1 of 2 policy test(s) failed"));
    assert!(!err.contains("allowlisted_tool_passes"));
}

#[test]
fn run_tests_json_output() {
    let output = spawn_command(&[
        "validate",
        "--run-tests",
        "-f",
        "json",
        &fixture("failing_tests.yml"),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["files"][0]["valid"], false);
    let tests = parsed["files"][0]["tests"].as_array().unwrap();
    assert_eq!(tests.len(), 2);
    assert_eq!(tests[0]["passed"], true);
    assert_eq!(tests[1]["name"], "expects_exec_allowed");
    assert_eq!(tests[1]["passed"], false);
}
