//! `validate` command
//!
//! Loads each policy file and checks it against the guardrails schema, and
//! with `--run-tests` also runs the test cases each policy carries.
//! Human output goes to stderr (issues) and stdout (`OK validate`); JSON
//! output is a single object on stdout covering every file.

use std::path::{Path, PathBuf};

use serde::Serialize;

use guardrailgen_core::{
    Node, PolicyDocument, TestOutcome, ValidationIssue, ValidationMode, ValidationReport,
    Validator, run_policy_tests,
};

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::PolicyLoader;
use crate::error::{ConfigError, GuardrailError};

/// Validate the given policy files.
///
/// # Errors
///
/// In the default mode, returns the first load error, `GuardrailError::Policy`
/// for the first invalid file, or `GuardrailError::TestsFailed` for the first
/// file whose embedded tests fail. With `--all`, `--strict` or JSON output,
/// returns `ConfigError::ValidationFailed` once every file has been checked.
pub fn run(args: &ValidateArgs) -> Result<(), GuardrailError> {
    let loader = PolicyLoader::with_defaults();

    match args.format {
        OutputFormat::Human => run_human(&loader, args),
        OutputFormat::Json => run_json(&loader, args),
    }
}

// ============================================================================
// Human Output
// ============================================================================

fn run_human(loader: &PolicyLoader, args: &ValidateArgs) -> Result<(), GuardrailError> {
    let mode = if args.all {
        ValidationMode::CollectAll
    } else {
        ValidationMode::FailFast
    };

    let mut failed = 0;
    for path in &args.files {
        tracing::info!(file = %path.display(), "validating policy file");

        let doc = match loader.load(path) {
            Ok(doc) => doc,
            Err(err) if args.all => {
                eprintln!("{}: {err}", path.display());
                failed += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let report = Validator::new(mode).validate(&doc);

        if args.strict {
            for warning in &report.warnings {
                eprintln!("{}: {warning}", path.display());
            }
        } else {
            for warning in &report.warnings {
                tracing::warn!(file = %path.display(), path = %warning.path, "{}", warning.message);
            }
        }

        let outcomes = if args.run_tests {
            policy_tests(&doc, &report)
        } else {
            Vec::new()
        };
        for outcome in outcomes.iter().filter(|o| !o.passed) {
            eprintln!(
                "{}: test {}/{} failed: {}",
                path.display(),
                outcome.policy_id,
                outcome.name,
                outcome.message.as_deref().unwrap_or_default()
            );
        }
        let tests_failed = count_failed(&outcomes);
        if args.run_tests && report.is_valid() {
            tracing::info!(
                file = %path.display(),
                total = outcomes.len(),
                failed = tests_failed,
                "ran policy tests"
            );
        }

        if !args.all {
            if let Some(source) = report.first_error() {
                return Err(GuardrailError::Policy {
                    path: path.clone(),
                    source: source.clone(),
                });
            }
            if args.strict && !report.warnings.is_empty() {
                return Err(ConfigError::ValidationFailed { count: 1 }.into());
            }
            if tests_failed > 0 {
                return Err(GuardrailError::TestsFailed {
                    path: path.clone(),
                    failed: tests_failed,
                    total: outcomes.len(),
                });
            }
            continue;
        }

        for issue in &report.errors {
            eprintln!("{}: {issue}", path.display());
        }
        if !file_passes(&report, args.strict) || tests_failed > 0 {
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(ConfigError::ValidationFailed { count: failed }.into());
    }

    println!("OK validate");
    Ok(())
}

fn file_passes(report: &ValidationReport, strict: bool) -> bool {
    report.is_valid() && !(strict && !report.warnings.is_empty())
}

/// Runs embedded tests; a document that failed validation has none to run.
fn policy_tests(doc: &Node, report: &ValidationReport) -> Vec<TestOutcome> {
    if !report.is_valid() {
        return Vec::new();
    }
    PolicyDocument::from_node(doc)
        .map(|typed| run_policy_tests(&typed))
        .unwrap_or_default()
}

fn count_failed(outcomes: &[TestOutcome]) -> usize {
    outcomes.iter().filter(|o| !o.passed).count()
}

// ============================================================================
// JSON Output
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonOutput {
    files: Vec<FileResult>,
    summary: Summary,
}

#[derive(Debug, Serialize)]
struct FileResult {
    path: PathBuf,
    valid: bool,
    errors: Vec<IssueEntry>,
    warnings: Vec<IssueEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tests: Option<Vec<TestEntry>>,
}

#[derive(Debug, Serialize)]
struct TestEntry {
    policy_id: String,
    name: String,
    passed: bool,
    message: Option<String>,
}

impl From<TestOutcome> for TestEntry {
    fn from(outcome: TestOutcome) -> Self {
        Self {
            policy_id: outcome.policy_id,
            name: outcome.name,
            passed: outcome.passed,
            message: outcome.message,
        }
    }
}

#[derive(Debug, Serialize)]
struct IssueEntry {
    path: String,
    kind: String,
    message: String,
    policy_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total: usize,
    valid: usize,
    invalid: usize,
}

impl From<&ValidationIssue> for IssueEntry {
    fn from(issue: &ValidationIssue) -> Self {
        Self {
            path: issue.path.clone(),
            kind: issue
                .error
                .as_ref()
                .map_or("warning", |e| e.kind())
                .to_string(),
            message: issue.message.clone(),
            policy_id: issue
                .error
                .as_ref()
                .and_then(|e| e.policy_id())
                .map(str::to_string),
        }
    }
}

fn run_json(loader: &PolicyLoader, args: &ValidateArgs) -> Result<(), GuardrailError> {
    let files: Vec<FileResult> = args
        .files
        .iter()
        .map(|path| check_file(loader, path, args))
        .collect();

    let invalid = files.iter().filter(|f| !f.valid).count();
    let output = JsonOutput {
        summary: Summary {
            total: files.len(),
            valid: files.len() - invalid,
            invalid,
        },
        files,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    if invalid > 0 {
        return Err(ConfigError::ValidationFailed { count: invalid }.into());
    }
    Ok(())
}

fn check_file(loader: &PolicyLoader, path: &Path, args: &ValidateArgs) -> FileResult {
    match loader.load(path) {
        Ok(doc) => report_entry(path, &doc, args),
        Err(err) => FileResult {
            path: path.to_path_buf(),
            valid: false,
            errors: vec![IssueEntry {
                path: String::new(),
                kind: load_error_kind(&err).to_string(),
                message: err.to_string(),
                policy_id: None,
            }],
            warnings: Vec::new(),
            tests: None,
        },
    }
}

fn report_entry(path: &Path, doc: &Node, args: &ValidateArgs) -> FileResult {
    let report = Validator::new(ValidationMode::CollectAll).validate(doc);
    let outcomes = args.run_tests.then(|| policy_tests(doc, &report));
    let tests_pass = outcomes.as_deref().is_none_or(|o| count_failed(o) == 0);

    FileResult {
        path: path.to_path_buf(),
        valid: file_passes(&report, args.strict) && tests_pass,
        errors: report.errors.iter().map(IssueEntry::from).collect(),
        warnings: report.warnings.iter().map(IssueEntry::from).collect(),
        tests: outcomes.map(|o| o.into_iter().map(TestEntry::from).collect()),
    }
}

const fn load_error_kind(err: &ConfigError) -> &'static str {
    match err {
        ConfigError::ParseError { .. } => "parse_error",
        ConfigError::MissingFile { .. } => "missing_file",
        ConfigError::InvalidValue { .. } | ConfigError::ValidationFailed { .. } => "invalid_value",
    }
}

// ============================================================================
// Tests
// ============================================================================
