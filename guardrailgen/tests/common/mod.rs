//! Shared integration-test harness for running the `guardrailgen` binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Runs `guardrailgen` with `args` and waits for it to exit.
///
/// Logging is silenced so stderr only carries command output.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_guardrailgen"))
        .arg("--quiet")
        .args(args)
        .env_remove("GUARDRAILGEN_DASHCLAW_URL")
        .env_remove("GUARDRAILGEN_DASHCLAW_API_KEY")
        .output()
        .expect("failed to run guardrailgen")
}

/// Returns the path to a test fixture.
#[must_use]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Returns a fixture path as a `&str`-convertible `String`.
#[must_use]
pub fn fixture(name: &str) -> String {
    fixture_path(name).to_string_lossy().into_owned()
}

/// Stdout as a lossy UTF-8 string.
#[must_use]
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr as a lossy UTF-8 string.
#[must_use]
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
