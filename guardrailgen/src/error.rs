//! Error types for `guardrailgen`
//!
//! The top-level error aggregates policy violations, loading errors and
//! DashClaw adapter errors, and maps each to a process exit code.

use std::path::PathBuf;
use thiserror::Error;

pub use guardrailgen_core::error::{ConfigError, Severity, ValidationError, ValidationIssue};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `guardrailgen` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// A policy document failed validation or its embedded tests
    pub const INVALID_POLICY: i32 = 1;

    /// Unusable input (missing or unreadable file, invalid YAML or JSON,
    /// oversize file, bad DashClaw records)
    pub const CONFIG_ERROR: i32 = 2;

    /// Output could not be written (e.g. `convert --out` into a missing
    /// directory)
    pub const IO_ERROR: i32 = 3;

    /// DashClaw API unreachable or returned an error
    pub const NETWORK_ERROR: i32 = 4;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `guardrailgen` operations.
#[derive(Debug, Error)]
pub enum GuardrailError {
    /// Policy file loading error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Policy document schema violation
    #[error("{path}: {source}")]
    Policy {
        /// File (or pseudo-path) the document came from
        path: PathBuf,
        /// First violation found
        source: ValidationError,
    },

    /// Embedded policy tests did not all pass
    #[error("{path}: {failed} of {total} policy test(s) failed")]
    TestsFailed {
        /// File the tests came from
        path: PathBuf,
        /// Number of failing tests
        failed: usize,
        /// Number of tests run
        total: usize,
    },

    /// DashClaw adapter error
    #[error(transparent)]
    DashClaw(#[from] DashClawError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GuardrailError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Policy { .. }
            | Self::TestsFailed { .. }
            | Self::Config(ConfigError::ValidationFailed { .. }) => ExitCode::INVALID_POLICY,
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
            Self::DashClaw(err) => err.exit_code(),
        }
    }
}

// ============================================================================
// DashClaw Errors
// ============================================================================

/// DashClaw conversion and API errors.
#[derive(Debug, Error)]
pub enum DashClawError {
    /// HTTP request could not be completed
    #[error("DashClaw request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL could not be parsed or joined
    #[error("invalid DashClaw URL '{url}': {message}")]
    InvalidUrl {
        /// URL as given
        url: String,
        /// Parser message
        message: String,
    },

    /// `--url` given without an API key
    #[error("a DashClaw API key is required with --url (--api-key or GUARDRAILGEN_DASHCLAW_API_KEY)")]
    MissingApiKey,

    /// API answered with a non-success status
    #[error("DashClaw API error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// API answered with an unexpected body
    #[error("invalid response from DashClaw API: {0}")]
    InvalidResponse(String),

    /// Exported policy file has an unexpected shape
    #[error("invalid DashClaw export: {0}")]
    InvalidExport(String),

    /// A policy record cannot be converted
    #[error("DashClaw policy #{index}: {message}")]
    InvalidPolicy {
        /// Position of the record in the input
        index: usize,
        /// What is wrong with it
        message: String,
    },
}

impl DashClawError {
    /// Returns the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Http(_) | Self::Api { .. } | Self::InvalidResponse(_) => ExitCode::NETWORK_ERROR,
            Self::InvalidUrl { .. }
            | Self::MissingApiKey
            | Self::InvalidExport(_)
            | Self::InvalidPolicy { .. } => ExitCode::CONFIG_ERROR,
        }
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `guardrailgen` operations.
pub type Result<T> = std::result::Result<T, GuardrailError>;

// ============================================================================
// Tests
// ============================================================================
