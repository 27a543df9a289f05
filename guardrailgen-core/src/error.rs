//! Core error types for `guardrailgen`
//!
//! Policy schema violations and configuration loading errors shared across
//! the workspace.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Policy Schema Violations
// ============================================================================

/// A policy document schema violation.
///
/// Messages are the ones printed by the CLI, so they are part of the
/// user-facing contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Document is missing or empty, or `version` is not exactly `1`.
    #[error("policy.version must be 1")]
    InvalidVersion,

    /// `policies` is missing or not a sequence.
    #[error("policy.policies must be a list")]
    InvalidPoliciesType,

    /// A policy entry has no usable `id`.
    #[error("policy missing id")]
    MissingId,

    /// A policy entry has no usable `rule`.
    #[error("policy {id} missing rule")]
    MissingRule {
        /// Identifier of the offending policy
        id: String,
    },

    /// A policy entry's `applies_to.tools` is missing, empty or not a list.
    #[error("policy {id} applies_to.tools required")]
    MissingTools {
        /// Identifier of the offending policy
        id: String,
    },
}

impl ValidationError {
    /// Stable machine-readable name of the violation.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidVersion => "invalid_version",
            Self::InvalidPoliciesType => "invalid_policies_type",
            Self::MissingId => "missing_id",
            Self::MissingRule { .. } => "missing_rule",
            Self::MissingTools { .. } => "missing_tools",
        }
    }

    /// Identifier of the policy the violation belongs to, if any.
    #[must_use]
    pub fn policy_id(&self) -> Option<&str> {
        match self {
            Self::MissingRule { id } | Self::MissingTools { id } => Some(id),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Policy file loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}{}: {message}", line.map_or_else(String::new, |l| format!(" (line {l})")))]
    ParseError {
        /// Path to the policy file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Policy file not found or unreadable
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// One or more policy files failed validation.
    #[error("{count} file(s) failed validation")]
    ValidationFailed {
        /// Number of files that failed validation.
        count: usize,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single finding reported by a collect-all validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "policies[2].applies_to.tools")
    pub path: String,
    /// Description of the issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
    /// Schema violation behind an error-level issue
    pub error: Option<ValidationError>,
}

impl ValidationIssue {
    /// Builds an error-level issue from a schema violation.
    #[must_use]
    pub fn error(path: impl Into<String>, error: ValidationError) -> Self {
        Self {
            path: path.into(),
            message: error.to_string(),
            severity: Severity::Error,
            error: Some(error),
        }
    }

    /// Builds a warning-level issue.
    #[must_use]
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
            error: None,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if self.path.is_empty() {
            write!(f, "{prefix}: {}", self.message)
        } else {
            write!(f, "{prefix}: {} at {}", self.message, self.path)
        }
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Schema violation; the document is rejected
    Error,
    /// Suspicious but accepted
    Warning,
}
