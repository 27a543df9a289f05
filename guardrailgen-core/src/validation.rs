//! Policy document validation
//!
//! Checks a parsed [`Node`] tree against the guardrails schema:
//!
//! 1. the document is a non-empty mapping with `version: 1`
//! 2. `policies` is a sequence
//! 3. every policy has a present `id`, a present `rule`, and a non-empty
//!    `applies_to.tools` sequence
//!
//! The default [`ValidationMode::FailFast`] stops at the first violation.
//! [`ValidationMode::CollectAll`] keeps walking and reports every violation
//! it can attribute; its first error is always the fail-fast error.
//!
//! Warnings (duplicate ids, unknown keys) never affect acceptance.

use crate::error::{ValidationError, ValidationIssue};
use crate::node::{Node, is_present};

use indexmap::IndexMap;
use std::collections::HashMap;

const DOCUMENT_KEYS: &[&str] = &["version", "project", "policies"];
const POLICY_KEYS: &[&str] = &["id", "description", "rule", "applies_to", "tests"];
const APPLIES_TO_KEYS: &[&str] = &["tools"];

/// Maximum edit distance for "did you mean" suggestions.
const MAX_SUGGESTION_DISTANCE: usize = 2;

// ============================================================================
// Public API
// ============================================================================

/// Validates a policy document, returning the first schema violation.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered, in document order.
pub fn validate_policy(doc: &Node) -> Result<(), ValidationError> {
    Validator::new(ValidationMode::FailFast)
        .validate(doc)
        .into_result()
}

/// How far a validation run goes after the first violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Stop at the first violation.
    #[default]
    FailFast,
    /// Report every violation that can be attributed.
    CollectAll,
}

/// Result of a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Schema violations (the document is rejected if non-empty).
    pub errors: Vec<ValidationIssue>,

    /// Informational findings.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The first schema violation, in document order.
    #[must_use]
    pub fn first_error(&self) -> Option<&ValidationError> {
        self.errors.iter().find_map(|issue| issue.error.as_ref())
    }

    /// Collapses the report to its first violation.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] if the report has any.
    pub fn into_result(self) -> Result<(), ValidationError> {
        self.errors
            .into_iter()
            .find_map(|issue| issue.error)
            .map_or(Ok(()), Err)
    }
}

/// Policy document validator.
#[derive(Debug, Default)]
pub struct Validator {
    mode: ValidationMode,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

/// Signals that a fail-fast run must stop walking.
struct Halt;

impl Validator {
    /// Creates a validator running in `mode`.
    #[must_use]
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Validates `doc` and returns the findings.
    pub fn validate(&mut self, doc: &Node) -> ValidationReport {
        self.errors.clear();
        self.warnings.clear();

        // Halt only means "stop walking"; the findings are already recorded
        let _ = self.validate_document(doc);

        ValidationReport {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Document
    // ========================================================================

    fn validate_document(&mut self, doc: &Node) -> Result<(), Halt> {
        let Some(root) = doc.as_mapping().filter(|map| !map.is_empty()) else {
            return self.fail("", ValidationError::InvalidVersion);
        };
        self.warn_unknown_keys(root, "", DOCUMENT_KEYS);

        if doc.get("version").and_then(Node::as_int) != Some(1) {
            self.fail("version", ValidationError::InvalidVersion)?;
        }

        let Some(policies) = doc.get("policies").and_then(Node::as_sequence) else {
            return self.fail("policies", ValidationError::InvalidPoliciesType);
        };

        let mut seen_ids = HashMap::new();
        for (idx, policy) in policies.iter().enumerate() {
            self.validate_policy_entry(idx, policy, &mut seen_ids)?;
        }

        Ok(())
    }

    // ========================================================================
    // Policy Entries
    // ========================================================================

    fn validate_policy_entry(
        &mut self,
        idx: usize,
        policy: &Node,
        seen_ids: &mut HashMap<String, usize>,
    ) -> Result<(), Halt> {
        let path = format!("policies[{idx}]");

        let id = match policy.get("id") {
            Some(id) if id.is_present() => id.to_string(),
            _ => return self.fail(format!("{path}.id"), ValidationError::MissingId),
        };

        if let Some(first) = seen_ids.get(&id) {
            self.warnings.push(ValidationIssue::warning(
                format!("{path}.id"),
                format!("duplicate policy id '{id}' (first defined at policies[{first}])"),
            ));
        } else {
            seen_ids.insert(id.clone(), idx);
        }

        if let Some(entries) = policy.as_mapping() {
            self.warn_unknown_keys(entries, &path, POLICY_KEYS);
        }

        if !is_present(policy.get("rule")) {
            self.fail(
                format!("{path}.rule"),
                ValidationError::MissingRule { id: id.clone() },
            )?;
        }

        // An absent or falsy applies_to behaves like an empty mapping
        let applies_to = policy.get("applies_to").filter(|a| a.is_present());
        if let Some(entries) = applies_to.and_then(Node::as_mapping) {
            self.warn_unknown_keys(entries, &format!("{path}.applies_to"), APPLIES_TO_KEYS);
        }

        let tools = applies_to
            .and_then(|a| a.get("tools"))
            .and_then(Node::as_sequence);
        if tools.is_none_or(<[Node]>::is_empty) {
            self.fail(
                format!("{path}.applies_to.tools"),
                ValidationError::MissingTools { id },
            )?;
        }

        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn fail(&mut self, path: impl Into<String>, error: ValidationError) -> Result<(), Halt> {
        self.errors.push(ValidationIssue::error(path, error));
        match self.mode {
            ValidationMode::FailFast => Err(Halt),
            ValidationMode::CollectAll => Ok(()),
        }
    }

    fn warn_unknown_keys(
        &mut self,
        entries: &IndexMap<String, Node>,
        prefix: &str,
        known: &[&'static str],
    ) {
        for key in entries.keys() {
            if known.iter().any(|k| *k == key.as_str()) {
                continue;
            }
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            let message = suggest_key(key, known).map_or_else(
                || format!("unknown field '{key}'"),
                |suggestion| format!("unknown field '{key}' (did you mean '{suggestion}'?)"),
            );
            self.warnings.push(ValidationIssue::warning(path, message));
        }
    }
}

/// Suggest a known key for a likely typo.
fn suggest_key(input: &str, known: &[&'static str]) -> Option<&'static str> {
    known
        .iter()
        .map(|candidate| (*candidate, strsim::damerau_levenshtein(input, candidate)))
        .filter(|(_, dist)| *dist <= MAX_SUGGESTION_DISTANCE && *dist < input.len())
        .min_by_key(|(_, dist)| *dist)
        .map(|(candidate, _)| candidate)
}

// ============================================================================
// Tests
// ============================================================================
