//! `guardrailgen` core: policy document model and validation
//!
//! This crate holds everything that does not touch the filesystem or the
//! network: the generic [`Node`](node::Node) tree a policy file parses into,
//! the validator that checks it against the guardrails schema, the typed
//! [`PolicyDocument`](policy::PolicyDocument) view, offline evaluation of a
//! document's own test cases, and the shared error types.

pub mod error;
pub mod evaluate;
pub mod node;
pub mod policy;
pub mod validation;

pub use error::{ConfigError, Severity, ValidationError, ValidationIssue};
pub use evaluate::{
    Decision, Reason, TestOutcome, evaluate_policies, evaluate_policy, run_policy_tests,
};
pub use node::Node;
pub use policy::{AppliesTo, PolicyDocument, PolicyRule};
pub use validation::{ValidationMode, ValidationReport, Validator, validate_policy};
