//! DashClaw integration
//!
//! DashClaw stores guardrails as typed policy records (`require_approval`,
//! `risk_threshold`, ...). This module reads those records, either from an
//! exported JSON file or from a live instance, and converts them into a
//! guardrails [`PolicyDocument`](guardrailgen_core::PolicyDocument).

pub mod client;
pub mod convert;

pub use client::DashClawClient;
pub use convert::{convert_policies, convert_policy};

use serde::Deserialize;
use serde_json::Value;

use crate::error::DashClawError;

/// Project name used when none is given.
pub const DEFAULT_PROJECT: &str = "dashclaw-policies";

/// One DashClaw policy record.
///
/// Only the fields the converter reads are modeled; everything else in the
/// record is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashClawPolicy {
    /// Record identifier (string or number)
    #[serde(default)]
    pub id: Option<Value>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Policy kind, e.g. `require_approval`
    #[serde(default)]
    pub policy_type: String,

    /// Type-specific settings, as an object or a JSON-encoded string
    #[serde(default)]
    pub rules: Option<Value>,

    /// `0` marks a disabled policy
    #[serde(default)]
    pub active: Option<Value>,
}

/// Parses a DashClaw export: either a bare array of policy records or an
/// API-style object with a `policies` array.
///
/// # Errors
///
/// Returns [`DashClawError::InvalidExport`] if the text is not JSON or has
/// neither shape.
pub fn parse_export(text: &str) -> Result<Vec<DashClawPolicy>, DashClawError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| DashClawError::InvalidExport(e.to_string()))?;

    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => policies_array(map.remove("policies"))
            .ok_or_else(|| DashClawError::InvalidExport("missing policies array".to_string()))?,
        other => {
            return Err(DashClawError::InvalidExport(format!(
                "expected an array or an object, got {other}"
            )));
        }
    };

    serde_json::from_value(list).map_err(|e| DashClawError::InvalidExport(e.to_string()))
}

/// Keeps `value` only if it is a JSON array.
fn policies_array(value: Option<Value>) -> Option<Value> {
    value.filter(Value::is_array)
}
