//! DashClaw record to guardrails policy conversion.
//!
//! Each record becomes one [`PolicyRule`]: the DashClaw policy type decides
//! the rule payload and the tools it applies to. Type-specific settings the
//! guardrails format has no field for are carried in `_`-prefixed keys of
//! the rule payload. Records without embedded tests get placeholder tests.

use guardrailgen_core::{AppliesTo, Node, PolicyDocument, PolicyRule};
use indexmap::IndexMap;
use serde_json::Value;

use super::DashClawPolicy;
use crate::error::DashClawError;

const ADVANCED_POLICY_NOTE: &str = "Advanced policy type - test generation limited";

// ============================================================================
// Public API
// ============================================================================

/// Converts every active record into one guardrails document.
///
/// Records whose `active` field is the number `0` are skipped.
///
/// # Errors
///
/// Returns [`DashClawError::InvalidPolicy`] for the first record that
/// cannot be converted.
pub fn convert_policies(
    policies: &[DashClawPolicy],
    project: &str,
) -> Result<PolicyDocument, DashClawError> {
    let mut converted = Vec::with_capacity(policies.len());
    for (index, policy) in policies.iter().enumerate() {
        if is_inactive(policy.active.as_ref()) {
            tracing::debug!(index, "skipping inactive DashClaw policy");
            continue;
        }
        converted.push(convert_policy(index, policy)?);
    }

    tracing::info!(
        total = policies.len(),
        converted = converted.len(),
        "converted DashClaw policies"
    );

    Ok(PolicyDocument {
        version: 1,
        project: Some(project.to_string()),
        policies: converted,
    })
}

/// Converts a single record. `index` is only used in error messages.
///
/// # Errors
///
/// Returns [`DashClawError::InvalidPolicy`] when the record has neither an
/// id nor a name, its `rules` string is not JSON, or `rules.action_types`
/// is not a list.
pub fn convert_policy(index: usize, policy: &DashClawPolicy) -> Result<PolicyRule, DashClawError> {
    let invalid = |message: String| DashClawError::InvalidPolicy { index, message };

    let rules = parse_rules(policy.rules.as_ref()).map_err(invalid)?;
    let id = policy_id(policy).ok_or_else(|| invalid("policy has neither id nor name".into()))?;
    let action_types = action_types(&rules).map_err(invalid)?;

    let kind = policy.policy_type.as_str();
    let tools = match kind {
        "require_approval" | "block_action_type" => {
            action_types.clone().unwrap_or_else(|| vec![Node::from("*")])
        }
        _ => vec![Node::from("*")],
    };

    let tests = match rules.get("tests") {
        Some(Node::Sequence(tests)) => tests.clone(),
        _ => placeholder_tests(kind, action_types.as_deref()),
    };

    Ok(PolicyRule {
        id,
        description: policy.name.clone(),
        applies_to: AppliesTo { tools },
        rule: convert_rule(kind, &rules),
        tests,
    })
}

// ============================================================================
// Record Fields
// ============================================================================

#[allow(clippy::float_cmp)]
fn is_inactive(active: Option<&Value>) -> bool {
    active.and_then(Value::as_f64).is_some_and(|n| n == 0.0)
}

/// `rules` may arrive as an object or as a JSON-encoded string.
fn parse_rules(rules: Option<&Value>) -> Result<Node, String> {
    match rules {
        None | Some(Value::Null) => Ok(Node::Mapping(IndexMap::new())),
        Some(Value::String(text)) => serde_json::from_str::<Value>(text)
            .map(Node::from)
            .map_err(|e| format!("rules is not valid JSON: {e}")),
        Some(other) => Ok(Node::from(other.clone())),
    }
}

/// The record id, or the name lowercased with whitespace runs turned into `_`.
fn policy_id(policy: &DashClawPolicy) -> Option<String> {
    if let Some(id) = policy.id.clone().map(Node::from).filter(Node::is_present) {
        return Some(id.to_string());
    }

    let name = policy.name.as_deref().filter(|n| !n.is_empty())?;
    let mut id = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                id.push('_');
            }
            in_whitespace = true;
        } else {
            id.extend(ch.to_lowercase());
            in_whitespace = false;
        }
    }
    Some(id)
}

/// `rules.action_types`, if given.
fn action_types(rules: &Node) -> Result<Option<Vec<Node>>, String> {
    match rules.get("action_types") {
        None | Some(Node::Null) => Ok(None),
        Some(Node::Sequence(items)) => Ok(Some(items.clone())),
        Some(other) => Err(format!(
            "rules.action_types must be a list, got {}",
            other.type_name()
        )),
    }
}

// ============================================================================
// Rule Payloads
// ============================================================================

fn convert_rule(kind: &str, rules: &Node) -> Node {
    let dashclaw_type = ("_dashclaw_type", Node::from(kind));

    match kind {
        "require_approval" => mapping(vec![("require", Node::from("approval"))]),
        "block_action_type" => mapping(vec![("block", Node::Bool(true))]),
        "risk_threshold" => mapping(vec![
            ("block", Node::Bool(true)),
            dashclaw_type,
            ("_threshold", setting(rules, "threshold", Node::Int(80))),
            ("_action", setting(rules, "action", Node::from("block"))),
        ]),
        "rate_limit" => mapping(vec![
            ("block", Node::Bool(true)),
            dashclaw_type,
            ("_max_actions", setting(rules, "max_actions", Node::Int(50))),
            (
                "_window_minutes",
                setting(rules, "window_minutes", Node::Int(60)),
            ),
        ]),
        "webhook_check" => {
            let mut entries = vec![("require", Node::from("approval")), dashclaw_type];
            if let Some(url) = rules.get("url").filter(|u| u.is_present()) {
                entries.push(("_url", url.clone()));
            }
            entries.push(("_timeout_ms", setting(rules, "timeout_ms", Node::Int(5000))));
            entries.push(("_on_timeout", setting(rules, "on_timeout", Node::from("allow"))));
            mapping(entries)
        }
        "behavioral_anomaly" | "semantic_check" => mapping(vec![
            ("block", Node::Bool(true)),
            dashclaw_type,
            ("_note", Node::from(ADVANCED_POLICY_NOTE)),
        ]),
        _ => mapping(vec![("block", Node::Bool(true)), dashclaw_type]),
    }
}

/// A type-specific setting, falling back to `default` when unset or falsy.
fn setting(rules: &Node, key: &str, default: Node) -> Node {
    rules
        .get(key)
        .filter(|v| v.is_present())
        .cloned()
        .unwrap_or(default)
}

// ============================================================================
// Placeholder Tests
// ============================================================================

fn placeholder_tests(kind: &str, action_types: Option<&[Node]>) -> Vec<Node> {
    let first_action = |default: &str| {
        action_types
            .and_then(<[Node]>::first)
            .cloned()
            .unwrap_or_else(|| Node::from(default))
    };

    match kind {
        "require_approval" => {
            let tool = first_action("external_send");
            vec![
                test_case("blocks_without_approval", tool.clone(), Some(false), false),
                test_case("allows_with_approval", tool, Some(true), true),
            ]
        }
        "block_action_type" => vec![test_case(
            "blocks_action_type",
            first_action("destructive"),
            None,
            false,
        )],
        _ => vec![test_case(
            "placeholder_test",
            Node::from("example_tool"),
            None,
            false,
        )],
    }
}

fn test_case(name: &str, tool: Node, approval: Option<bool>, allowed: bool) -> Node {
    let mut input = vec![
        ("tool", tool),
        ("args", Node::Mapping(IndexMap::new())),
    ];
    if let Some(approval) = approval {
        input.push(("approval", Node::Bool(approval)));
    }

    mapping(vec![
        ("name", Node::from(name)),
        ("input", mapping(input)),
        ("expect", mapping(vec![("allowed", Node::Bool(allowed))])),
    ])
}

fn mapping(entries: Vec<(&str, Node)>) -> Node {
    Node::Mapping(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

// ============================================================================
// Tests
// ============================================================================
