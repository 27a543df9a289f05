//! Typed policy document model
//!
//! These types are only ever built from a tree that passed
//! [`validate_policy`], so every required field is known to be present.
//! They serialize back to the guardrails YAML layout.

use crate::error::ValidationError;
use crate::node::Node;
use crate::validation::validate_policy;

use indexmap::IndexMap;
use serde::Serialize;

// ============================================================================
// Top-Level Document
// ============================================================================

/// A validated guardrails policy document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyDocument {
    /// Schema version (always `1`)
    pub version: u32,

    /// Project the policies belong to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Rules in document order
    pub policies: Vec<PolicyRule>,
}

/// One named guardrail rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyRule {
    /// Rule identifier, as display text
    pub id: String,

    /// Human-readable summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Tools the rule is scoped to
    pub applies_to: AppliesTo,

    /// Rule payload, opaque to validation
    pub rule: Node,

    /// Embedded test cases, opaque to validation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<Node>,
}

/// Scope of a rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AppliesTo {
    /// Tool identifiers or patterns (never empty once validated)
    pub tools: Vec<Node>,
}

impl PolicyDocument {
    /// Validates `doc` and builds the typed view.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] if `doc` is not a valid policy
    /// document.
    pub fn from_node(doc: &Node) -> Result<Self, ValidationError> {
        validate_policy(doc)?;

        let policies = doc
            .get("policies")
            .and_then(Node::as_sequence)
            .unwrap_or_default()
            .iter()
            .map(PolicyRule::from_validated)
            .collect();

        Ok(Self {
            version: 1,
            project: doc.get("project").and_then(Node::as_str).map(str::to_string),
            policies,
        })
    }

    /// Looks up a rule by id.
    #[must_use]
    pub fn policy(&self, id: &str) -> Option<&PolicyRule> {
        self.policies.iter().find(|p| p.id == id)
    }
}

impl PolicyRule {
    fn from_validated(node: &Node) -> Self {
        let tools = node
            .get("applies_to")
            .and_then(|a| a.get("tools"))
            .and_then(Node::as_sequence)
            .map(<[Node]>::to_vec)
            .unwrap_or_default();

        Self {
            id: node.get("id").map(Node::to_string).unwrap_or_default(),
            description: node
                .get("description")
                .and_then(Node::as_str)
                .map(str::to_string),
            applies_to: AppliesTo { tools },
            rule: node.get("rule").cloned().unwrap_or_default(),
            tests: node
                .get("tests")
                .and_then(Node::as_sequence)
                .map(<[Node]>::to_vec)
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// Back to the Generic Tree
// ============================================================================

impl From<&PolicyDocument> for Node {
    fn from(doc: &PolicyDocument) -> Self {
        let mut root = IndexMap::new();
        root.insert("version".to_string(), Self::Int(i64::from(doc.version)));
        if let Some(project) = &doc.project {
            root.insert("project".to_string(), Self::from(project.as_str()));
        }
        root.insert(
            "policies".to_string(),
            Self::Sequence(doc.policies.iter().map(Self::from).collect()),
        );
        Self::Mapping(root)
    }
}

impl From<&PolicyRule> for Node {
    fn from(rule: &PolicyRule) -> Self {
        let mut entry = IndexMap::new();
        entry.insert("id".to_string(), Self::from(rule.id.as_str()));
        if let Some(description) = &rule.description {
            entry.insert("description".to_string(), Self::from(description.as_str()));
        }

        let mut applies_to = IndexMap::new();
        applies_to.insert(
            "tools".to_string(),
            Self::Sequence(rule.applies_to.tools.clone()),
        );
        entry.insert("applies_to".to_string(), Self::Mapping(applies_to));
        entry.insert("rule".to_string(), rule.rule.clone());

        if !rule.tests.is_empty() {
            entry.insert("tests".to_string(), Self::Sequence(rule.tests.clone()));
        }
        Self::Mapping(entry)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Node {
        Node::from(serde_yaml::from_str::<serde_yaml::Value>(text).unwrap())
    }

    const DOC: &str = r"
version: 1
project: openclaw-demo
policies:
  - id: external_send_requires_approval
    description: Any external send must require approval
    applies_to:
      tools: [message.send, email.send]
    rule:
      require: approval
  - id: no-secrets
    rule: deny
    applies_to: {tools: [shell]}
";

    #[test]
    fn test_from_node_builds_typed_view() {
        let doc = PolicyDocument::from_node(&yaml(DOC)).unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.project.as_deref(), Some("openclaw-demo"));
        assert_eq!(doc.policies.len(), 2);

        let first = &doc.policies[0];
        assert_eq!(first.id, "external_send_requires_approval");
        assert_eq!(
            first.description.as_deref(),
            Some("Any external send must require approval")
        );
        assert_eq!(
            first.applies_to.tools,
            vec![Node::from("message.send"), Node::from("email.send")]
        );
        assert_eq!(first.rule.get("require"), Some(&Node::from("approval")));
        assert!(first.tests.is_empty());

        let second = doc.policy("no-secrets").unwrap();
        assert_eq!(second.rule, Node::from("deny"));
        assert!(second.description.is_none());
    }

    #[test]
    fn test_from_node_propagates_validation_error() {
        let node = yaml("version: 1\npolicies: [{id: p1, rule: x, applies_to: {}}]");
        assert_eq!(
            PolicyDocument::from_node(&node),
            Err(ValidationError::MissingTools {
                id: "p1".to_string()
            })
        );
    }

    #[test]
    fn test_from_node_empty_policies() {
        let doc = PolicyDocument::from_node(&yaml("version: 1\npolicies: []")).unwrap();
        assert!(doc.policies.is_empty());
        assert!(doc.project.is_none());
    }

    #[test]
    fn test_to_node_is_valid_and_stable() {
        let doc = PolicyDocument::from_node(&yaml(DOC)).unwrap();
        let node = Node::from(&doc);
        assert_eq!(validate_policy(&node), Ok(()));
        assert_eq!(PolicyDocument::from_node(&node).unwrap(), doc);
    }

    #[test]
    fn test_serialized_layout() {
        let doc = PolicyDocument::from_node(&yaml(
            "version: 1\npolicies: [{id: p, rule: {block: true}, applies_to: {tools: [shell]}}]",
        ))
        .unwrap();
        let text = serde_yaml::to_string(&doc).unwrap();
        assert_eq!(
            text,
            "version: 1\npolicies:\n- id: p\n  applies_to:\n    tools:\n    - shell\n  rule:\n    block: true\n"
        );
    }
}
