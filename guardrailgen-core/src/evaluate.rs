//! Offline policy evaluation
//!
//! Decides whether a single tool-call input would be allowed by a policy,
//! and runs the `tests` a policy document carries for its own rules. This
//! never intercepts real tool calls: inputs come from the document itself.
//!
//! An input is a mapping shaped like `{tool, args, approval?, context?}`.
//! A policy applies when one of its `applies_to.tools` patterns matches the
//! input's `tool`; `*` in a pattern matches any run of characters.

use regex::{Regex, RegexBuilder};

use crate::node::Node;
use crate::policy::{PolicyDocument, PolicyRule};

// ============================================================================
// Decisions
// ============================================================================

/// Why a decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// No `applies_to.tools` pattern matched the tool.
    NotApplicable,
    /// Blocked, but the tool is on the rule's `allowlist`.
    Allowlisted,
    /// `block: true` matched.
    Blocked,
    /// `require: approval` without an approval.
    ApprovalRequired,
    /// `require: approval` with an approval.
    Approved,
    /// Every policy of a document allowed the input.
    AllPassed,
}

impl Reason {
    /// Text used in reports and matched by a test's `expect.reason`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotApplicable => "policy does not apply",
            Self::Allowlisted => "allowlisted",
            Self::Blocked => "blocked by policy",
            Self::ApprovalRequired => "approval required",
            Self::Approved => "approved",
            Self::AllPassed => "all policies passed",
        }
    }
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the input would be allowed.
    pub allowed: bool,
    /// Why, when a rule said so explicitly.
    pub reason: Option<Reason>,
    /// Policy that produced the decision (absent for [`Reason::AllPassed`]).
    pub policy_id: Option<String>,
}

impl Decision {
    fn new(allowed: bool, reason: Option<Reason>, policy: &PolicyRule) -> Self {
        Self {
            allowed,
            reason,
            policy_id: Some(policy.id.clone()),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Evaluates one policy against an input.
///
/// Rule semantics, in order: `block: true` denies unless the tool is on the
/// `allowlist`; `require: approval` allows only if `approval` or
/// `context.approved` is `true`; anything else allows.
#[must_use]
pub fn evaluate_policy(policy: &PolicyRule, input: &Node) -> Decision {
    let tool = input.get("tool").map(Node::to_string).unwrap_or_default();

    if !policy.applies_to.tools.iter().any(|p| tool_matches(p, &tool)) {
        return Decision::new(true, Some(Reason::NotApplicable), policy);
    }

    let rule = &policy.rule;
    if rule.get("block") == Some(&Node::Bool(true)) {
        let allowlisted = rule
            .get("allowlist")
            .and_then(Node::as_sequence)
            .is_some_and(|list| list.iter().any(|entry| entry.as_str() == Some(tool.as_str())));
        return if allowlisted {
            Decision::new(true, Some(Reason::Allowlisted), policy)
        } else {
            Decision::new(false, Some(Reason::Blocked), policy)
        };
    }

    if rule.get("require").and_then(Node::as_str) == Some("approval") {
        let approved = input.get("approval") == Some(&Node::Bool(true))
            || input.get("context").and_then(|c| c.get("approved")) == Some(&Node::Bool(true));
        return if approved {
            Decision::new(true, Some(Reason::Approved), policy)
        } else {
            Decision::new(false, Some(Reason::ApprovalRequired), policy)
        };
    }

    Decision::new(true, None, policy)
}

/// Evaluates every policy in order and returns the first denial, or an
/// allow with [`Reason::AllPassed`].
#[must_use]
pub fn evaluate_policies(policies: &[PolicyRule], input: &Node) -> Decision {
    policies
        .iter()
        .map(|policy| evaluate_policy(policy, input))
        .find(|decision| !decision.allowed)
        .unwrap_or(Decision {
            allowed: true,
            reason: Some(Reason::AllPassed),
            policy_id: None,
        })
}

/// Matches a tool name against one `applies_to.tools` entry.
///
/// Only string entries can match. `*` is a wildcard; every other character
/// is literal.
fn tool_matches(pattern: &Node, tool: &str) -> bool {
    let Some(pattern) = pattern.as_str() else {
        return false;
    };
    if !pattern.contains('*') {
        return pattern == tool;
    }
    glob_regex(pattern).is_some_and(|re| re.is_match(tool))
}

fn glob_regex(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).ok()
}

// ============================================================================
// Embedded Tests
// ============================================================================

/// Result of one embedded test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    /// Policy the test belongs to.
    pub policy_id: String,
    /// Test `name`, or `#<index>` when unnamed.
    pub name: String,
    /// Whether the decision matched the expectation.
    pub passed: bool,
    /// Failure explanation.
    pub message: Option<String>,
}

/// Runs every policy's `tests` against that policy alone.
///
/// A test case is `{name, input, expect: {allowed, reason?}}`. `reason` is
/// a case-insensitive regular expression matched against the decision's
/// reason.
#[must_use]
pub fn run_policy_tests(doc: &PolicyDocument) -> Vec<TestOutcome> {
    doc.policies
        .iter()
        .flat_map(|policy| {
            policy
                .tests
                .iter()
                .enumerate()
                .map(move |(idx, case)| run_test_case(policy, idx, case))
        })
        .collect()
}

fn run_test_case(policy: &PolicyRule, idx: usize, case: &Node) -> TestOutcome {
    let name = case
        .get("name")
        .filter(|n| n.is_present())
        .map_or_else(|| format!("#{idx}"), Node::to_string);

    let outcome = |message: Option<String>| TestOutcome {
        policy_id: policy.id.clone(),
        name: name.clone(),
        passed: message.is_none(),
        message,
    };

    let Some(input) = case.get("input").filter(|i| i.as_mapping().is_some()) else {
        return outcome(Some("test case has no input mapping".to_string()));
    };
    let expect = case.get("expect");
    let Some(expected) = expect.and_then(|e| e.get("allowed")).and_then(as_bool) else {
        return outcome(Some("test case has no boolean expect.allowed".to_string()));
    };

    let decision = evaluate_policy(policy, input);
    if decision.allowed != expected {
        return outcome(Some(format!(
            "expected allowed={expected}, got allowed={} ({})",
            decision.allowed,
            decision.reason.map_or("no reason", Reason::as_str)
        )));
    }

    if let Some(pattern) = expect.and_then(|e| e.get("reason")).and_then(Node::as_str) {
        let matched = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .size_limit(1 << 20)
            .build()
            .map_err(|e| format!("invalid expect.reason pattern: {e}"))
            .map(|re| decision.reason.is_some_and(|r| re.is_match(r.as_str())));
        match matched {
            Err(message) => return outcome(Some(message)),
            Ok(false) => {
                return outcome(Some(format!(
                    "reason {:?} does not match /{pattern}/i",
                    decision.reason.map_or("", Reason::as_str)
                )));
            }
            Ok(true) => {}
        }
    }

    outcome(None)
}

const fn as_bool(node: &Node) -> Option<bool> {
    match node {
        Node::Bool(b) => Some(*b),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::AppliesTo;

    fn yaml(text: &str) -> Node {
        Node::from(serde_yaml::from_str::<serde_yaml::Value>(text).unwrap())
    }

    fn policy(tools: &[&str], rule: &str) -> PolicyRule {
        PolicyRule {
            id: "p".to_string(),
            description: None,
            applies_to: AppliesTo {
                tools: tools.iter().map(|t| Node::from(*t)).collect(),
            },
            rule: yaml(rule),
            tests: Vec::new(),
        }
    }

    fn input(text: &str) -> Node {
        yaml(text)
    }

    #[test]
    fn test_glob_matching() {
        let p = policy(&["email.*"], "{block: true}");
        assert!(!evaluate_policy(&p, &input("{tool: email.send}")).allowed);
        assert_eq!(
            evaluate_policy(&p, &input("{tool: emailXsend}")).reason,
            Some(Reason::NotApplicable),
            "dot must be literal"
        );

        let any = policy(&["*"], "{block: true}");
        assert!(!evaluate_policy(&any, &input("{tool: anything}")).allowed);

        let infix = policy(&["fs.*.delete"], "{block: true}");
        assert!(!evaluate_policy(&infix, &input("{tool: fs.tmp.delete}")).allowed);
        assert!(evaluate_policy(&infix, &input("{tool: fs.tmp.read}")).allowed);
    }

    #[test]
    fn test_exact_and_non_string_patterns() {
        let mut p = policy(&["shell"], "{block: true}");
        assert!(!evaluate_policy(&p, &input("{tool: shell}")).allowed);
        assert!(evaluate_policy(&p, &input("{tool: shell2}")).allowed);

        p.applies_to.tools = vec![Node::Int(7)];
        assert_eq!(
            evaluate_policy(&p, &input("{tool: \"7\"}")).reason,
            Some(Reason::NotApplicable)
        );
    }

    #[test]
    fn test_block_with_allowlist() {
        let p = policy(&["*"], "{block: true, allowlist: [read_file]}");
        let allowed = evaluate_policy(&p, &input("{tool: read_file}"));
        assert!(allowed.allowed);
        assert_eq!(allowed.reason, Some(Reason::Allowlisted));

        let denied = evaluate_policy(&p, &input("{tool: write_file}"));
        assert!(!denied.allowed);
        assert_eq!(denied.reason, Some(Reason::Blocked));
        assert_eq!(denied.policy_id.as_deref(), Some("p"));
    }

    #[test]
    fn test_block_must_be_literal_true() {
        let p = policy(&["*"], "{block: \"yes\"}");
        let decision = evaluate_policy(&p, &input("{tool: x}"));
        assert!(decision.allowed);
        assert_eq!(decision.reason, None);
    }

    #[test]
    fn test_approval() {
        let p = policy(&["email.send"], "{require: approval}");
        let cases = [
            ("{tool: email.send}", false),
            ("{tool: email.send, approval: false}", false),
            ("{tool: email.send, approval: \"true\"}", false),
            ("{tool: email.send, approval: true}", true),
            ("{tool: email.send, context: {approved: true}}", true),
            ("{tool: email.send, context: {approved: 1}}", false),
        ];
        for (text, expected) in cases {
            let decision = evaluate_policy(&p, &input(text));
            assert_eq!(decision.allowed, expected, "input {text}");
            let reason = if expected {
                Reason::Approved
            } else {
                Reason::ApprovalRequired
            };
            assert_eq!(decision.reason, Some(reason));
        }
    }

    #[test]
    fn test_string_rule_allows() {
        let p = policy(&["shell"], "deny");
        let decision = evaluate_policy(&p, &input("{tool: shell}"));
        assert!(decision.allowed);
        assert_eq!(decision.reason, None);
    }

    #[test]
    fn test_evaluate_policies_first_denial() {
        let mut first = policy(&["shell"], "{require: approval}");
        first.id = "approve".to_string();
        let mut second = policy(&["*"], "{block: true}");
        second.id = "block".to_string();
        let policies = vec![first, second];

        let denied = evaluate_policies(&policies, &input("{tool: shell}"));
        assert_eq!(denied.policy_id.as_deref(), Some("approve"));

        let denied = evaluate_policies(&policies, &input("{tool: shell, approval: true}"));
        assert_eq!(denied.policy_id.as_deref(), Some("block"));

        let allowed = evaluate_policies(&policies[..1], &input("{tool: browser}"));
        assert!(allowed.allowed);
        assert_eq!(allowed.reason, Some(Reason::AllPassed));
        assert_eq!(allowed.policy_id, None);
    }

    #[test]
    fn test_run_policy_tests() {
        let doc = PolicyDocument::from_node(&yaml(
            r"
version: 1
policies:
  - id: approve-sends
    rule: {require: approval}
    applies_to: {tools: [email.send]}
    tests:
      - name: blocks_without_approval
        input: {tool: email.send, args: {}, approval: false}
        expect: {allowed: false, reason: approval}
      - name: wrong_expectation
        input: {tool: email.send, approval: true}
        expect: {allowed: false}
      - name: reason_mismatch
        input: {tool: email.send, approval: true}
        expect: {allowed: true, reason: blocked}
      - input: {tool: email.send}
      - name: no_input
        expect: {allowed: true}
",
        ))
        .unwrap();

        let outcomes = run_policy_tests(&doc);
        let summary: Vec<(&str, bool)> = outcomes
            .iter()
            .map(|o| (o.name.as_str(), o.passed))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("blocks_without_approval", true),
                ("wrong_expectation", false),
                ("reason_mismatch", false),
                ("#3", false),
                ("no_input", false),
            ]
        );
        assert!(outcomes.iter().all(|o| o.policy_id == "approve-sends"));
        assert!(
            outcomes[1]
                .message
                .as_deref()
                .unwrap()
                .contains("expected allowed=false, got allowed=true (approved)")
        );
    }

    #[test]
    fn test_invalid_reason_pattern_fails_test() {
        let doc = PolicyDocument::from_node(&yaml(
            r"
version: 1
policies:
  - id: b
    rule: {block: true}
    applies_to: {tools: ['*']}
    tests:
      - name: bad_pattern
        input: {tool: x}
        expect: {allowed: false, reason: '('}
",
        ))
        .unwrap();
        let outcomes = run_policy_tests(&doc);
        assert!(!outcomes[0].passed);
        assert!(
            outcomes[0]
                .message
                .as_deref()
                .unwrap()
                .starts_with("invalid expect.reason pattern")
        );
    }
}
