//! `guardrailgen` - guardrails policy tooling
//!
//! Loads guardrails policy files, validates them with
//! [`guardrailgen_core`], and converts DashClaw policy exports into the
//! guardrails format.

pub mod cli;
pub mod config;
pub mod dashclaw;
pub mod error;
pub mod observability;
