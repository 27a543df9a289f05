//! CLI module
//!
//! Argument parsing and command handlers for the `guardrailgen` binary.

pub mod args;
pub mod commands;
