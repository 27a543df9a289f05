//! Policy file loading
//!
//! Reads guardrails files from disk and parses them into the generic tree
//! consumed by [`guardrailgen_core::validation`].

pub mod loader;

pub use loader::{LoaderOptions, PolicyLoader};
