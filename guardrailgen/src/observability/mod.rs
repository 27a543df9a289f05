//! Observability module
//!
//! Logging setup for the CLI. The validation core itself never logs.

pub mod logging;

pub use logging::{LogFormat, init_logging};
