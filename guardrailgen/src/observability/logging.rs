//! Logging initialization for `guardrailgen`.
//!
//! Structured logging via `tracing` with human-readable and JSON output,
//! verbosity from `-v` flags, and an environment override via
//! `GUARDRAILGEN_LOG_LEVEL`. Logs always go to stderr so stdout stays
//! reserved for command output.

use std::io::IsTerminal;

use clap::ValueEnum;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::args::ColorChoice;

/// Environment variable that overrides the verbosity flags.
pub const LOG_LEVEL_ENV: &str = "GUARDRAILGEN_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON for machine consumption.
    Json,
}

/// Maps a verbosity level to a tracing directive string.
///
/// - 0 → `"warn"`
/// - 1 → `"info"`
/// - 2 → `"debug"`
/// - 3+ → `"trace"` (saturates)
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initializes the global tracing subscriber.
///
/// `GUARDRAILGEN_LOG_LEVEL`, when set to a valid filter, takes precedence
/// over `verbosity`. A second call is a no-op.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let env = std::env::var(LOG_LEVEL_ENV).ok();
    let filter = EnvFilter::new(filter_directives(env.as_deref(), verbosity));

    let ansi = use_ansi(
        color,
        std::io::stderr().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    );

    let _ = tracing_subscriber::registry()
        .with(output_layer(format, verbosity >= 2, ansi))
        .with(filter)
        .try_init();
}

/// Directives for the level filter: the override if it parses, else the
/// level implied by `verbosity`.
fn filter_directives(env: Option<&str>, verbosity: u8) -> String {
    env.map(str::trim)
        .filter(|d| !d.is_empty() && EnvFilter::try_new(d).is_ok())
        .map_or_else(|| verbosity_to_directive(verbosity).to_string(), str::to_string)
}

/// `NO_COLOR` only affects auto-detection; `--color always` still wins.
const fn use_ansi(color: ColorChoice, stderr_is_terminal: bool, no_color: bool) -> bool {
    match color {
        ColorChoice::Auto => stderr_is_terminal && !no_color,
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Stderr formatter. JSON lines are never colored and carry event fields
/// at the top level.
fn output_layer(
    format: LogFormat,
    show_target: bool,
    ansi: bool,
) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Human => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(show_target)
            .with_ansi(ansi)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .with_target(show_target)
            .with_ansi(false)
            .boxed(),
    }
}
