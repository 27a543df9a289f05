//! CLI argument definitions
//!
//! All Clap derive structs for `guardrailgen` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueEnum};

use crate::dashclaw::DEFAULT_PROJECT;
use crate::observability::LogFormat;

// ============================================================================
// Root CLI
// ============================================================================

/// Validate guardrails policy documents.
#[derive(Parser, Debug)]
#[command(name = "guardrailgen", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "GUARDRAILGEN_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate guardrails policy files.
    Validate(ValidateArgs),

    /// Convert DashClaw policies into a guardrails policy file.
    Convert(ConvertArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Validate
// ============================================================================

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Policy files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Report every violation instead of stopping at the first one.
    #[arg(long)]
    pub all: bool,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,

    /// Run each policy's embedded `tests` against its rule.
    #[arg(long)]
    pub run_tests: bool,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Convert
// ============================================================================

/// Arguments for `convert`.
#[derive(Args, Debug)]
#[command(group = ArgGroup::new("source").required(true).multiple(false))]
pub struct ConvertArgs {
    /// DashClaw policy export (JSON array or `{"policies": [...]}`).
    #[arg(short, long, group = "source")]
    pub input: Option<PathBuf>,

    /// Base URL of a live DashClaw instance.
    #[arg(long, group = "source", env = "GUARDRAILGEN_DASHCLAW_URL")]
    pub url: Option<String>,

    /// DashClaw API key (required with `--url`).
    #[arg(long, env = "GUARDRAILGEN_DASHCLAW_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Project name written into the generated document.
    #[arg(long, default_value = DEFAULT_PROJECT)]
    pub project: String,

    /// Write the generated YAML here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Only check that the DashClaw API is reachable.
    #[arg(long)]
    pub check: bool,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
