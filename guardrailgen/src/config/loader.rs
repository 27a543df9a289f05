//! Policy file loader
//!
//! Turns a guardrails file into a generic [`Node`] tree:
//! 1. Size check against the configured limit
//! 2. Read as UTF-8, strip a BOM
//! 3. YAML parsing, with `<<` merge keys resolved
//!
//! The loader never judges the document's shape; an empty file loads as
//! `Null` and is left for the validator to reject.

use guardrailgen_core::Node;
use guardrailgen_core::error::ConfigError;

use std::path::{Path, PathBuf};

/// Default maximum policy file size in bytes.
pub const DEFAULT_MAX_POLICY_SIZE: usize = 10 * 1024 * 1024;

// ============================================================================
// Public API
// ============================================================================

/// Options for the policy loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum policy file size in bytes.
    pub max_file_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_file_size: env_or("GUARDRAILGEN_MAX_POLICY_SIZE", DEFAULT_MAX_POLICY_SIZE),
        }
    }
}

/// Policy file loader.
#[derive(Debug, Clone, Default)]
pub struct PolicyLoader {
    options: LoaderOptions,
}

impl PolicyLoader {
    /// Creates a new loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads and parses a policy file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or cannot be read
    /// - The file exceeds the size limit
    /// - The content is not UTF-8 or not valid YAML
    pub fn load(&self, path: &Path) -> Result<Node, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check_size(file_size)?;

        let raw = std::fs::read(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let text = String::from_utf8(raw).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            line: None,
            message: format!("file is not valid UTF-8: {e}"),
        })?;

        tracing::debug!(file = %path.display(), bytes = file_size, "parsing policy file");
        parse(&text, path)
    }

    /// Parses policy text that is already in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the text exceeds the size limit or is not valid
    /// YAML.
    pub fn load_from_str(&self, text: &str) -> Result<Node, ConfigError> {
        self.check_size(text.len())?;
        parse(text, Path::new("<memory>"))
    }

    fn check_size(&self, size: usize) -> Result<(), ConfigError> {
        if size > self.options.max_file_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{size} bytes"),
                expected: format!("at most {} bytes", self.options.max_file_size),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Parsing
// ============================================================================

fn parse(text: &str, path: &Path) -> Result<Node, ConfigError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if is_blank_document(text) {
        return Ok(Node::Null);
    }

    let parse_error = |e: serde_yaml::Error| ConfigError::ParseError {
        path: PathBuf::from(path),
        line: e.location().map(|l| l.line()),
        message: e.to_string(),
    };

    let mut value: serde_yaml::Value = serde_yaml::from_str(text).map_err(parse_error)?;
    // `<<: *anchor` merge keys are resolved, not kept as literal `<<` entries
    value.apply_merge().map_err(parse_error)?;

    Ok(Node::from(value))
}

/// `true` when the text holds no YAML content at all (only blank lines,
/// comments and document markers).
fn is_blank_document(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

/// Parses an environment variable with a default value.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================
