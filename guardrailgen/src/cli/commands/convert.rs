//! `convert` command
//!
//! Reads DashClaw policy records from an export file or a live instance,
//! converts them, validates the result and writes it as YAML.

use std::path::{Path, PathBuf};

use guardrailgen_core::{Node, PolicyDocument, validate_policy};

use crate::cli::args::ConvertArgs;
use crate::dashclaw::{DashClawClient, DashClawPolicy, convert_policies, parse_export};
use crate::error::{ConfigError, DashClawError, GuardrailError};

/// Pseudo-path reported when the converted document goes to stdout.
const CONVERTED_PATH: &str = "<converted>";

/// Convert DashClaw policies to a guardrails policy file.
///
/// # Errors
///
/// Returns a `DashClaw` error if the records cannot be read or converted,
/// a `Policy` error if the converted document does not validate, and an
/// I/O error if the output cannot be written.
pub async fn run(args: &ConvertArgs) -> Result<(), GuardrailError> {
    if args.check {
        client(args)?.check_connection().await?;
        println!("OK connection");
        return Ok(());
    }

    let records = read_records(args).await?;
    let doc = convert_policies(&records, &args.project)?;
    let yaml = render(&doc, args.out.as_deref())?;

    match &args.out {
        Some(path) => {
            tokio::fs::write(path, yaml).await?;
            tracing::info!(
                file = %path.display(),
                policies = doc.policies.len(),
                "wrote guardrails policy file"
            );
        }
        None => print!("{yaml}"),
    }

    Ok(())
}

async fn read_records(args: &ConvertArgs) -> Result<Vec<DashClawPolicy>, GuardrailError> {
    if let Some(path) = &args.input {
        let text = tokio::fs::read_to_string(path).await.map_err(|_| ConfigError::MissingFile {
            path: path.clone(),
        })?;
        tracing::debug!(file = %path.display(), "reading DashClaw export");
        return Ok(parse_export(&text)?);
    }

    Ok(client(args)?.fetch_policies().await?)
}

fn client(args: &ConvertArgs) -> Result<DashClawClient, DashClawError> {
    // `--check` is meaningless for a file export, so the URL is required here too
    let url = args.url.as_deref().ok_or_else(|| DashClawError::InvalidUrl {
        url: String::new(),
        message: "--url is required to reach a DashClaw instance".to_string(),
    })?;
    let api_key = args
        .api_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .ok_or(DashClawError::MissingApiKey)?;

    DashClawClient::new(url, api_key)
}

/// Validates the converted document and serializes it.
fn render(doc: &PolicyDocument, out: Option<&Path>) -> Result<String, GuardrailError> {
    validate_policy(&Node::from(doc)).map_err(|source| GuardrailError::Policy {
        path: out.map_or_else(|| PathBuf::from(CONVERTED_PATH), Path::to_path_buf),
        source,
    })?;

    Ok(serde_yaml::to_string(doc)?)
}
