//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use todosync_core::Config;

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str = "api_url, owner_id, notice_timeout_ms, request_timeout_secs, log_file";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "api_url": config.api_url,
                    "owner_id": config.owner_id,
                    "notice_timeout_ms": config.notice_timeout_ms,
                    "request_timeout_secs": config.request_timeout_secs,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.api_url);
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  api_url:              {}", config.api_url);
            println!(
                "  owner_id:             {}",
                optional(config.owner_id.map(|id| id.to_string()))
            );
            println!("  notice_timeout_ms:    {}", config.notice_timeout_ms);
            println!(
                "  request_timeout_secs: {}",
                optional(config.request_timeout_secs.map(|s| s.to_string()))
            );
            println!(
                "  log_file:             {}",
                optional(config.log_file.as_ref().map(|p| p.display().to_string()))
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    config
        .save_with_cli_override(config_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "api_url" => {
            if value.is_empty() {
                bail!("api_url cannot be empty");
            }
            config.api_url = value.to_string();
        }
        "owner_id" => {
            config.owner_id = if is_unset(value) {
                None
            } else {
                Some(
                    value
                        .parse()
                        .context("Invalid value for owner_id. Use a numeric user id.")?,
                )
            };
        }
        "notice_timeout_ms" => {
            config.notice_timeout_ms = value
                .parse()
                .context("Invalid value for notice_timeout_ms. Use milliseconds.")?;
        }
        "request_timeout_secs" => {
            config.request_timeout_secs = if is_unset(value) {
                None
            } else {
                Some(
                    value
                        .parse()
                        .context("Invalid value for request_timeout_secs. Use seconds.")?,
                )
            };
        }
        "log_file" => {
            config.log_file = if is_unset(value) {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

fn is_unset(value: &str) -> bool {
    value.is_empty() || value == "none"
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "(not set)".to_string())
}
