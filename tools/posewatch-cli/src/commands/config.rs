//! Show, validate, and initialize configuration.

use std::path::PathBuf;

use posewatch_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, path: Option<PathBuf>, write_default: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_file_path);

    if write_default {
        if path.exists() {
            anyhow::bail!("Config already exists: {}", path.display());
        }
        AppConfig::default().save_to(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("  (not found, using defaults)");
    }
    println!("{}", serde_json::to_string_pretty(config)?);

    match config.validate() {
        Ok(()) => println!("\n[OK] Configuration is valid"),
        Err(e) => anyhow::bail!("Configuration is invalid: {e}"),
    }
    Ok(())
}
