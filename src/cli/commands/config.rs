//! Configuration command implementations

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::{ConfigCommands, EXIT_CLEAN, Output, OutputFormat};
use crate::config::LintpassConfig;

/// Execute config commands
pub fn execute(cmd: ConfigCommands, config_path: Option<&Path>, output: &Output) -> Result<i32> {
    match cmd {
        ConfigCommands::Show { path, format } => show(&path, format, config_path, output),
    }
}

fn show(
    path: &Path,
    format: OutputFormat,
    config_path: Option<&Path>,
    output: &Output,
) -> Result<i32> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Project path {} not found", path.display()))?;
    let config = LintpassConfig::load_with_custom_config(&root, config_path)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => {
            output.header("Current Configuration");
            output.table_row("Project", &root.display().to_string());
            output.table_row("Workers", &config.worker_count().to_string());
            output.blank_line();

            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("{rendered}");
        }
    }

    Ok(EXIT_CLEAN)
}
