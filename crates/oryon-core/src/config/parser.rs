//! TOML parser with helpful error messages

use super::schema::OryonConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse an oryon.toml file with detailed error messages
pub fn parse_oryon_toml(path: &Path) -> Result<OryonConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_oryon_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse oryon.toml content from string
pub fn parse_oryon_toml_str(content: &str) -> Result<OryonConfig> {
    let config: OryonConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Enhance TOML parsing errors with the offending lines
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();

    match error.span() {
        Some(span) => {
            let line_num = content[..span.start.min(content.len())].matches('\n').count() + 1;
            let context = get_line_context(content, line_num);
            anyhow::anyhow!(
                "TOML parsing error at line {}:\n{}\n\nError: {}",
                line_num,
                context,
                message
            )
        }
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    lines[start.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &OryonConfig) -> Result<String> {
    toml::to_string_pretty(config).with_context(|| "Failed to serialize configuration to TOML")
}
