//! Config store for loading and saving oryon.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{OryonConfig, parser, paths::default_config_path};

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "ORYON_";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
    explicit: bool,
}

impl ConfigStore {
    /// Store backed by `$HOME/.oryon.toml`. The file may be absent.
    pub fn discover() -> anyhow::Result<Self> {
        Ok(Self {
            config_path: default_config_path()?,
            explicit: false,
        })
    }

    /// Store backed by a file the user named. The file must exist.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            explicit: true,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the file (if any) and apply `ORYON_*` overrides from the
    /// process environment.
    pub fn load(&self) -> anyhow::Result<OryonConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Like [`ConfigStore::load`], reading variables through `lookup`.
    pub fn load_with_env<F>(&self, lookup: F) -> anyhow::Result<OryonConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(&self) -> anyhow::Result<OryonConfig> {
        if !self.config_path.exists() {
            if self.explicit {
                anyhow::bail!("Config file not found: {}", self.config_path.display());
            }
            return Ok(OryonConfig::default());
        }
        parser::parse_oryon_toml(&self.config_path)
    }

    pub fn save(&self, config: &OryonConfig) -> anyhow::Result<()> {
        let content = parser::to_toml(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.config_path, content).with_context(|| {
            format!(
                "Failed to write config file: {}",
                self.config_path.display()
            )
        })?;
        Ok(())
    }
}

fn apply_env_overrides<F>(config: &mut OryonConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |suffix: &str| {
        let key = format!("{ENV_PREFIX}{suffix}");
        lookup(&key).map(|value| (key, value))
    };

    if let Some((_, value)) = var("ADDONS_PATH") {
        config.addons_path = PathBuf::from(value);
    }
    if let Some((_, value)) = var("CACHE_PATH") {
        config.cache_path = PathBuf::from(value);
    }
    if let Some((_, value)) = var("REGISTRY_URL") {
        config.registry_url = value;
    }
    if let Some((key, value)) = var("FORCE") {
        config.force = parse_bool(&key, &value)?;
    }
    if let Some((key, value)) = var("HTTP_TIMEOUT_SECS") {
        config.http_timeout_secs = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: '{value}'"))?;
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("Invalid value for {key}: '{value}' (expected true or false)"),
    }
}
