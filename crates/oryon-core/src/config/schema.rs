//! Configuration schema for oryon.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::{home_or_cwd, oryon_home};
use crate::fetch::{DEFAULT_HTTP_TIMEOUT, DEFAULT_REGISTRY_URL, FetchOptions};

/// Root configuration structure.
///
/// Every key is optional in the file; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OryonConfig {
    /// Managed modules directory
    pub addons_path: PathBuf,

    /// Parent of per-fetch scratch directories
    pub cache_path: PathBuf,

    /// Registry consulted for bare module names
    pub registry_url: String,

    /// Overwrite already installed modules
    pub force: bool,

    /// Total deadline for each HTTP request, in seconds
    pub http_timeout_secs: u64,
}

impl Default for OryonConfig {
    fn default() -> Self {
        Self::with_home(&home_or_cwd())
    }
}

impl OryonConfig {
    /// Defaults rooted at `<home>/.oryon`.
    pub fn with_home(home: &Path) -> Self {
        let root = oryon_home(home);
        Self {
            addons_path: root.join("addons"),
            cache_path: root.join("cache"),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            force: false,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT.as_secs(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.addons_path.as_os_str().is_empty() {
            anyhow::bail!("addons_path must not be empty");
        }
        if self.cache_path.as_os_str().is_empty() {
            anyhow::bail!("cache_path must not be empty");
        }
        if self.registry_url.trim().is_empty() {
            anyhow::bail!("registry_url must not be empty");
        }
        if self.http_timeout_secs == 0 {
            anyhow::bail!("http_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Options for the fetch pipeline.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::new(&self.addons_path)
            .with_scratch_dir(&self.cache_path)
            .with_force(self.force)
            .with_registry_url(&self.registry_url)
            .with_http_timeout(Duration::from_secs(self.http_timeout_secs))
    }
}
