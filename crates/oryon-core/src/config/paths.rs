//! Config path resolution helpers.

use std::path::{Path, PathBuf};

/// File name of the user configuration file in the home directory.
pub const CONFIG_FILE_NAME: &str = ".oryon.toml";

/// Root of oryon's per-user state: `<home>/.oryon`.
pub fn oryon_home(home: &Path) -> PathBuf {
    home.join(".oryon")
}

/// `$HOME/.oryon.toml`
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(CONFIG_FILE_NAME))
}

/// Home directory, falling back to the working directory when unknown.
pub(crate) fn home_or_cwd() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}
