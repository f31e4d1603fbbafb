//! Module manifest schema
//!
//! Defines the structure of the `manifest.json` file found at the root of
//! every module directory and served by the registry for each
//! published module version.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// File name of the manifest inside a module directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Validated description of a module.
///
/// Unknown JSON fields are ignored and missing optional fields default to
/// empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModuleManifest {
    /// Module name, e.g. `foo`
    pub name: String,

    /// Module version, e.g. `v0.0.1`
    pub version: String,

    /// Direct download URL of the module tarball
    pub tarball: String,

    pub summary: String,

    pub description: String,

    /// Domain the module is served under, e.g. `foo.oryon.cloud`
    pub domain: String,

    /// Entry-point file, e.g. `index.ts`
    pub main: String,

    /// Declared module dependencies, each `name` or `name@version`
    pub depends: Vec<String>,

    /// External dependencies grouped by kind, then package name to version
    /// constraint, e.g. `{"node_module": {"foo": "1.0.0"}}`
    pub external_dependencies: BTreeMap<String, BTreeMap<String, String>>,

    pub author: String,

    pub license: String,

    pub homepage: String,

    pub repository: String,

    /// Location inside the managed modules directory, set once by the copy step
    #[serde(skip)]
    path: Option<PathBuf>,
}

/// A parsed entry of [`ModuleManifest::depends`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub version: Option<String>,
}

impl DependencySpec {
    /// Parse `name` or `name@version`, splitting on the last `@`.
    pub fn parse(raw: &str) -> Self {
        match raw.rsplit_once('@') {
            Some((name, version)) if !version.is_empty() => Self {
                name: name.to_string(),
                version: Some(version.to_string()),
            },
            Some((name, _)) => Self {
                name: name.to_string(),
                version: None,
            },
            None => Self {
                name: raw.to_string(),
                version: None,
            },
        }
    }
}

impl std::fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

impl ModuleManifest {
    /// Parse and validate a manifest from JSON.
    ///
    /// `origin` names where the content came from (a file path or URL) and is
    /// only used in error messages.
    pub fn from_json(content: &str, origin: &str) -> Result<Self, FetchError> {
        let manifest: Self =
            serde_json::from_str(content).map_err(|e| FetchError::ManifestInvalid {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;
        manifest.validate(origin)?;
        Ok(manifest)
    }

    /// Read `manifest.json` from a module directory.
    pub fn from_dir(dir: &Path) -> Result<Self, FetchError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = match std::fs::read_to_string(&manifest_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::ManifestNotFound {
                    path: dir.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(FetchError::io(
                    format!("Failed to read manifest: {}", manifest_path.display()),
                    e,
                ));
            }
        };

        Self::from_json(&content, &manifest_path.display().to_string())
    }

    fn validate(&self, origin: &str) -> Result<(), FetchError> {
        let missing = if self.name.trim().is_empty() {
            "name"
        } else if self.version.trim().is_empty() {
            "version"
        } else if !is_plain_dir_name(&self.name) {
            return Err(FetchError::ManifestInvalid {
                origin: origin.to_string(),
                reason: format!("module name '{}' is not a valid directory name", self.name),
            });
        } else {
            return Ok(());
        };

        Err(FetchError::ManifestInvalid {
            origin: origin.to_string(),
            reason: format!("missing required field '{}'", missing),
        })
    }

    /// Parsed `depends` entries. Dependencies are captured, not resolved.
    pub fn dependencies(&self) -> Vec<DependencySpec> {
        self.depends.iter().map(|d| DependencySpec::parse(d)).collect()
    }

    /// Where the module was installed, once the copy step has run.
    pub fn install_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_installed(&self) -> bool {
        self.path.is_some()
    }

    /// Record the install location. The first recorded path wins.
    pub(crate) fn record_install_path(&mut self, path: PathBuf) {
        if self.path.is_none() {
            self.path = Some(path);
        }
    }
}

/// The module name becomes a directory under the managed modules root.
fn is_plain_dir_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\']) && !name.contains('\0')
}
