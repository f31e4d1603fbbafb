//! Parsed module references.

use std::fmt;
use std::path::PathBuf;

use super::SourceKind;
use super::classifier::{is_remote_url, local_dir};

/// Version requested when a registry reference carries no `@version`.
pub const DEFAULT_VERSION: &str = "latest";

/// A module reference classified into exactly one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleReference {
    /// Directory on disk, `file://` prefix already stripped
    Local(PathBuf),
    /// Tarball URL, validated later by the remote resolver
    Remote(String),
    /// Registry lookup
    Registry(RegistrySpec),
}

/// Name and version of a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySpec {
    pub name: String,
    pub version: String,
}

impl RegistrySpec {
    /// Parse `name` or `name@version`.
    pub fn parse(reference: &str) -> Self {
        let (name, version) = split_name_version(reference);
        Self { name, version }
    }
}

impl ModuleReference {
    /// Classify a raw reference string.
    ///
    /// Local directories take precedence over URLs, URLs over registry names.
    pub fn parse(reference: &str) -> Self {
        if let Some(dir) = local_dir(reference) {
            return Self::Local(dir);
        }

        if is_remote_url(reference) {
            return Self::Remote(reference.to_string());
        }

        Self::Registry(RegistrySpec::parse(reference))
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Local(_) => SourceKind::Local,
            Self::Remote(_) => SourceKind::Remote,
            Self::Registry(_) => SourceKind::Registry,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    pub fn is_registry(&self) -> bool {
        matches!(self, Self::Registry(_))
    }

    pub fn as_registry(&self) -> Option<&RegistrySpec> {
        match self {
            Self::Registry(spec) => Some(spec),
            _ => None,
        }
    }
}

impl fmt::Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
            Self::Registry(spec) => write!(f, "{}@{}", spec.name, spec.version),
        }
    }
}

/// Split a registry reference on its last `@`.
///
/// A missing or empty version becomes [`DEFAULT_VERSION`].
pub fn split_name_version(reference: &str) -> (String, String) {
    match reference.rsplit_once('@') {
        Some((name, version)) if !version.is_empty() => (name.to_string(), version.to_string()),
        Some((name, _)) => (name.to_string(), DEFAULT_VERSION.to_string()),
        None => (reference.to_string(), DEFAULT_VERSION.to_string()),
    }
}
