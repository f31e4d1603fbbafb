//! Routing of raw reference strings to a resolution strategy.

use std::path::{Path, PathBuf};

use url::Url;

use super::ModuleReference;

/// Resolution strategy selected for a module reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// An existing directory on the local filesystem
    Local,
    /// A direct tarball URL
    Remote,
    /// A bare name looked up in the registry
    Registry,
}

/// Decide which strategy applies to `reference`.
///
/// Never fails and never touches the network: anything that is neither an
/// existing directory nor an absolute URL is treated as a registry name.
pub fn classify(reference: &str) -> SourceKind {
    ModuleReference::parse(reference).kind()
}

/// The directory named by `reference`, if it exists.
pub(crate) fn local_dir(reference: &str) -> Option<PathBuf> {
    let path = reference.strip_prefix("file://").unwrap_or(reference);
    if path.is_empty() {
        return None;
    }

    let path = Path::new(path);
    path.is_dir().then(|| path.to_path_buf())
}

/// Whether `reference` is an absolute URL with a scheme, a host and a path.
///
/// A bare `/` after the host counts as a path; `https://host` does not.
pub(crate) fn is_remote_url(reference: &str) -> bool {
    let Ok(url) = Url::parse(reference) else {
        return false;
    };

    let has_host = url.host_str().is_some_and(|host| !host.is_empty());
    has_host && has_path(reference, &url)
}

/// The url crate normalises an empty path to `/` for http(s), so look at the
/// raw text after the authority as well.
fn has_path(reference: &str, url: &Url) -> bool {
    if !url.path().trim_start_matches('/').is_empty() {
        return true;
    }

    reference
        .split_once("://")
        .map(|(_, rest)| {
            let before_query = rest.split(['?', '#']).next().unwrap_or("");
            before_query.contains('/')
        })
        .unwrap_or(false)
}
