//! Error type shared by every resolver in the fetch pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single module fetch.
///
/// Every variant is terminal for the fetch that produced it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("manifest.json not found in {}", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("invalid manifest from {origin}: {reason}")]
    ManifestInvalid { origin: String, reason: String },

    #[error("module already exists at {} (use --force to overwrite)", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("unsupported URL scheme '{scheme}' in {url} (expected http or https)")]
    InvalidScheme { url: String, scheme: String },

    #[error("{url} does not point to a .tar.gz or .tgz archive")]
    InvalidArchiveType { url: String },

    #[error("failed to download {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("malformed archive: {reason}")]
    InvalidArchiveLayout { reason: String },

    #[error("invalid module reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("unsupported registry '{registry}' (only https://github.com/<owner>/<repo> is supported)")]
    UnsupportedRegistry { registry: String },

    #[error("invalid registry manifest at {url}: {reason}")]
    InvalidRegistryManifest { url: String, reason: String },

    #[error("failed to initialise HTTP client: {0}")]
    HttpClient(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Attaches a description to an `io::Result`, mirroring `anyhow::Context`.
pub(crate) trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|source| FetchError::io(f(), source))
    }
}
