//! Module acquisition pipeline.
//!
//! Three resolvers compose by explicit delegation:
//! registry → remote → local. Each layer holds the next one and calls it
//! once its own work is done, so every stage can be exercised in isolation.

pub mod archive;
pub mod http;
pub mod local;
pub mod registry;
pub mod remote;

use std::path::PathBuf;
use std::time::Duration;

pub use archive::{ExtractedArchive, extract_tarball};
pub use http::HttpClient;
pub use local::LocalResolver;
pub use registry::{
    DEFAULT_REGISTRY_URL, RAW_CONTENT_BASE, RegistryResolver, build_manifest_url, download_url_for,
};
pub use remote::RemoteResolver;

/// Default total deadline for a single HTTP request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings supplied by the caller for every fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Managed modules directory that installed modules are copied into
    pub modules_dir: PathBuf,
    /// Parent for per-fetch scratch directories (system temp dir when unset)
    pub scratch_dir: Option<PathBuf>,
    /// Replace an already installed module of the same name
    pub force: bool,
    /// Registry base URL used for bare module names
    pub registry_url: String,
    /// Total deadline for each HTTP request
    pub http_timeout: Duration,
}

impl FetchOptions {
    pub fn new(modules_dir: impl Into<PathBuf>) -> Self {
        Self {
            modules_dir: modules_dir.into(),
            scratch_dir: None,
            force: false,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(scratch_dir.into());
        self
    }

    pub fn with_registry_url(mut self, registry_url: impl Into<String>) -> Self {
        self.registry_url = registry_url.into();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

/// Mutable state of one fetch, threaded down the resolver chain.
///
/// Created per fetch and never shared between fetches.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
    /// The reference exactly as the user supplied it
    pub reference: String,
    /// Working module name, replaced by the manifest's name once loaded
    pub name: String,
    /// Working module version, replaced by the manifest's version once loaded
    pub version: String,
    /// Directory holding the module content to install
    pub source_dir: PathBuf,
    /// Tarball URL, for remote and registry fetches
    pub download_url: Option<String>,
}

impl ResolutionContext {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }
}
