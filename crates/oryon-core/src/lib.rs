//! Oryon Core Library
//!
//! Resolves module references (local directories, tarball URLs and
//! registry names) into module trees under a managed addons directory,
//! then hands each installed manifest to the application.

pub mod config;
pub mod error;
pub mod fetch;
pub mod fs;
pub mod install;
pub mod manager;
pub mod manifest;
pub mod source;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, OryonConfig};

    // Errors
    pub use crate::error::FetchError;

    // Fetching
    pub use crate::fetch::{FetchOptions, ResolutionContext};
    pub use crate::manager::PackageManager;

    // Installation
    pub use crate::install::ModuleInstaller;

    // Manifests
    pub use crate::manifest::{DependencySpec, ModuleManifest};

    // Sources
    pub use crate::source::{ModuleReference, RegistrySpec, SourceKind, classify};
}
