//! Source classification for module references.
//!
//! A module reference is routed to exactly one resolution strategy:
//! - Local directories (optionally prefixed with `file://`)
//! - Remote tarball URLs (`http(s)://host/path`)
//! - Registry names (`name` or `name@version`), the fallback

mod classifier;
mod reference;

pub use classifier::{SourceKind, classify};
pub use reference::{DEFAULT_VERSION, ModuleReference, RegistrySpec, split_name_version};
