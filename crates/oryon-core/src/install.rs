//! Hand-off of resolved modules to the application.

use crate::manifest::ModuleManifest;

/// Registers a fetched module with the running application.
///
/// Receives a manifest whose install path is already set; what happens
/// next is entirely up to the implementation.
pub trait ModuleInstaller {
    fn install(&self, manifest: &ModuleManifest) -> anyhow::Result<()>;
}

impl<F> ModuleInstaller for F
where
    F: Fn(&ModuleManifest) -> anyhow::Result<()>,
{
    fn install(&self, manifest: &ModuleManifest) -> anyhow::Result<()> {
        self(manifest)
    }
}
