//! Package manager facade: classify, fetch, install.

use anyhow::Context;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::fetch::{
    FetchOptions, HttpClient, LocalResolver, RegistryResolver, RemoteResolver, ResolutionContext,
};
use crate::install::ModuleInstaller;
use crate::manifest::ModuleManifest;
use crate::source::ModuleReference;

/// Entry point for fetching and installing modules.
///
/// Owns the resolver chain; each call to [`PackageManager::fetch`] gets its
/// own [`ResolutionContext`].
///
/// All operations block. Use the manager from synchronous code only, or
/// from `tokio::task::spawn_blocking` inside an async runtime; see
/// [`HttpClient`].
#[derive(Debug)]
pub struct PackageManager {
    registry: RegistryResolver,
}

impl PackageManager {
    pub fn new(options: FetchOptions) -> Result<Self, FetchError> {
        let local = LocalResolver::new(options.modules_dir, options.force);
        let http = HttpClient::new(options.http_timeout)?;
        let remote = RemoteResolver::new(local, http, options.scratch_dir);
        let registry = RegistryResolver::new(remote, options.registry_url);

        Ok(Self { registry })
    }

    pub fn local(&self) -> &LocalResolver {
        self.registry.remote().local()
    }

    pub fn remote(&self) -> &RemoteResolver {
        self.registry.remote()
    }

    pub fn registry(&self) -> &RegistryResolver {
        &self.registry
    }

    /// Resolve `reference` into an installed module tree.
    ///
    /// On success the returned manifest's install path is set.
    pub fn fetch(&self, reference: &str) -> Result<ModuleManifest, FetchError> {
        let parsed = ModuleReference::parse(reference);
        debug!(reference, kind = ?parsed.kind(), "classified module reference");

        let mut ctx = ResolutionContext::new(reference);
        let manifest = match &parsed {
            ModuleReference::Local(dir) => self.local().resolve(dir, &mut ctx)?,
            ModuleReference::Remote(url) => self.remote().resolve(url, &mut ctx)?,
            ModuleReference::Registry(spec) => self.registry.resolve(spec, &mut ctx)?,
        };

        info!(
            reference,
            module = %manifest.name,
            version = %manifest.version,
            "fetched module"
        );
        Ok(manifest)
    }

    /// Fetch `reference` and pass the result to `installer`.
    pub fn install(
        &self,
        reference: &str,
        installer: &dyn ModuleInstaller,
    ) -> anyhow::Result<ModuleManifest> {
        let manifest = self
            .fetch(reference)
            .with_context(|| format!("Failed to fetch module '{}'", reference))?;

        if !manifest.is_installed() {
            anyhow::bail!(
                "Module '{}' was fetched but has no install path",
                manifest.name
            );
        }

        installer
            .install(&manifest)
            .with_context(|| format!("Failed to install module '{}'", manifest.name))?;
        Ok(manifest)
    }

    /// Install each reference in order, one full fetch-then-install cycle at
    /// a time. Stops at the first failure.
    pub fn install_all<S: AsRef<str>>(
        &self,
        references: &[S],
        installer: &dyn ModuleInstaller,
    ) -> anyhow::Result<Vec<ModuleManifest>> {
        let mut installed = Vec::with_capacity(references.len());
        for reference in references {
            let reference = reference.as_ref();
            info!(reference, "installing module");
            installed.push(self.install(reference, installer)?);
        }
        Ok(installed)
    }
}
