//! Local directory resolver.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::ResolutionContext;
use crate::error::FetchError;
use crate::fs::{copy_module_tree, same_path};
use crate::manifest::ModuleManifest;

/// Turns a module directory on disk into an installed module.
#[derive(Debug, Clone)]
pub struct LocalResolver {
    modules_dir: PathBuf,
    force: bool,
}

impl LocalResolver {
    pub fn new(modules_dir: impl Into<PathBuf>, force: bool) -> Self {
        Self {
            modules_dir: modules_dir.into(),
            force,
        }
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    pub fn force(&self) -> bool {
        self.force
    }

    /// Where a module with this name is installed.
    pub fn destination(&self, name: &str) -> PathBuf {
        self.modules_dir.join(name)
    }

    /// Load a module from `dir` and copy it into the managed modules directory.
    pub fn resolve(
        &self,
        dir: &Path,
        ctx: &mut ResolutionContext,
    ) -> Result<ModuleManifest, FetchError> {
        ctx.source_dir = dir.to_path_buf();

        let mut manifest = self.load_manifest(ctx)?;
        self.copy_into(ctx, &mut manifest)?;
        Ok(manifest)
    }

    /// Read `manifest.json` from the context's source directory.
    ///
    /// On success the working name and version follow the manifest.
    pub fn load_manifest(&self, ctx: &mut ResolutionContext) -> Result<ModuleManifest, FetchError> {
        let manifest = ModuleManifest::from_dir(&ctx.source_dir)?;
        debug!(
            name = %manifest.name,
            version = %manifest.version,
            source = %ctx.source_dir.display(),
            "loaded module manifest"
        );

        ctx.name = manifest.name.clone();
        ctx.version = manifest.version.clone();
        Ok(manifest)
    }

    /// Copy the source directory to `<modules_dir>/<name>` and record the
    /// destination on the manifest.
    pub fn copy_into(
        &self,
        ctx: &ResolutionContext,
        manifest: &mut ModuleManifest,
    ) -> Result<(), FetchError> {
        let dest = self.destination(&ctx.name);

        if same_path(&ctx.source_dir, &dest) {
            info!(module = %ctx.name, "module already in place, skipping copy");
            manifest.record_install_path(dest);
            return Ok(());
        }

        if dest.exists() && !self.force {
            return Err(FetchError::AlreadyExists { path: dest });
        }

        copy_module_tree(&ctx.source_dir, &dest, self.force)?;
        info!(
            module = %ctx.name,
            version = %ctx.version,
            dest = %dest.display(),
            "copied module"
        );

        manifest.record_install_path(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_module(dir: &Path, name: &str, version: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("manifest.json"),
            format!(r#"{{"name": "{name}", "version": "{version}", "main": "index.ts"}}"#),
        )
        .unwrap();
        fs::write(dir.join("index.ts"), format!("// {version}")).unwrap();
    }

    #[test]
    fn load_manifest_sets_working_name_and_version() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("checkout");
        write_module(&src, "foo", "0.0.1");

        let resolver = LocalResolver::new(temp.path().join("addons"), false);
        let mut ctx = ResolutionContext::new("checkout");
        ctx.source_dir = src;
        ctx.name = "placeholder".to_string();

        let manifest = resolver.load_manifest(&mut ctx).unwrap();

        assert_eq!(manifest.name, "foo");
        assert_eq!(ctx.name, "foo");
        assert_eq!(ctx.version, "0.0.1");
    }

    #[test]
    fn resolve_installs_under_manifest_name() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("checkout");
        write_module(&src, "foo", "0.0.1");
        let addons = temp.path().join("addons");

        let resolver = LocalResolver::new(&addons, false);
        let mut ctx = ResolutionContext::new(src.display().to_string());
        let manifest = resolver.resolve(&src, &mut ctx).unwrap();

        assert_eq!(manifest.install_path(), Some(addons.join("foo").as_path()));
        assert!(addons.join("foo/index.ts").exists());
    }

    #[test]
    fn resolve_in_place_is_a_noop() {
        let temp = tempfile::tempdir().unwrap();
        let addons = temp.path().join("addons");
        let installed = addons.join("foo");
        write_module(&installed, "foo", "0.0.1");

        let resolver = LocalResolver::new(&addons, false);
        let mut ctx = ResolutionContext::new(installed.display().to_string());
        let manifest = resolver.resolve(&installed, &mut ctx).unwrap();

        assert_eq!(manifest.install_path(), Some(installed.as_path()));
        assert!(installed.join("manifest.json").exists());
    }

    #[test]
    fn existing_destination_without_force_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("checkout");
        write_module(&src, "foo", "0.0.2");
        let addons = temp.path().join("addons");
        write_module(&addons.join("foo"), "foo", "0.0.1");

        let resolver = LocalResolver::new(&addons, false);
        let mut ctx = ResolutionContext::new("checkout");
        let err = resolver.resolve(&src, &mut ctx).unwrap_err();

        assert!(matches!(err, FetchError::AlreadyExists { .. }));
        let content = fs::read_to_string(addons.join("foo/index.ts")).unwrap();
        assert_eq!(content, "// 0.0.1");
    }

    #[test]
    fn missing_manifest_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("empty");
        fs::create_dir_all(&src).unwrap();

        let resolver = LocalResolver::new(temp.path().join("addons"), false);
        let mut ctx = ResolutionContext::new("empty");
        let err = resolver.resolve(&src, &mut ctx).unwrap_err();

        assert!(matches!(err, FetchError::ManifestNotFound { .. }));
        assert!(!temp.path().join("addons").exists());
    }
}
