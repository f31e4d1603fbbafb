//! Registry resolver
//!
//! Translates `name[@version]` into a tarball URL by reading the
//! per-version manifest published in a GitHub-hosted registry repository:
//!
//! ```text
//! https://github.com/<owner>/<repo>
//!   -> https://raw.githubusercontent.com/<owner>/<repo>/main/addons/<name>/<version>/manifest.json
//! ```

use tracing::{debug, info};

use super::{RemoteResolver, ResolutionContext};
use crate::error::FetchError;
use crate::manifest::ModuleManifest;
use crate::source::RegistrySpec;

/// Registry used when none is configured.
pub const DEFAULT_REGISTRY_URL: &str = "https://github.com/oryon-cloud/registry";

/// Host serving raw files of GitHub repositories.
pub const RAW_CONTENT_BASE: &str = "https://raw.githubusercontent.com";

const GITHUB_PREFIX: &str = "https://github.com/";
const REGISTRY_BRANCH: &str = "main";

/// Looks modules up in the registry and hands the resulting tarball URL to
/// the [`RemoteResolver`].
#[derive(Debug)]
pub struct RegistryResolver {
    remote: RemoteResolver,
    registry_url: String,
    raw_content_base: String,
}

impl RegistryResolver {
    pub fn new(remote: RemoteResolver, registry_url: impl Into<String>) -> Self {
        Self {
            remote,
            registry_url: registry_url.into(),
            raw_content_base: RAW_CONTENT_BASE.to_string(),
        }
    }

    /// Serve registry manifests from `base` instead of raw.githubusercontent.com.
    ///
    /// The registry URL must still have the GitHub form; only the host the
    /// rewritten URL points at changes.
    pub fn with_raw_content_base(mut self, base: impl Into<String>) -> Self {
        self.raw_content_base = base.into();
        self
    }

    pub fn remote(&self) -> &RemoteResolver {
        &self.remote
    }

    pub fn registry_url(&self) -> &str {
        &self.registry_url
    }

    pub fn raw_content_base(&self) -> &str {
        &self.raw_content_base
    }

    pub fn resolve(
        &self,
        spec: &RegistrySpec,
        ctx: &mut ResolutionContext,
    ) -> Result<ModuleManifest, FetchError> {
        if spec.name.trim().is_empty() {
            return Err(FetchError::InvalidReference {
                reference: ctx.reference.clone(),
                reason: "module name is empty".to_string(),
            });
        }

        ctx.name = spec.name.clone();
        ctx.version = spec.version.clone();

        let download_url = self.resolve_download_url(ctx)?;
        info!(
            module = %ctx.name,
            version = %ctx.version,
            url = %download_url,
            "resolved module from registry"
        );

        self.remote.resolve(&download_url, ctx)
    }

    /// Fetch the registry manifest for the context's name and version and
    /// pick the tarball URL to download.
    pub fn resolve_download_url(&self, ctx: &mut ResolutionContext) -> Result<String, FetchError> {
        let manifest_url = manifest_url_on(
            &self.raw_content_base,
            &self.registry_url,
            &ctx.name,
            &ctx.version,
        )?;
        debug!(url = %manifest_url, "fetching registry manifest");

        let body = self.remote.http().get_bytes(&manifest_url)?;
        let manifest: ModuleManifest =
            serde_json::from_slice(&body).map_err(|e| FetchError::InvalidRegistryManifest {
                url: manifest_url.clone(),
                reason: e.to_string(),
            })?;

        let download_url = download_url_for(&manifest, &manifest_url)?;
        ctx.download_url = Some(download_url.clone());
        Ok(download_url)
    }
}

/// Raw-content URL of the manifest for `name` at `version`.
///
/// Only `https://github.com/<owner>/<repo>` registries are understood.
pub fn build_manifest_url(
    registry_base: &str,
    name: &str,
    version: &str,
) -> Result<String, FetchError> {
    manifest_url_on(RAW_CONTENT_BASE, registry_base, name, version)
}

fn manifest_url_on(
    raw_base: &str,
    registry_base: &str,
    name: &str,
    version: &str,
) -> Result<String, FetchError> {
    let unsupported = || FetchError::UnsupportedRegistry {
        registry: registry_base.to_string(),
    };

    let repo_path = registry_base
        .trim_end_matches('/')
        .strip_prefix(GITHUB_PREFIX)
        .ok_or_else(unsupported)?;

    let mut parts = repo_path.split('/');
    let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(unsupported)?;
    let repo = parts
        .next()
        .map(|s| s.trim_end_matches(".git"))
        .filter(|s| !s.is_empty())
        .ok_or_else(unsupported)?;

    Ok(format!(
        "{}/{owner}/{repo}/{REGISTRY_BRANCH}/addons/{name}/{version}/manifest.json",
        raw_base.trim_end_matches('/')
    ))
}

/// Tarball URL declared by a registry manifest.
///
/// Prefers `tarball`; otherwise derives the GitHub tag archive URL from
/// `repository` and `version`.
pub fn download_url_for(manifest: &ModuleManifest, manifest_url: &str) -> Result<String, FetchError> {
    if !manifest.tarball.trim().is_empty() {
        return Ok(manifest.tarball.trim().to_string());
    }

    let repository = manifest.repository.trim().trim_end_matches('/');
    let repository = repository.strip_suffix(".git").unwrap_or(repository);
    if repository.is_empty() {
        return Err(FetchError::InvalidRegistryManifest {
            url: manifest_url.to_string(),
            reason: "neither 'tarball' nor 'repository' is set".to_string(),
        });
    }

    if manifest.version.trim().is_empty() {
        return Err(FetchError::InvalidRegistryManifest {
            url: manifest_url.to_string(),
            reason: "'repository' is set but 'version' is empty".to_string(),
        });
    }

    Ok(format!(
        "{}/archive/refs/tags/{}.tar.gz",
        repository,
        manifest.version.trim()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(json: &str) -> ModuleManifest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builds_raw_content_url() {
        let url = build_manifest_url("https://github.com/oryon-cloud/registry", "foo", "v0.0.1")
            .unwrap();

        assert_eq!(
            url,
            "https://raw.githubusercontent.com/oryon-cloud/registry/main/addons/foo/v0.0.1/manifest.json"
        );
    }

    #[test]
    fn builds_latest_url() {
        let url =
            build_manifest_url("https://github.com/oryon-cloud/registry/", "foo", "latest").unwrap();

        assert_eq!(
            url,
            "https://raw.githubusercontent.com/oryon-cloud/registry/main/addons/foo/latest/manifest.json"
        );
    }

    #[test]
    fn strips_git_suffix_from_registry_repo() {
        let url =
            build_manifest_url("https://github.com/acme/addons.git", "foo", "1.0.0").unwrap();

        assert!(url.starts_with("https://raw.githubusercontent.com/acme/addons/main/"));
    }

    #[test]
    fn raw_content_base_is_configurable() {
        let url = manifest_url_on(
            "http://127.0.0.1:8080/",
            "https://github.com/oryon-cloud/registry",
            "foo",
            "latest",
        )
        .unwrap();

        assert_eq!(
            url,
            "http://127.0.0.1:8080/oryon-cloud/registry/main/addons/foo/latest/manifest.json"
        );
    }

    #[test]
    fn empty_name_fails_before_any_request() {
        let temp = tempfile::tempdir().unwrap();
        let http = crate::fetch::HttpClient::new(std::time::Duration::from_secs(1)).unwrap();
        let remote = RemoteResolver::new(
            crate::fetch::LocalResolver::new(temp.path().join("addons"), false),
            http,
            Some(temp.path().join("cache")),
        );
        // Unroutable base: any request would fail with DownloadFailed instead.
        let resolver = RegistryResolver::new(remote, DEFAULT_REGISTRY_URL)
            .with_raw_content_base("http://0.0.0.0:1");

        for reference in ["", "@1.0"] {
            let mut ctx = ResolutionContext::new(reference);
            let err = resolver
                .resolve(&RegistrySpec::parse(reference), &mut ctx)
                .unwrap_err();
            assert!(
                matches!(err, FetchError::InvalidReference { .. }),
                "{reference}: {err}"
            );
        }
        assert!(!temp.path().join("cache").exists());
    }

    #[test]
    fn non_github_registry_is_unsupported() {
        for base in [
            "https://gitlab.com/oryon-cloud/registry",
            "https://registry.example.com",
            "github.com/oryon-cloud/registry",
            "https://github.com/oryon-cloud",
            "https://github.com/",
        ] {
            let err = build_manifest_url(base, "foo", "latest").unwrap_err();
            assert!(
                matches!(err, FetchError::UnsupportedRegistry { .. }),
                "{base}"
            );
        }
    }

    #[test]
    fn tarball_wins() {
        let m = manifest(
            r#"{"name": "foo", "version": "0.0.1", "tarball": "https://x/foo-0.0.1.tar.gz",
                "repository": "https://github.com/a/foo"}"#,
        );

        assert_eq!(
            download_url_for(&m, "registry").unwrap(),
            "https://x/foo-0.0.1.tar.gz"
        );
    }

    #[test]
    fn repository_fallback_uses_tag_archive() {
        let m = manifest(
            r#"{"name": "foo", "version": "0.0.1", "tarball": "",
                "repository": "https://github.com/a/foo"}"#,
        );

        assert_eq!(
            download_url_for(&m, "registry").unwrap(),
            "https://github.com/a/foo/archive/refs/tags/0.0.1.tar.gz"
        );
    }

    #[test]
    fn repository_fallback_strips_git_suffix() {
        let m = manifest(
            r#"{"name": "foo", "version": "v1.0.0",
                "repository": "https://github.com/a/foo.git"}"#,
        );

        assert_eq!(
            download_url_for(&m, "registry").unwrap(),
            "https://github.com/a/foo/archive/refs/tags/v1.0.0.tar.gz"
        );
    }

    #[test]
    fn manifest_without_source_is_invalid() {
        let m = manifest(r#"{"name": "foo", "version": "0.0.1"}"#);

        let err = download_url_for(&m, "registry").unwrap_err();
        assert!(matches!(err, FetchError::InvalidRegistryManifest { .. }));
    }

    #[test]
    fn repository_without_version_is_invalid() {
        let m = manifest(r#"{"name": "foo", "repository": "https://github.com/a/foo"}"#);

        let err = download_url_for(&m, "registry").unwrap_err();
        assert!(matches!(err, FetchError::InvalidRegistryManifest { .. }));
    }
}
