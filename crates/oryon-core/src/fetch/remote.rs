//! Remote tarball resolver.

use std::io::Read;
use std::path::PathBuf;

use tracing::info;
use url::Url;

use super::archive::{ExtractedArchive, extract_tarball};
use super::{HttpClient, LocalResolver, ResolutionContext};
use crate::error::FetchError;
use crate::manifest::ModuleManifest;

const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz"];

/// Downloads a module tarball and hands the extracted tree to the
/// [`LocalResolver`].
#[derive(Debug)]
pub struct RemoteResolver {
    local: LocalResolver,
    http: HttpClient,
    scratch_dir: Option<PathBuf>,
}

impl RemoteResolver {
    pub fn new(local: LocalResolver, http: HttpClient, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            local,
            http,
            scratch_dir,
        }
    }

    pub fn local(&self) -> &LocalResolver {
        &self.local
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Download, extract and install the module at `url`.
    ///
    /// The scratch directory holding the extracted archive is removed before
    /// this returns, whether the fetch succeeded or not.
    pub fn resolve(
        &self,
        url: &str,
        ctx: &mut ResolutionContext,
    ) -> Result<ModuleManifest, FetchError> {
        ctx.download_url = Some(url.to_string());

        let url = Self::validate_url(url)?;
        info!(%url, "downloading module archive");
        let data = self.download(&url)?;
        let extracted = self.extract(data.as_slice())?;

        self.local.resolve(extracted.root(), ctx)
    }

    /// Accept only `http(s)` URLs whose path names a `.tar.gz` or `.tgz` file.
    ///
    /// This guards against accidental non-archive downloads; it is not a
    /// security boundary.
    pub fn validate_url(url: &str) -> Result<Url, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::DownloadFailed {
            url: url.to_string(),
            reason: format!("invalid URL: {e}"),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidScheme {
                url: url.to_string(),
                scheme: parsed.scheme().to_string(),
            });
        }

        if !ARCHIVE_SUFFIXES
            .iter()
            .any(|suffix| parsed.path().ends_with(suffix))
        {
            return Err(FetchError::InvalidArchiveType {
                url: url.to_string(),
            });
        }

        Ok(parsed)
    }

    /// GET the archive, following redirects.
    pub fn download(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.http.get_bytes(url.as_str())
    }

    /// Unpack a gzip-compressed tar stream into a fresh scratch directory.
    pub fn extract<R: Read>(&self, reader: R) -> Result<ExtractedArchive, FetchError> {
        extract_tarball(reader, self.scratch_dir.as_deref())
    }
}
