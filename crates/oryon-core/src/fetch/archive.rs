//! Gzip-compressed tarball extraction
//!
//! Archives come from arbitrary URLs, so extraction is defensive: entries
//! that would land outside the scratch directory are skipped, only
//! directories and regular files are materialized, and the result must have
//! exactly one top-level directory.

use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{FetchError, IoContext};

/// Prefix of per-fetch scratch directories.
const SCRATCH_PREFIX: &str = "oryon";

/// An extracted archive living in a scratch directory.
///
/// The scratch directory is removed when this value is dropped.
#[derive(Debug)]
pub struct ExtractedArchive {
    scratch: TempDir,
    root: PathBuf,
}

impl ExtractedArchive {
    /// The archive's single top-level directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }
}

/// Decompress and unpack a `.tar.gz` stream into a fresh scratch directory.
///
/// The scratch directory is created under `scratch_parent` when given,
/// otherwise under the system temp directory. It is removed again on every
/// error path.
pub fn extract_tarball<R: Read>(
    reader: R,
    scratch_parent: Option<&Path>,
) -> Result<ExtractedArchive, FetchError> {
    let scratch = create_scratch_dir(scratch_parent)?;
    debug!(dir = %scratch.path().display(), "extracting archive");

    unpack_entries(reader, scratch.path())?;
    let root = single_root(scratch.path())?;

    Ok(ExtractedArchive { scratch, root })
}

fn create_scratch_dir(parent: Option<&Path>) -> Result<TempDir, FetchError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);

    match parent {
        Some(parent) => {
            fs::create_dir_all(parent).io_context(|| {
                format!("Failed to create scratch directory: {}", parent.display())
            })?;
            builder.tempdir_in(parent).io_context(|| {
                format!("Failed to create temp directory in {}", parent.display())
            })
        }
        None => builder
            .tempdir()
            .io_context(|| "Failed to create temp directory"),
    }
}

fn unpack_entries<R: Read>(reader: R, dest: &Path) -> Result<(), FetchError> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let entries = archive.entries().map_err(unreadable)?;

    for entry in entries {
        let mut entry = entry.map_err(unreadable)?;
        let raw_path = entry.path().map_err(unreadable)?.into_owned();

        let Some(relative) = enclosed_path(&raw_path) else {
            warn!(path = %raw_path.display(), "skipping archive entry with unsafe path");
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(&relative);
        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().ok();

        if entry_type.is_dir() {
            fs::create_dir_all(&out_path).io_context(|| {
                format!("Failed to create directory: {}", out_path.display())
            })?;
            if let Some(mode) = mode {
                set_dir_mode(&out_path, mode)?;
            }
        } else if entry_type.is_file() {
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).io_context(|| {
                    format!("Failed to create parent directory: {}", parent.display())
                })?;
            }

            let mut outfile = fs::File::create(&out_path)
                .io_context(|| format!("Failed to create file: {}", out_path.display()))?;
            std::io::copy(&mut entry, &mut outfile)
                .io_context(|| format!("Failed to write file: {}", out_path.display()))?;

            if let Some(mode) = mode {
                set_file_mode(&out_path, mode)?;
            }
        } else {
            debug!(
                path = %raw_path.display(),
                kind = ?entry_type,
                "ignoring archive entry"
            );
        }
    }

    Ok(())
}

/// Resolve the single top-level directory of an extracted archive.
fn single_root(dir: &Path) -> Result<PathBuf, FetchError> {
    let mut entries = Vec::new();
    for entry in
        fs::read_dir(dir).io_context(|| format!("Failed to read dir: {}", dir.display()))?
    {
        entries.push(entry.io_context(|| format!("Failed to read dir entry: {}", dir.display()))?);
    }

    match entries.as_slice() {
        [] => Err(FetchError::InvalidArchiveLayout {
            reason: "archive is empty".to_string(),
        }),
        [only] => {
            let is_dir = only
                .file_type()
                .io_context(|| format!("Failed to stat {}", only.path().display()))?
                .is_dir();
            if is_dir {
                Ok(only.path())
            } else {
                Err(FetchError::InvalidArchiveLayout {
                    reason: format!(
                        "top-level entry '{}' is not a directory",
                        only.file_name().to_string_lossy()
                    ),
                })
            }
        }
        many => {
            let mut names: Vec<String> = many
                .iter()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            Err(FetchError::InvalidArchiveLayout {
                reason: format!(
                    "expected exactly one top-level directory, found {} ({})",
                    names.len(),
                    names.join(", ")
                ),
            })
        }
    }
}

/// Strip `.` components and reject absolute paths or `..` traversal.
fn enclosed_path(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

fn unreadable(err: std::io::Error) -> FetchError {
    FetchError::InvalidArchiveLayout {
        reason: format!("not a readable .tar.gz archive: {err}"),
    }
}

#[cfg(unix)]
fn set_dir_mode(path: &Path, mode: u32) -> Result<(), FetchError> {
    use std::os::unix::fs::PermissionsExt;
    // Owner keeps full access so the tree can be filled and cleaned up
    let mode = (mode & 0o777) | 0o700;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .io_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_dir_mode(_path: &Path, _mode: u32) -> Result<(), FetchError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: u32) -> Result<(), FetchError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
        .io_context(|| format!("Failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _mode: u32) -> Result<(), FetchError> {
    Ok(())
}
