//! Staged directory copies into the managed modules directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FetchError, IoContext};

/// Directory names never copied into an installed module.
const SKIPPED_DIRS: &[&str] = &[".git"];

/// Copy `src_dir` to `dst_dir`, leaving out `.git` directories.
///
/// The tree is first written into a hidden sibling of `dst_dir` and then
/// renamed into place, so a failed copy never leaves a half-written
/// destination behind. An existing destination is only replaced when
/// `force` is set.
pub fn copy_module_tree(src_dir: &Path, dst_dir: &Path, force: bool) -> Result<(), FetchError> {
    if !src_dir.is_dir() {
        return Err(FetchError::io(
            format!("Source directory is not readable: {}", src_dir.display()),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
    }

    let parent = dst_dir.parent().ok_or_else(|| {
        FetchError::io(
            format!("Destination path has no parent: {}", dst_dir.display()),
            std::io::Error::from(std::io::ErrorKind::InvalidInput),
        )
    })?;
    fs::create_dir_all(parent)
        .io_context(|| format!("Failed to create modules directory: {}", parent.display()))?;

    let tmp_dir = unique_temp_path(dst_dir)?;
    fs::create_dir(&tmp_dir)
        .io_context(|| format!("Failed to create temp directory: {}", tmp_dir.display()))?;

    if let Err(err) = copy_tree(src_dir, &tmp_dir) {
        let _ = fs::remove_dir_all(&tmp_dir);
        return Err(err);
    }

    if let Err(err) = replace_dst_with_tmp(dst_dir, &tmp_dir, force) {
        let _ = fs::remove_dir_all(&tmp_dir);
        return Err(err);
    }

    Ok(())
}

/// Whether two paths name the same location, resolving symlinks when both exist.
pub fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn replace_dst_with_tmp(dst_dir: &Path, tmp_dir: &Path, force: bool) -> Result<(), FetchError> {
    if fs::symlink_metadata(dst_dir).is_ok() {
        if !force {
            return Err(FetchError::AlreadyExists {
                path: dst_dir.to_path_buf(),
            });
        }
        remove_path(dst_dir).io_context(|| {
            format!(
                "Failed to remove existing destination: {}",
                dst_dir.display()
            )
        })?;
    }

    fs::rename(tmp_dir, dst_dir).io_context(|| {
        format!(
            "Failed to move temp path {} into destination {}",
            tmp_dir.display(),
            dst_dir.display()
        )
    })
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn unique_temp_path(dst_dir: &Path) -> Result<PathBuf, FetchError> {
    let invalid = || {
        FetchError::io(
            format!("Invalid destination path: {}", dst_dir.display()),
            std::io::Error::from(std::io::ErrorKind::InvalidInput),
        )
    };
    let parent = dst_dir.parent().ok_or_else(invalid)?;
    let base = dst_dir.file_name().ok_or_else(invalid)?;

    for attempt in 0u32..1000 {
        let name = if attempt == 0 {
            format!(".{}.tmp.{}", base.to_string_lossy(), std::process::id())
        } else {
            format!(
                ".{}.tmp.{}.{}",
                base.to_string_lossy(),
                std::process::id(),
                attempt
            )
        };
        let candidate = parent.join(name);
        if fs::symlink_metadata(&candidate).is_err() {
            return Ok(candidate);
        }
    }

    Err(FetchError::io(
        format!(
            "Failed to allocate a unique temp path for {}",
            dst_dir.display()
        ),
        std::io::Error::from(std::io::ErrorKind::AlreadyExists),
    ))
}

fn copy_tree(src: &Path, dst: &Path) -> Result<(), FetchError> {
    for entry in fs::read_dir(src).io_context(|| format!("Failed to read dir: {}", src.display()))? {
        let entry = entry.io_context(|| format!("Failed to read dir entry: {}", src.display()))?;
        let ty = entry
            .file_type()
            .io_context(|| format!("Failed to stat dir entry: {}", entry.path().display()))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if ty.is_dir() {
            if SKIPPED_DIRS.iter().any(|skip| entry.file_name() == *skip) {
                continue;
            }
            fs::create_dir_all(&to)
                .io_context(|| format!("Failed to create directory: {}", to.display()))?;
            copy_tree(&from, &to)?;
        } else if ty.is_file() {
            fs::copy(&from, &to).io_context(|| {
                format!(
                    "Failed to copy file from {} to {}",
                    from.display(),
                    to.display()
                )
            })?;
        } else if ty.is_symlink() {
            copy_symlink(&from, &to)?;
        } else {
            return Err(FetchError::io(
                format!("Unsupported filesystem entry type at {}", from.display()),
                std::io::Error::from(std::io::ErrorKind::Unsupported),
            ));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), FetchError> {
    let target =
        fs::read_link(from).io_context(|| format!("Failed to read symlink: {}", from.display()))?;
    std::os::unix::fs::symlink(&target, to)
        .io_context(|| format!("Failed to create symlink: {}", to.display()))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), FetchError> {
    // Follow the link and copy its target's content
    fs::copy(from, to).io_context(|| {
        format!(
            "Failed to copy file from {} to {}",
            from.display(),
            to.display()
        )
    })?;
    Ok(())
}
