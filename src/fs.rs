use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// Absolute form of `path` with symlinks resolved as far as the path exists.
/// The output directory usually does not exist yet, so this cannot simply be
/// `fs::canonicalize`.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|e| BuildError::io(path, e))?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = fs::canonicalize(existing) {
            resolved.extend(missing.iter().rev());
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

/// Removes a previous build. None of the `inputs` may live inside
/// `output_dir`.
pub fn prepare_output_dir(output_dir: &Path, inputs: &[&Path]) -> Result<()> {
    if let Some(inner) = inputs.iter().find(|p| p.starts_with(output_dir)) {
        return Err(BuildError::UnsafeClean {
            out: output_dir.to_path_buf(),
            inner: inner.to_path_buf(),
        });
    }
    if output_dir.exists() {
        info!(path = %output_dir.display(), "Cleaning output directory");
        fs::remove_dir_all(output_dir).map_err(|e| BuildError::io(output_dir, e))?;
    }
    Ok(())
}

/// Copies `src_dir` into `dst_dir` recursively, overwriting files that are
/// already there. A missing `src_dir` copies nothing.
pub fn copy_tree(src_dir: &Path, dst_dir: &Path) -> Result<()> {
    if !src_dir.is_dir() {
        return Ok(());
    }
    info!(from = %src_dir.display(), to = %dst_dir.display(), "Copying assets");

    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let relative_path = path.strip_prefix(src_dir).map_err(|_e| {
            BuildError::io(
                path,
                std::io::Error::other("Failed to compute relative path"),
            )
        })?;
        let output_path = dst_dir.join(relative_path);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&output_path).map_err(|e| BuildError::io(&output_path, e))?;
        } else if path.is_file() {
            process_asset(path, &output_path)?;
        }
    }
    Ok(())
}

fn process_asset(path: &Path, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::copy(path, output_path).map_err(|e| BuildError::io(path, e))?;
    Ok(())
}
