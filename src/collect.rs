use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::convert::{ConversionJob, NotebookConverter};
use crate::domain::{DirNode, TreeNode};
use crate::error::{BuildError, Result};
use crate::fs::resolve_path;

pub const NOTEBOOK_EXTENSION: &str = "ipynb";
pub const DOCUMENT_EXTENSION: &str = "html";

pub struct CollectOptions<'a> {
    pub src: &'a Path,
    pub out: &'a Path,
    pub execute: bool,
    /// Directory names never descended into.
    pub ignore: &'a [String],
}

#[derive(Debug)]
pub struct Collected {
    /// Pruned tree; always a directory node, possibly without children.
    pub tree: TreeNode,
    pub nb_count: usize,
}

pub fn is_notebook(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(NOTEBOOK_EXTENSION))
}

fn is_excluded(entry: &DirEntry, out: &Path, ignore: &[String]) -> bool {
    if entry.path().starts_with(out) {
        return true;
    }
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| ignore.iter().any(|i| i == name))
}

/// Path components as tree node names. Non-UTF-8 names are converted lossily,
/// so two siblings that differ only in invalid bytes share one node.
fn rel_parts(rel: &Path) -> Vec<String> {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Walks `src`, converts every notebook into `out` and returns the pruned tree.
///
/// Entries are visited in file-name order, so children end up alphabetical
/// with directories and files interleaved. The first failed conversion aborts
/// the walk.
pub fn collect_tree(
    options: &CollectOptions<'_>,
    converter: &dyn NotebookConverter,
) -> Result<Collected> {
    let src = fs::canonicalize(options.src).map_err(|e| BuildError::io(options.src, e))?;
    let out = resolve_path(options.out)?;

    let root_name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut root = DirNode::new(root_name.clone(), "");
    let mut nb_count = 0;

    let walker = WalkDir::new(&src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e, &out, options.ignore));

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        let relative_path = path.strip_prefix(&src).map_err(|_e| {
            BuildError::io(
                path,
                std::io::Error::other("Failed to compute relative path"),
            )
        })?;
        let parts = rel_parts(relative_path);
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();

        if entry.file_type().is_dir() {
            root.find_or_create_dir(&parts);
            continue;
        }
        if !is_notebook(path) {
            debug!(path = %relative_path.display(), "Skipping non-notebook file");
            continue;
        }
        let Some((file_name, dirs)) = parts.split_last() else {
            continue;
        };

        let doc_rel = relative_path.with_extension(DOCUMENT_EXTENSION);
        let output = out.join(&doc_rel);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }

        info!(notebook = %relative_path.display(), "Converting notebook");
        converter.convert(&ConversionJob {
            notebook: path.to_path_buf(),
            output,
            execute: options.execute,
        })?;
        nb_count += 1;

        let nb_html = rel_parts(&doc_rel).join("/");
        root.find_or_create_dir(dirs).push_file(*file_name, nb_html);
    }

    let tree = TreeNode::Dir(root)
        .prune()
        .unwrap_or_else(|| TreeNode::Dir(DirNode::new(root_name, "")));

    Ok(Collected { tree, nb_count })
}
