use serde::{Deserialize, Serialize};

/// A directory or converted notebook in the scanned source tree.
///
/// Serializes as `{"type": "dir", ...}` / `{"type": "file", ...}`, the shape the
/// software page script walks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    Dir(DirNode),
    File(FileNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirNode {
    pub name: String,
    /// Path relative to the source root, `/`-separated; empty for the root.
    pub path: String,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    /// Converted document, relative to the output root.
    pub nb_html: String,
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Dir(dir) => &dir.name,
            TreeNode::File(file) => &file.name,
        }
    }

    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::Dir(dir) => &dir.children,
            TreeNode::File(_) => &[],
        }
    }

    /// Drops every directory with no file beneath it. Returns `None` when
    /// nothing survives.
    pub fn prune(self) -> Option<TreeNode> {
        match self {
            TreeNode::File(_) => Some(self),
            TreeNode::Dir(mut dir) => {
                dir.children = dir
                    .children
                    .into_iter()
                    .filter_map(TreeNode::prune)
                    .collect();
                (!dir.children.is_empty()).then_some(TreeNode::Dir(dir))
            }
        }
    }

    /// Number of file nodes in the subtree.
    #[cfg(test)]
    pub(crate) fn file_count(&self) -> usize {
        match self {
            TreeNode::File(_) => 1,
            TreeNode::Dir(dir) => dir.children.iter().map(TreeNode::file_count).sum(),
        }
    }
}

impl DirNode {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        DirNode {
            name: name.into(),
            path: path.into(),
            children: Vec::new(),
        }
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        }
    }

    /// Walks down `parts`, appending any missing directory on the way.
    pub fn find_or_create_dir<'a>(&'a mut self, parts: &[&str]) -> &'a mut DirNode {
        let Some((cur_folder, rest)) = parts.split_first() else {
            return self;
        };
        // Find index first to avoid overlapping mutable borrows
        let idx = match self
            .children
            .iter()
            .position(|n| matches!(n, TreeNode::Dir(d) if d.name == *cur_folder))
        {
            Some(i) => i,
            None => {
                let path = self.child_path(cur_folder);
                self.children
                    .push(TreeNode::Dir(DirNode::new(*cur_folder, path)));
                self.children.len() - 1
            }
        };

        match &mut self.children[idx] {
            TreeNode::Dir(child) => child.find_or_create_dir(rest),
            TreeNode::File(_) => unreachable!("index points at a directory"),
        }
    }

    pub fn push_file(&mut self, name: impl Into<String>, nb_html: impl Into<String>) {
        let name = name.into();
        let path = self.child_path(&name);
        self.children.push(TreeNode::File(FileNode {
            name,
            path,
            nb_html: nb_html.into(),
        }));
    }
}
