use std::collections::BTreeMap;

use snafu::{ResultExt, Snafu};

use super::path::{InvalidPathError, split_path};

/// A node of the file tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    File { readonly: bool, content: String },
    Directory { children: BTreeMap<String, TreeNode> },
}

impl TreeNode {
    pub fn file(content: impl Into<String>) -> Self {
        TreeNode::File {
            readonly: false,
            content: content.into(),
        }
    }

    pub fn directory() -> Self {
        TreeNode::Directory {
            children: BTreeMap::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, TreeNode::Directory { .. })
    }
}

/// A file reachable from the tree root, as yielded by [`FileTree::leaves`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<'a> {
    pub path: String,
    pub readonly: bool,
    pub content: &'a str,
}

/// Nested view over a flat `path -> content` mapping.
///
/// A name inside a directory is either always a file or always a directory.
/// Inserting a path that would turn one into the other is rejected and leaves
/// the tree untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    children: BTreeMap<String, TreeNode>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree holding every entry of `files` as a writable leaf.
    pub fn from_flat<'a, I>(files: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        files
            .into_iter()
            .try_fold(Self::new(), |mut tree, (path, content)| {
                tree.insert(path, false, content.clone())?;
                Ok(tree)
            })
    }

    pub fn insert(
        &mut self,
        path: &str,
        readonly: bool,
        content: impl Into<String>,
    ) -> Result<(), TreeError> {
        let segments = split_path(path).context(PathSnafu)?;
        let Some((name, parents)) = segments.split_last() else {
            return Err(TreeError::PathError {
                source: InvalidPathError {
                    path: path.to_string(),
                },
            });
        };

        let mut current = &mut self.children;
        for (depth, segment) in parents.iter().enumerate() {
            let node = current
                .entry(segment.to_string())
                .or_insert_with(TreeNode::directory);

            match node {
                TreeNode::Directory { children } => current = children,
                TreeNode::File { .. } => {
                    return Err(TreeError::ConflictError {
                        path: path.to_string(),
                        existing: segments[..=depth].join("/"),
                    });
                }
            }
        }

        // An existing file is overwritten, an existing directory is not
        if current.get(*name).is_some_and(TreeNode::is_directory) {
            return Err(TreeError::ConflictError {
                path: path.to_string(),
                existing: path.to_string(),
            });
        }

        current.insert(
            name.to_string(),
            TreeNode::File {
                readonly,
                content: content.into(),
            },
        );
        Ok(())
    }

    /// Removes the file at `path` and prunes the directories it leaves empty.
    pub fn remove(&mut self, path: &str) -> Option<TreeNode> {
        let segments = split_path(path).ok()?;
        remove_from(&mut self.children, &segments)
    }

    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        let segments = split_path(path).ok()?;
        let (name, parents) = segments.split_last()?;

        let mut current = &self.children;
        for segment in parents {
            match current.get(*segment)? {
                TreeNode::Directory { children } => current = children,
                TreeNode::File { .. } => return None,
            }
        }
        current.get(*name)
    }

    pub fn children(&self) -> &BTreeMap<String, TreeNode> {
        &self.children
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Lists every file in the tree together with its full path, in path order.
    pub fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut leaves = Vec::new();
        collect_leaves(&self.children, "", &mut leaves);
        leaves
    }
}

fn remove_from(children: &mut BTreeMap<String, TreeNode>, segments: &[&str]) -> Option<TreeNode> {
    let (first, rest) = segments.split_first()?;

    if rest.is_empty() {
        return match children.get(*first) {
            Some(TreeNode::File { .. }) => children.remove(*first),
            _ => None,
        };
    }

    let (removed, now_empty) = match children.get_mut(*first)? {
        TreeNode::Directory { children: nested } => {
            let removed = remove_from(nested, rest);
            (removed, nested.is_empty())
        }
        TreeNode::File { .. } => return None,
    };

    if removed.is_some() && now_empty {
        children.remove(*first);
    }
    removed
}

fn collect_leaves<'a>(
    children: &'a BTreeMap<String, TreeNode>,
    prefix: &str,
    leaves: &mut Vec<Leaf<'a>>,
) {
    for (name, node) in children {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}/{name}")
        };

        match node {
            TreeNode::File { readonly, content } => leaves.push(Leaf {
                path,
                readonly: *readonly,
                content,
            }),
            TreeNode::Directory { children } => collect_leaves(children, &path, leaves),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum TreeError {
    #[snafu(display("Cannot place a file at an invalid path"))]
    PathError { source: InvalidPathError },
    #[snafu(display("Path '{}' conflicts with existing entry '{}'", path, existing))]
    ConflictError { path: String, existing: String },
}
