//! Nested tree representation of a flat `/`-delimited path listing.
//!
//! This module turns a flat mapping of path to content into a tree where
//! nodes are either directories (that can contain other nodes) or files,
//! and keeps the two shapes from ever overlapping on the same path.

mod path;
mod tree;

pub use path::{InvalidPathError, split_path, validate_path};
pub use tree::{FileTree, Leaf, TreeError, TreeNode};
