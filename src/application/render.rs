use std::collections::BTreeMap;
use std::fmt::Write as _;

use colored::Colorize;

use crate::filesystem::{FileTree, TreeNode};

/// Draws the tree the way `tree(1)` does, one entry per line.
pub fn render_tree(tree: &FileTree, color: bool) -> String {
    let mut out = String::new();
    render_children(tree.children(), "", color, &mut out);
    out
}

fn render_children(
    children: &BTreeMap<String, TreeNode>,
    prefix: &str,
    color: bool,
    out: &mut String,
) {
    let count = children.len();

    for (index, (name, node)) in children.iter().enumerate() {
        let last = index + 1 == count;
        let branch = if last { "└── " } else { "├── " };

        let label = match node {
            TreeNode::Directory { .. } if color => format!("{}/", name.bold().blue()),
            TreeNode::Directory { .. } => format!("{name}/"),
            TreeNode::File { readonly: true, .. } if color => {
                format!("{} (read-only)", name.dimmed())
            }
            TreeNode::File { readonly: true, .. } => format!("{name} (read-only)"),
            TreeNode::File { .. } => name.clone(),
        };
        let _ = writeln!(out, "{prefix}{branch}{label}");

        if let TreeNode::Directory { children } = node {
            let nested_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_children(children, &nested_prefix, color, out);
        }
    }
}
