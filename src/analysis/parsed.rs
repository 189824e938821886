//! A parsed source file and its tree-sitter tree.

use std::path::{Path, PathBuf};

use tree_sitter::{Node, Tree};

use crate::error::{Error, Result};

/// Holds a parsed tree-sitter tree and associated metadata.
///
/// The tree is kept next to the text it was built from so node text can be
/// sliced out without re-reading the file.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: Tree,
    /// The original source code.
    pub source: String,
    /// The file path (for error reporting).
    pub path: PathBuf,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// Whether the tree contains ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Fail with [`Error::Syntax`] pointing at the first broken node.
    pub fn ensure_valid(&self) -> Result<()> {
        match first_error(self.tree.root_node()) {
            Some(node) => {
                let pos = node.start_position();
                Err(Error::Syntax {
                    path: self.path.clone(),
                    line: pos.row + 1,
                    column: pos.column + 1,
                })
            }
            None => Ok(()),
        }
    }

    /// The physical line (without terminator) at a 0-indexed row.
    pub fn line(&self, row: usize) -> &str {
        self.source.lines().nth(row).unwrap_or("")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Depth-first search for the first ERROR or MISSING node.
pub(crate) fn first_error(node: Node) -> Option<Node> {
    if !node.has_error() {
        return None;
    }
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    // has_error() without a reachable error child; report the node itself
    Some(node)
}
