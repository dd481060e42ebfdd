//! Generic composite tree walk
//!
//! The walker knows nothing about concrete field shapes: any node type that
//! can list its named children implements [`CompositeNode`] and gets leaf
//! dot-path enumeration for free.

use crate::path::FieldPath;
use crate::question::Question;

/// A node in a composite field tree
pub trait CompositeNode {
    /// Named children, in declaration order
    fn children(&self) -> Vec<(&str, &Self)>;
}

impl CompositeNode for Question {
    fn children(&self) -> Vec<(&str, &Self)> {
        self.subfields().collect()
    }
}

/// Visit every node below `root` depth-first, in declaration order
///
/// The root itself is not visited. The callback receives the node's path
/// and whether it is a leaf.
pub fn walk<N, F>(root_path: &FieldPath, root: &N, visit: &mut F)
where
    N: CompositeNode,
    F: FnMut(&FieldPath, &N, bool),
{
    for (key, child) in root.children() {
        let path = root_path.child(key);
        let grandchildren = child.children();
        let is_leaf = grandchildren.is_empty();
        visit(&path, child, is_leaf);
        if !is_leaf {
            walk(&path, child, visit);
        }
    }
}

/// Leaf dot-paths below a composite root
///
/// Returns an empty list for a node without children.
#[must_use]
pub fn leaf_paths<N: CompositeNode>(root_path: &FieldPath, root: &N) -> Vec<FieldPath> {
    let mut leaves = Vec::new();
    walk(root_path, root, &mut |path, _, is_leaf| {
        if is_leaf {
            leaves.push(path.clone());
        }
    });
    leaves
}

/// Leaf nodes below a composite root, paired with their paths
#[must_use]
pub fn leaves<'a, N: CompositeNode>(root_path: &FieldPath, root: &'a N) -> Vec<(FieldPath, &'a N)> {
    fn collect<'a, N: CompositeNode>(
        path: &FieldPath,
        node: &'a N,
        out: &mut Vec<(FieldPath, &'a N)>,
    ) {
        for (key, child) in node.children() {
            let child_path = path.child(key);
            if child.children().is_empty() {
                out.push((child_path, child));
            } else {
                collect(&child_path, child, out);
            }
        }
    }

    let mut out = Vec::new();
    collect(root_path, root, &mut out);
    out
}
