//! Dotted-path get/set over parameter trees
//!
//! `get` never fails: a missing segment, or a segment that would have to
//! descend into a leaf, yields `None`. An explicit null is returned as
//! `Some(Leaf::Null)`, so callers can tell it apart from an absent path.

use crate::node::{Branch, Leaf, Node};
use crate::path::{PathError, TreePath};

/// Node at a dotted path
#[must_use]
pub fn get<'a>(tree: &'a Branch, path: &str) -> Option<&'a Node> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = tree.get(first)?;
    for segment in segments {
        current = match current {
            Node::Branch(branch) => branch.get(segment)?,
            Node::Leaf(_) => return None,
        };
    }
    Some(current)
}

/// Node at a parsed path
#[must_use]
pub fn get_at<'a>(tree: &'a Branch, path: &TreePath) -> Option<&'a Node> {
    let (last, init) = path.segments().split_last()?;
    let mut current = tree;
    for segment in init {
        match current.get(segment)? {
            Node::Branch(branch) => current = branch,
            Node::Leaf(_) => return None,
        }
    }
    current.get(last)
}

/// Leaf at a dotted path; `None` for absent paths and for branches
#[inline]
#[must_use]
pub fn get_leaf<'a>(tree: &'a Branch, path: &str) -> Option<&'a Leaf> {
    get(tree, path).and_then(Node::as_leaf)
}

/// Leaf at a parsed path; `None` for absent paths and for branches
#[inline]
#[must_use]
pub fn get_leaf_at<'a>(tree: &'a Branch, path: &TreePath) -> Option<&'a Leaf> {
    get_at(tree, path).and_then(Node::as_leaf)
}

/// Store `node` at a dotted path, creating intermediate branches
///
/// # Errors
/// - [`PathError::EmptySegment`] / [`PathError::EmptyPath`] for bad paths
/// - [`PathError::NotABranch`] if an intermediate segment holds a leaf
pub fn set(tree: &mut Branch, path: &str, node: Node) -> Result<(), PathError> {
    let parsed: TreePath = path.parse()?;
    set_at(tree, &parsed, node)
}

/// Store `node` at a parsed path, creating intermediate branches
///
/// # Errors
/// See [`set`].
pub fn set_at(tree: &mut Branch, path: &TreePath, node: Node) -> Result<(), PathError> {
    let (last, init) = path.segments().split_last().ok_or(PathError::EmptyPath)?;
    let mut current = tree;
    for (depth, segment) in init.iter().enumerate() {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Node::Branch(Branch::new()));
        current = match entry {
            Node::Branch(branch) => branch,
            Node::Leaf(_) => {
                return Err(PathError::NotABranch {
                    path: path.prefix(depth + 1).to_string(),
                })
            }
        };
    }
    current.insert(last.clone(), node);
    Ok(())
}
