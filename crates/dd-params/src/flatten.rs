//! Overlay flattening
//!
//! Turns a nested override tree into a flat [`Overlay`] keyed by dotted path,
//! the same path space the rehydrator instantiates templates into. Leaves
//! (region maps and statistic records included) stop the recursion; empty
//! branches contribute nothing.

use crate::address;
use crate::node::{Branch, Leaf, Node};
use crate::path::PathError;
use std::collections::BTreeMap;

/// Flat mapping from dotted path to leaf
///
/// A [`Leaf::Null`] entry means "no override, use base".
pub type Overlay = BTreeMap<String, Leaf>;

/// Flatten a tree into dotted-path → leaf pairs
#[must_use]
pub fn flatten(tree: &Branch) -> Overlay {
    let mut out = Overlay::new();
    flatten_into(tree, None, &mut out);
    out
}

fn flatten_into(tree: &Branch, prefix: Option<&str>, out: &mut Overlay) {
    for (key, node) in tree {
        let path = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match node {
            Node::Leaf(leaf) => {
                out.insert(path, leaf.clone());
            }
            Node::Branch(branch) => flatten_into(branch, Some(&path), out),
        }
    }
}

/// Rebuild a nested tree from a flat overlay
///
/// # Errors
/// Returns [`PathError`] if a path is malformed or if one path addresses a
/// node below another path's leaf.
pub fn unflatten(overlay: &Overlay) -> Result<Branch, PathError> {
    let mut tree = Branch::new();
    for (path, leaf) in overlay {
        address::set(&mut tree, path, Node::Leaf(leaf.clone()))?;
    }
    Ok(tree)
}

/// Overlay value at `path`, ignoring explicit nulls
#[inline]
#[must_use]
pub fn override_at<'a>(overlay: &'a Overlay, path: &str) -> Option<&'a Leaf> {
    overlay.get(path).filter(|leaf| !leaf.is_null())
}
