//! Parameter trees for scenario inputs
//!
//! The leaf layer of the calculation workspace: nested technology parameter
//! trees, dotted-path addressing and the digest used to address cached
//! results.
//!
//! # Core Concepts
//!
//! - [`Node`] / [`Leaf`]: tagged-union tree nodes; region maps and
//!   `{value, statistic}` records are leaves
//! - [`TreePath`] / [`PathTemplate`]: concrete paths and technology-generic
//!   canonical paths
//! - [`address`]: `get` / `set` over trees
//! - [`flatten`]: nested override tree → flat [`Overlay`]
//! - [`CacheKey`]: 32-byte Blake3 digest
//!
//! # Example
//!
//! ```rust
//! use dd_params::{address, flatten, tree_from_json};
//! use serde_json::json;
//!
//! let tree = tree_from_json(json!({
//!     "technologies": {"solarpvutil": {"lifetime": {"value": 30.0, "statistic": ""}}}
//! }))
//! .unwrap();
//!
//! let flat = flatten(&tree);
//! let path = "technologies.solarpvutil.lifetime";
//! assert_eq!(address::get_leaf(&tree, path), flat.get(path));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod address;
mod flatten;
mod hash;
mod node;
mod path;
mod region;

// Re-exports
pub use flatten::{flatten, override_at, unflatten, Overlay};
pub use hash::{CacheKey, HashError};
pub use node::{
    branch_to_json, tree_from_json, Branch, Leaf, Node, RegionMap, Scalar, StatRecord, TreeError,
    STATISTIC_KEY, VALUE_KEY,
};
pub use path::{PathError, PathTemplate, TemplateSegment, TreePath, TECHNOLOGY_SLOT};
pub use region::{Region, UnknownRegion};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
