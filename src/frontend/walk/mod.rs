//! Tree traversal shared by every validation pass.
//!
//! - [`visitor`]: read-only depth-first walk.
//! - [`rewriter`]: copy-on-write rewriting that rebuilds only the changed spine of a tree.

pub mod rewriter;
pub mod visitor;

pub use rewriter::{Rewriter, rewrite_in_place, rewrite_list};
pub use visitor::{Visitor, walk_model};
