//! Shared, pure vocabulary for the yarrow schema compiler.
//!
//! This crate is intentionally small and dependency-free. It holds the deterministic tables that both the
//! syntax frontend and the semantic passes consult:
//! - the primitive type registry (spellings, aliases, integer ranges, classification),
//! - the builtin function registry used by computed-field expressions,
//! - naming conventions for types and members,
//! - the numeric widening lattice used to find the common type of two primitives.
//!
//! ## Notes
//!
//! - No IO, no global state and no model types: callers work with stable ids such as
//!   [`lang::primitives::PrimitiveId`] and look metadata up through the registries.

pub mod lang;
pub mod numeric;
