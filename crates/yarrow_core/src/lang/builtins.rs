//! Builtin function vocabulary for computed-field expressions.
//!
//! ## Examples
//! ```rust
//! use yarrow_core::lang::builtins::{self, BuiltinFnId};
//!
//! assert_eq!(builtins::from_str("size"), Some(BuiltinFnId::Size));
//! assert_eq!(builtins::as_str(BuiltinFnId::DimensionIndex), "dimensionIndex");
//! ```

use super::registry::{self, LangItemInfo};

/// Stable identifier for a builtin function.
///
/// The discriminant order matches [`BUILTIN_FUNCTIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFnId {
    Size,
    DimensionIndex,
    DimensionCount,
}

/// Metadata for a builtin function.
pub type BuiltinFnInfo = LangItemInfo<BuiltinFnId>;

/// Registry of all builtin functions.
pub const BUILTIN_FUNCTIONS: &[BuiltinFnInfo] = &[
    info(
        BuiltinFnId::Size,
        "size",
        "Element count of a vector or map, or of an array (optionally along one dimension).",
    ),
    info(
        BuiltinFnId::DimensionIndex,
        "dimensionIndex",
        "Zero-based position of a named array dimension.",
    ),
    info(
        BuiltinFnId::DimensionCount,
        "dimensionCount",
        "Number of dimensions of an array.",
    ),
];

/// Return the full metadata entry for a builtin function.
pub fn info_for(id: BuiltinFnId) -> &'static BuiltinFnInfo {
    &BUILTIN_FUNCTIONS[id as usize]
}

/// Return the canonical spelling for a builtin function.
pub fn as_str(id: BuiltinFnId) -> &'static str {
    info_for(id).canonical
}

/// Resolve a spelling to a builtin function identifier. Matching is case-sensitive.
pub fn from_str(name: &str) -> Option<BuiltinFnId> {
    registry::lookup(BUILTIN_FUNCTIONS, name)
}

const fn info(id: BuiltinFnId, canonical: &'static str, description: &'static str) -> BuiltinFnInfo {
    LangItemInfo {
        id,
        canonical,
        aliases: &[],
        description,
    }
}
