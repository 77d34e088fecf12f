//! Primitive type vocabulary.
//!
//! This registry covers every builtin scalar type a model may reference, the aliases accepted for them, and the
//! numeric facts the validators need (integer ranges and classification).
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - `size` is a distinct primitive with the range of `uint64`; the two are structurally equivalent but neither is
//!   an alias of the other.
//!
//! ## Examples
//! ```rust
//! use yarrow_core::lang::primitives::{self, PrimitiveId};
//!
//! assert_eq!(primitives::from_str("double"), Some(PrimitiveId::Float64));
//! assert_eq!(primitives::integer_range(PrimitiveId::Int8), Some((-128, 127)));
//! assert!(primitives::is_integral(PrimitiveId::Size));
//! ```

use super::registry::LangItemInfo;

/// Stable identifier for a primitive type.
///
/// The discriminant order matches [`PRIMITIVES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveId {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Size,
    Float32,
    Float64,
    ComplexFloat32,
    ComplexFloat64,
    String,
    Date,
    Time,
    DateTime,
}

/// Broad classification of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Integer,
    FloatingPoint,
    ComplexFloatingPoint,
    String,
    Temporal,
}

/// Metadata for a primitive type.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveInfo {
    pub item: LangItemInfo<PrimitiveId>,
    pub kind: PrimitiveKind,
    /// Inclusive value range for integer primitives.
    pub range: Option<(i128, i128)>,
}

/// Registry of all primitive types, in [`PrimitiveId`] order.
pub const PRIMITIVES: &[PrimitiveInfo] = &[
    info(PrimitiveId::Bool, "bool", &[], "Boolean value.", PrimitiveKind::Boolean, None),
    info(
        PrimitiveId::Int8,
        "int8",
        &[],
        "Signed 8-bit integer.",
        PrimitiveKind::Integer,
        Some((i8::MIN as i128, i8::MAX as i128)),
    ),
    info(
        PrimitiveId::Uint8,
        "uint8",
        &["byte"],
        "Unsigned 8-bit integer.",
        PrimitiveKind::Integer,
        Some((0, u8::MAX as i128)),
    ),
    info(
        PrimitiveId::Int16,
        "int16",
        &[],
        "Signed 16-bit integer.",
        PrimitiveKind::Integer,
        Some((i16::MIN as i128, i16::MAX as i128)),
    ),
    info(
        PrimitiveId::Uint16,
        "uint16",
        &[],
        "Unsigned 16-bit integer.",
        PrimitiveKind::Integer,
        Some((0, u16::MAX as i128)),
    ),
    info(
        PrimitiveId::Int32,
        "int32",
        &["int"],
        "Signed 32-bit integer.",
        PrimitiveKind::Integer,
        Some((i32::MIN as i128, i32::MAX as i128)),
    ),
    info(
        PrimitiveId::Uint32,
        "uint32",
        &["uint"],
        "Unsigned 32-bit integer.",
        PrimitiveKind::Integer,
        Some((0, u32::MAX as i128)),
    ),
    info(
        PrimitiveId::Int64,
        "int64",
        &["long"],
        "Signed 64-bit integer.",
        PrimitiveKind::Integer,
        Some((i64::MIN as i128, i64::MAX as i128)),
    ),
    info(
        PrimitiveId::Uint64,
        "uint64",
        &["ulong"],
        "Unsigned 64-bit integer.",
        PrimitiveKind::Integer,
        Some((0, u64::MAX as i128)),
    ),
    info(
        PrimitiveId::Size,
        "size",
        &[],
        "Platform-size unsigned integer, serialized like uint64.",
        PrimitiveKind::Integer,
        Some((0, u64::MAX as i128)),
    ),
    info(
        PrimitiveId::Float32,
        "float32",
        &["float"],
        "IEEE 754 single-precision float.",
        PrimitiveKind::FloatingPoint,
        None,
    ),
    info(
        PrimitiveId::Float64,
        "float64",
        &["double"],
        "IEEE 754 double-precision float.",
        PrimitiveKind::FloatingPoint,
        None,
    ),
    info(
        PrimitiveId::ComplexFloat32,
        "complexfloat32",
        &["complexfloat"],
        "Complex number with single-precision components.",
        PrimitiveKind::ComplexFloatingPoint,
        None,
    ),
    info(
        PrimitiveId::ComplexFloat64,
        "complexfloat64",
        &["complexdouble"],
        "Complex number with double-precision components.",
        PrimitiveKind::ComplexFloatingPoint,
        None,
    ),
    info(PrimitiveId::String, "string", &[], "UTF-8 string.", PrimitiveKind::String, None),
    info(PrimitiveId::Date, "date", &[], "Calendar date.", PrimitiveKind::Temporal, None),
    info(PrimitiveId::Time, "time", &[], "Time of day.", PrimitiveKind::Temporal, None),
    info(
        PrimitiveId::DateTime,
        "datetime",
        &[],
        "Date and time with nanosecond precision.",
        PrimitiveKind::Temporal,
        None,
    ),
];

/// Every primitive id, in registry order.
pub const ALL: &[PrimitiveId] = &[
    PrimitiveId::Bool,
    PrimitiveId::Int8,
    PrimitiveId::Uint8,
    PrimitiveId::Int16,
    PrimitiveId::Uint16,
    PrimitiveId::Int32,
    PrimitiveId::Uint32,
    PrimitiveId::Int64,
    PrimitiveId::Uint64,
    PrimitiveId::Size,
    PrimitiveId::Float32,
    PrimitiveId::Float64,
    PrimitiveId::ComplexFloat32,
    PrimitiveId::ComplexFloat64,
    PrimitiveId::String,
    PrimitiveId::Date,
    PrimitiveId::Time,
    PrimitiveId::DateTime,
];

/// Return the full metadata entry for a primitive.
pub fn info_for(id: PrimitiveId) -> &'static PrimitiveInfo {
    &PRIMITIVES[id as usize]
}

/// Return the canonical spelling for a primitive (e.g. `"int32"` for `int`).
pub fn as_str(id: PrimitiveId) -> &'static str {
    info_for(id).item.canonical
}

/// Resolve a spelling (canonical or alias) to a primitive.
pub fn from_str(name: &str) -> Option<PrimitiveId> {
    if let Some(p) = PRIMITIVES.iter().find(|p| p.item.canonical == name) {
        return Some(p.item.id);
    }
    PRIMITIVES
        .iter()
        .find(|p| p.item.aliases.contains(&name))
        .map(|p| p.item.id)
}

/// Check whether `name` is reserved by the primitive registry (canonical names and aliases).
pub fn is_reserved(name: &str) -> bool {
    from_str(name).is_some()
}

/// Return the classification of a primitive.
pub fn kind(id: PrimitiveId) -> PrimitiveKind {
    info_for(id).kind
}

/// Return the inclusive value range of an integer primitive.
///
/// ## Returns
/// - `Some((min, max))` for the integer primitives (including `size`).
/// - `None` for every other primitive.
pub fn integer_range(id: PrimitiveId) -> Option<(i128, i128)> {
    info_for(id).range
}

/// Check whether a primitive is an integer type (`size` included).
pub fn is_integral(id: PrimitiveId) -> bool {
    kind(id) == PrimitiveKind::Integer
}

/// Check whether a primitive participates in arithmetic.
pub fn is_numeric(id: PrimitiveId) -> bool {
    matches!(
        kind(id),
        PrimitiveKind::Integer | PrimitiveKind::FloatingPoint | PrimitiveKind::ComplexFloatingPoint
    )
}

const fn info(
    id: PrimitiveId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    kind: PrimitiveKind,
    range: Option<(i128, i128)>,
) -> PrimitiveInfo {
    PrimitiveInfo {
        item: LangItemInfo {
            id,
            canonical,
            aliases,
            description,
        },
        kind,
        range,
    }
}
