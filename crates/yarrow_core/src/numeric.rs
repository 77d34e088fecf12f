//! Numeric policy shared by the expression resolver: literal narrowing and the primitive widening lattice.
//!
//! ## Notes
//! - The lattice is partial. `int64` has no common type with `uint64`, and no signed type has a
//!   common type with `size`; callers report those pairs as "no common type".
//! - Complex and real floating-point types never widen into each other.
//!
//! ## Examples
//! ```rust
//! use yarrow_core::lang::primitives::PrimitiveId;
//! use yarrow_core::numeric::{common_primitive, narrowest_integer};
//!
//! assert_eq!(common_primitive(PrimitiveId::Int8, PrimitiveId::Uint8), Some(PrimitiveId::Int16));
//! assert_eq!(common_primitive(PrimitiveId::Int64, PrimitiveId::Uint64), None);
//! assert_eq!(narrowest_integer(-1), Some(PrimitiveId::Int8));
//! assert_eq!(narrowest_integer(256), Some(PrimitiveId::Uint16));
//! ```

use crate::lang::primitives::{self, PrimitiveId};

use PrimitiveId::*;

/// Unordered primitive pairs and their common type.
const COMMON_TYPES: &[(PrimitiveId, PrimitiveId, PrimitiveId)] = &[
    (Int8, Int16, Int16),
    (Int8, Int32, Int32),
    (Int8, Int64, Int64),
    (Int8, Uint8, Int16),
    (Int8, Uint16, Int32),
    (Int8, Uint32, Int64),
    (Int8, Uint64, Int64),
    (Int8, Float32, Float32),
    (Int8, Float64, Float64),
    (Int16, Int32, Int32),
    (Int16, Int64, Int64),
    (Int16, Uint8, Int16),
    (Int16, Uint16, Int32),
    (Int16, Uint32, Int64),
    (Int16, Float32, Float32),
    (Int16, Float64, Float64),
    (Int32, Int64, Int64),
    (Int32, Uint8, Int32),
    (Int32, Uint16, Int32),
    (Int32, Uint32, Int64),
    (Int32, Float32, Float32),
    (Int32, Float64, Float64),
    (Uint8, Uint16, Uint16),
    (Uint8, Uint32, Uint32),
    (Uint8, Uint64, Uint64),
    (Uint8, Size, Size),
    (Uint8, Float32, Float32),
    (Uint8, Float64, Float64),
    (Uint16, Uint32, Uint32),
    (Uint16, Uint64, Uint64),
    (Uint16, Size, Size),
    (Uint16, Float32, Float32),
    (Uint16, Float64, Float64),
    (Uint32, Uint64, Uint64),
    (Uint32, Size, Size),
    (Uint32, Float32, Float32),
    (Uint32, Float64, Float64),
    (Uint64, Size, Size),
    (Uint64, Float32, Float32),
    (Uint64, Float64, Float64),
    (Float32, Float64, Float64),
    (ComplexFloat32, ComplexFloat64, ComplexFloat64),
];

/// Return the common type of two primitives under the widening lattice.
///
/// ## Returns
/// - `Some(a)` when `a == b`.
/// - `Some(common)` when the unordered pair has an entry in the lattice.
/// - `None` otherwise.
pub fn common_primitive(a: PrimitiveId, b: PrimitiveId) -> Option<PrimitiveId> {
    if a == b {
        return Some(a);
    }
    COMMON_TYPES
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, common)| *common)
}

const UNSIGNED_LADDER: &[PrimitiveId] = &[Uint8, Uint16, Uint32, Uint64];
const SIGNED_LADDER: &[PrimitiveId] = &[Int8, Int16, Int32, Int64];

/// Pick the narrowest integer primitive able to hold a literal value.
///
/// Non-negative values use the unsigned ladder (`uint8` .. `uint64`); negative values use the signed ladder
/// (`int8` .. `int64`).
///
/// ## Returns
/// - `None` when no 64-bit type can hold the value.
pub fn narrowest_integer(value: i128) -> Option<PrimitiveId> {
    let ladder = if value >= 0 { UNSIGNED_LADDER } else { SIGNED_LADDER };
    ladder.iter().copied().find(|p| fits(*p, value))
}

/// Check whether `value` lies within the range of an integer primitive.
pub fn fits(primitive: PrimitiveId, value: i128) -> bool {
    match primitives::integer_range(primitive) {
        Some((min, max)) => min <= value && value <= max,
        None => false,
    }
}
