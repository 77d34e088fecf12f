//! yarrow vocabulary registries.
//!
//! Callers work with **stable IDs** (e.g. `PrimitiveId`, `BuiltinFnId`) and look up spellings and metadata through
//! registry tables instead of scattering string comparisons across the compiler.
//!
//! ## Examples
//! ```rust
//! use yarrow_core::lang::primitives::{self, PrimitiveId};
//!
//! assert_eq!(primitives::from_str("int"), Some(PrimitiveId::Int32));
//! assert_eq!(primitives::as_str(PrimitiveId::Int32), "int32");
//! ```

pub mod builtins;
pub mod conventions;
pub mod primitives;
pub mod registry;
pub mod tags;
