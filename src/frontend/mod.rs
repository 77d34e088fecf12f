//! yarrow compiler frontend
//!
//! - `ast`, `lexer`, `parser`, `loader`, `printer`, `diagnostics`: syntax layer, shared with the `yarrow_syntax`
//!   crate
//! - `symbols`: qualified-name registry
//! - `typefns`: structural queries over resolved types (equality, underlying types, widening)
//! - `generics`: generic instantiation
//! - `walk`: read-only visitors and rewriting traversals
//! - `validation`: the ordered validation passes
//! - `environment`: the validated model handed to code generators
//! - `schema`: protocol schema strings

// Syntax components are provided by the shared yarrow_syntax crate.
pub use yarrow_syntax::{ast, diagnostics, lexer, loader, parser, printer};

pub mod environment;
pub mod generics;
pub mod schema;
pub mod symbols;
pub mod typefns;
pub mod validation;
pub mod walk;
