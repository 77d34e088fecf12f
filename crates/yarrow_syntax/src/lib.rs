//! Syntax frontend for yarrow schemas: model tree, type/expression parser, YAML loader, diagnostics.
//!
//! ## Notes
//! - This crate is "syntax-only": it produces a [`ast::Model`] whose type references are still unresolved. Name
//!   resolution, generic instantiation and validation live in the `yarrow` crate.
//! - Primitive names, tags and builtin functions come from the `yarrow_core::lang` registries.
//!
//! ## Examples
//! ```rust
//! use yarrow_syntax::ast::SourceLocation;
//! use yarrow_syntax::{parser, printer};
//!
//! let ty = parser::parse_type("(int->string)?*", &SourceLocation::new("inline", 1, 1)).unwrap();
//! assert_eq!(printer::type_syntax(&ty, true), "(int->string)?*");
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod printer;
