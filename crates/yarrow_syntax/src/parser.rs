//! Parser for the shorthand grammars embedded in YAML scalars.
//!
//! Three small grammars share one token stream format:
//! - type strings (`Name<Arg>`, `T?`, `T*`, `T*4`, `T[x, y:2]`, `K->V`, `(T)`)
//! - switch-case patterns (`_`, `Type`, `Type binding`, `null`)
//! - computed-field expressions (literals, `.`, calls, subscripts, `as`, `+ - * / **`)
//!
//! ## Examples
//!
//! ```rust
//! use yarrow_syntax::ast::{SourceLocation, Type};
//! use yarrow_syntax::parser;
//!
//! let ty = parser::parse_type("int*4", &SourceLocation::new("m.yml", 1, 1)).unwrap();
//! assert!(matches!(ty, Type::Generalized(_)));
//! ```

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

use crate::ast::*;
use crate::diagnostics::Diagnostic;
use crate::lexer::{self, Token, TokenKind};

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module while avoiding a single large source file.

include!("parser/core.rs");
include!("parser/types.rs");
include!("parser/patterns.rs");
include!("parser/expr.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
