#![forbid(unsafe_code)]
//! yarrow schema compiler front end
//!
//! yarrow reads data models written in YAML (records, enums, flags, protocols and aliases, with generics, unions
//! and vector/array/map/stream containers) and turns them into a resolved, validated model for code generators.
//!
//! ## Pipeline
//!
//! 1. [`config::load_package`] reads `_package.yml` manifests and follows imports.
//! 2. [`frontend::loader`] converts model files into an unresolved [`ast::Model`].
//! 3. [`frontend::validation::Validator`] resolves names, instantiates generics, checks structure and type checks
//!    computed fields, producing a [`frontend::environment::Environment`].
//! 4. [`frontend::schema`] writes the protocol schema strings serializers embed.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod config;
pub mod frontend;

pub use frontend::ast;
pub use frontend::diagnostics;
pub use frontend::environment::Environment;
pub use frontend::validation::{Validator, validate};

pub use config::{PackageConfig, PackageSet, ValidateOptions, load_package};
