//! Qualified-name registry for type and protocol definitions.
//!
//! The table maps `Namespace.Name` to the [`DefId`] of the definition. It is filled once by the
//! `build_symbol_table` pass and consulted by every later pass that needs to resolve a name.
//!
//! ## Notes
//! - Primitive names and aliases are never registered; [`SymbolTable::lookup`] answers them directly from the
//!   primitive registry.
//! - Generic type parameters are not registered either. They are visible only inside their declaring definition,
//!   so callers pass them to [`SymbolTable::lookup`] as an explicit scope.

use std::collections::HashMap;

use yarrow_core::lang::primitives;

use crate::frontend::ast::{DefId, Model, TypeDefinition};

/// Why a use-site name failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("the type '{0}' is not recognized")]
    NotRecognized(String),
    #[error("cannot reference a protocol")]
    Protocol,
    #[error("'{name}' was given {given} type argument(s) but has {expected} type parameter(s)")]
    ArgumentCount {
        name: String,
        given: usize,
        expected: usize,
    },
}

#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, DefId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` under `qualified_name`.
    ///
    /// ## Errors
    /// Returns the id already registered under that name; the table is left unchanged.
    pub fn insert(&mut self, qualified_name: String, id: DefId) -> Result<(), DefId> {
        match self.entries.get(&qualified_name) {
            Some(existing) => Err(*existing),
            None => {
                self.entries.insert(qualified_name, id);
                Ok(())
            }
        }
    }

    pub fn get(&self, qualified_name: &str) -> Option<DefId> {
        self.entries.get(qualified_name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a use-site name.
    ///
    /// Lookup order: primitive names and aliases, the generic parameters in `scope`, the name as given (an
    /// already-qualified `Ns.Name`), then `namespace.name`.
    ///
    /// ## Errors
    /// - [`ResolveError::NotRecognized`] when no step finds the name.
    /// - [`ResolveError::Protocol`] when the name refers to a protocol.
    pub fn lookup(&self, model: &Model, name: &str, namespace: &str, scope: &[DefId]) -> Result<DefId, ResolveError> {
        if let Some(primitive) = primitives::from_str(name) {
            return Ok(DefId::primitive(primitive));
        }

        if let Some(parameter) = scope.iter().find(|p| model.definition(**p).name() == name) {
            return Ok(*parameter);
        }

        let id = self
            .get(name)
            .or_else(|| self.get(&format!("{namespace}.{name}")))
            .ok_or_else(|| ResolveError::NotRecognized(name.to_string()))?;

        if matches!(model.definition(id), TypeDefinition::Protocol(_)) {
            return Err(ResolveError::Protocol);
        }
        Ok(id)
    }
}

/// Check that a reference passes as many type arguments as `id` declares parameters.
pub fn check_arity(model: &Model, id: DefId, given: usize) -> Result<(), ResolveError> {
    let definition = model.definition(id);
    let expected = definition.type_parameters().len();
    if expected == given {
        Ok(())
    } else {
        Err(ResolveError::ArgumentCount {
            name: definition.name().to_string(),
            given,
            expected,
        })
    }
}
