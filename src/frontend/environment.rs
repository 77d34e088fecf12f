//! The validated model handed to code generators.

use std::collections::BTreeMap;

use crate::frontend::ast::{DefId, Model, Namespace, TypeDefinition};
use crate::frontend::symbols::SymbolTable;

/// A fully resolved and validated model.
///
/// An `Environment` only exists for a model that produced no diagnostics. It is read-only: every accessor borrows.
///
/// ## Notes
/// - Each namespace lists its types in dependency order, so a single pass over [`Namespace::types`] never meets a
///   forward reference.
/// - Generic references point at deep instances. Instances live in the arena but are not listed in any namespace.
#[derive(Debug, Clone)]
pub struct Environment {
    model: Model,
    symbols: SymbolTable,
    /// Protocol schema strings keyed by qualified protocol name.
    schemas: BTreeMap<String, String>,
}

impl Environment {
    pub(crate) fn new(model: Model, symbols: SymbolTable, schemas: BTreeMap<String, String>) -> Self {
        Self {
            model,
            symbols,
            schemas,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.model.namespaces
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.model.namespace(name)
    }

    pub fn definition(&self, id: DefId) -> &TypeDefinition {
        self.model.definition(id)
    }

    /// Look up a definition by qualified name (`Ns.Name`).
    pub fn lookup(&self, qualified_name: &str) -> Option<&TypeDefinition> {
        self.symbols.get(qualified_name).map(|id| self.model.definition(id))
    }

    /// Type definitions of `namespace`, in dependency order.
    pub fn types<'e>(&'e self, namespace: &str) -> impl Iterator<Item = &'e TypeDefinition> + use<'e> {
        let ids = self.model.namespace(namespace).map(|ns| ns.types.as_slice()).unwrap_or_default();
        ids.iter().map(|id| self.model.definition(*id))
    }

    pub fn protocols<'e>(&'e self, namespace: &str) -> impl Iterator<Item = &'e TypeDefinition> + use<'e> {
        let ids = self
            .model
            .namespace(namespace)
            .map(|ns| ns.protocols.as_slice())
            .unwrap_or_default();
        ids.iter().map(|id| self.model.definition(*id))
    }

    /// The schema string of a protocol, when schemas were computed.
    pub fn protocol_schema(&self, qualified_name: &str) -> Option<&str> {
        self.schemas.get(qualified_name).map(String::as_str)
    }

    /// All computed protocol schemas, ordered by qualified protocol name.
    pub fn protocol_schemas(&self) -> impl Iterator<Item = (&str, &str)> {
        self.schemas.iter().map(|(name, schema)| (name.as_str(), schema.as_str()))
    }
}
