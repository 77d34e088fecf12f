//! Name resolution: the symbol table, use-site references and generic instances.
//!
//! Resolution runs in two sweeps over every namespace definition. The first resolves each [`SimpleType`] to a
//! [`DefId`] and rewrites its name to the qualified name. The second replaces non-recursive generic references with
//! shallow instances; it needs every body resolved first because an instance copies the body of its generic.
//! Deep instances are built later by [`convert_generic_references`], once the model is known to be acyclic.

use yarrow_core::lang::primitives;

use super::PassContext;
use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::generics::{Instantiator, Mode};
use crate::frontend::symbols::{self, SymbolTable};
use crate::frontend::walk::rewriter::{self, Rewriter};

pub(super) fn build_symbol_table(cx: &mut PassContext) {
    for id in cx.definition_ids() {
        let definition = cx.model.definition(id);
        let Some(meta) = definition.meta() else {
            continue;
        };

        if meta.name.is_empty() {
            cx.sink.push(Diagnostic::structural(
                "the name field must be provided and non-empty",
                &meta.location,
            ));
            continue;
        }
        if primitives::is_reserved(&meta.name) {
            cx.sink.push(Diagnostic::structural(
                format!("the name '{}' is reserved", meta.name),
                &meta.location,
            ));
            continue;
        }

        if let Err(existing) = cx.symbols.insert(meta.qualified_name(), id) {
            let other = cx.model.definition(existing).location().cloned().unwrap_or_else(SourceLocation::builtin);
            cx.sink.push(Diagnostic::structural(
                format!(
                    "the name '{}' is already defined in file '{}' line '{}'",
                    meta.name, other.file, other.line
                ),
                &meta.location,
            ));
        }
    }
    tracing::trace!(symbols = cx.symbols.len(), "symbol table built");
}

pub(super) fn resolve_types(cx: &mut PassContext) {
    let ids = cx.definition_ids();

    for id in &ids {
        let definition = cx.model.definition(*id);
        let mut resolver = NameResolver {
            symbols: &cx.symbols,
            namespace: definition.meta().map(|m| m.namespace.clone()).unwrap_or_default(),
            scope: definition.type_parameters().to_vec(),
            enclosing: *id,
            errors: Vec::new(),
        };
        rewriter::rewrite_in_place(&mut resolver, &mut cx.model, *id);
        cx.sink.extend(resolver.errors);
    }

    for id in &ids {
        let mut binder = InstanceBinder {
            instantiator: &mut cx.instantiator,
            errors: Vec::new(),
        };
        rewriter::rewrite_in_place(&mut binder, &mut cx.model, *id);
        cx.sink.extend(binder.errors);
    }
}

/// Point every generic reference at a deep instance.
pub(super) fn convert_generic_references(cx: &mut PassContext) {
    if cx.sink.has_errors() {
        return;
    }
    for id in cx.definition_ids() {
        let errors = cx.instantiator.convert_references(&mut cx.model, id);
        cx.sink.extend(errors);
    }
}

// ============================================================================
// FIRST SWEEP: NAMES
// ============================================================================

struct NameResolver<'s> {
    symbols: &'s SymbolTable,
    namespace: String,
    /// Type parameters of the enclosing definition.
    scope: Vec<DefId>,
    enclosing: DefId,
    errors: Vec<Diagnostic>,
}

impl Rewriter for NameResolver<'_> {
    fn rewrite_type(&mut self, model: &mut Model, ty: &Type) -> Option<Type> {
        let rewritten = rewriter::rewrite_type_children(self, model, ty);
        let current = rewritten.as_ref().unwrap_or(ty);
        match current {
            Type::Simple(simple) if simple.resolved.is_none() => match self.resolve(model, simple) {
                Some(resolved) => Some(Type::Simple(resolved)),
                None => rewritten,
            },
            _ => rewritten,
        }
    }
}

impl NameResolver<'_> {
    fn resolve(&mut self, model: &Model, simple: &SimpleType) -> Option<SimpleType> {
        let target = match self.symbols.lookup(model, &simple.name, &self.namespace, &self.scope) {
            Ok(target) => target,
            Err(error) => {
                self.errors.push(Diagnostic::structural(error.to_string(), &simple.location));
                return None;
            }
        };

        let mut resolved = simple.clone();
        resolved.name = model.qualified_name(target);

        if let Err(error) = symbols::check_arity(model, target, simple.type_arguments.len()) {
            self.errors.push(Diagnostic::structural(error.to_string(), &simple.location));
            return Some(resolved);
        }
        if simple.is_recursive {
            self.check_recursive_marker(model, simple, target);
        }

        resolved.resolved = Some(target);
        Some(resolved)
    }

    /// A `!recursive` reference must name the enclosing definition and pass its own parameters unchanged.
    fn check_recursive_marker(&mut self, model: &Model, simple: &SimpleType, target: DefId) {
        let enclosing = model.definition(self.enclosing);
        if target != self.enclosing {
            self.errors.push(Diagnostic::structural(
                format!(
                    "a !recursive reference must refer to the enclosing type definition '{}'",
                    enclosing.name()
                ),
                &simple.location,
            ));
            return;
        }

        let passes_own_parameters = simple
            .type_arguments
            .iter()
            .zip(enclosing.type_parameters())
            .all(|(argument, parameter)| match argument {
                Type::Simple(arg) => {
                    arg.type_arguments.is_empty()
                        && (arg.resolved == Some(*parameter) || arg.name == model.definition(*parameter).name())
                }
                Type::Generalized(_) => false,
            });
        if !passes_own_parameters {
            self.errors.push(Diagnostic::structural(
                format!(
                    "a !recursive reference to '{}' must pass its own type parameters in order",
                    enclosing.name()
                ),
                &simple.location,
            ));
        }
    }
}

// ============================================================================
// SECOND SWEEP: SHALLOW INSTANCES
// ============================================================================

struct InstanceBinder<'i> {
    instantiator: &'i mut Instantiator,
    errors: Vec<Diagnostic>,
}

impl Rewriter for InstanceBinder<'_> {
    fn rewrite_type(&mut self, model: &mut Model, ty: &Type) -> Option<Type> {
        let rewritten = rewriter::rewrite_type_children(self, model, ty);
        let current = rewritten.as_ref().unwrap_or(ty);
        let Type::Simple(simple) = current else {
            return rewritten;
        };
        let Some(target) = simple.resolved else {
            return rewritten;
        };

        let is_open_generic = model
            .definition(target)
            .meta()
            .is_some_and(|m| m.is_generic() && m.origin.is_none());
        if simple.is_recursive || simple.type_arguments.is_empty() || !is_open_generic {
            return rewritten;
        }

        match self
            .instantiator
            .instantiate(model, target, simple.type_arguments.clone(), Mode::Shallow)
        {
            Ok(instance) => Some(Type::Simple(SimpleType {
                resolved: Some(instance),
                ..simple.clone()
            })),
            Err(error) => {
                self.errors.push(error);
                rewritten
            }
        }
    }
}
