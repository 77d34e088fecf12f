//! Container-shape passes: array dimensions, stream placement and map keys.

use std::collections::HashSet;

use yarrow_core::lang::conventions::{self, MEMBER_NAME_FORMAT};

use super::PassContext;
use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::typefns;
use crate::frontend::walk::visitor::{self, Visitor};

// ============================================================================
// ARRAYS
// ============================================================================

#[derive(Default)]
struct ArrayChecker {
    errors: Vec<Diagnostic>,
}

impl Visitor for ArrayChecker {
    fn visit_dimensionality(&mut self, model: &Model, dimensionality: &Dimensionality) {
        if let Dimensionality::Array {
            dimensions: Some(dimensions),
            location,
        } = dimensionality
        {
            self.check(dimensions, location);
        }
        visitor::walk_dimensionality(self, model, dimensionality);
    }
}

impl ArrayChecker {
    fn check(&mut self, dimensions: &[ArrayDimension], location: &SourceLocation) {
        if dimensions.is_empty() {
            return;
        }

        let mut names = HashSet::new();
        for name in dimensions.iter().filter_map(|d| d.name.as_deref()) {
            if !conventions::is_member_name(name) {
                self.errors.push(Diagnostic::structural(
                    format!("dimension name '{name}' must match the format {MEMBER_NAME_FORMAT}"),
                    location,
                ));
            }
            if !names.insert(name) {
                self.errors.push(Diagnostic::structural(
                    format!("a dimension with the name '{name}' is already defined on the array"),
                    location,
                ));
            }
        }

        let with_length = dimensions.iter().filter(|d| d.length.is_some()).count();
        if with_length != 0 && with_length != dimensions.len() {
            self.errors.push(Diagnostic::structural(
                "lengths must either be specified on all dimensions or none of them",
                location,
            ));
        }
    }
}

pub(super) fn validate_array_and_vector_dimensions(cx: &mut PassContext) {
    let mut checker = ArrayChecker::default();
    for id in cx.definition_ids() {
        checker.visit_definition(&cx.model, id);
    }
    cx.sink.extend(checker.errors);
}

// ============================================================================
// STREAMS
// ============================================================================

/// Reports every stream it meets.
#[derive(Default)]
struct StreamFinder {
    errors: Vec<Diagnostic>,
}

impl Visitor for StreamFinder {
    fn visit_dimensionality(&mut self, model: &Model, dimensionality: &Dimensionality) {
        if let Dimensionality::Stream { location } = dimensionality {
            self.errors.push(Diagnostic::structural(
                "!streams can only be declared as top-level protocol sequence elements",
                location,
            ));
        }
        visitor::walk_dimensionality(self, model, dimensionality);
    }

    fn visit_protocol_step(&mut self, model: &Model, step: &ProtocolStep) {
        match &step.ty {
            // The step's own stream is legal; anything nested in its items is not.
            Type::Generalized(stream) if step.is_stream() => {
                for case in &stream.cases {
                    self.visit_type_case(model, case);
                }
            }
            ty => self.visit_type(model, ty),
        }
    }
}

/// A stream may only be the outermost type of a protocol step.
pub(super) fn validate_streams(cx: &mut PassContext) {
    let mut finder = StreamFinder::default();
    for id in cx.definition_ids() {
        finder.visit_definition(&cx.model, id);
    }
    cx.sink.extend(finder.errors);
}

// ============================================================================
// MAPS
// ============================================================================

/// Checks map keys, following non-recursive generic references into their shallow instances once each.
#[derive(Default)]
struct MapChecker {
    errors: Vec<Diagnostic>,
    visited_instances: HashSet<DefId>,
}

impl Visitor for MapChecker {
    fn visit_simple_type(&mut self, model: &Model, ty: &SimpleType) {
        if let Some(id) = ty.resolved.filter(|_| !ty.is_recursive) {
            let is_instance = model.definition(id).meta().is_some_and(|m| m.origin.is_some());
            if is_instance && self.visited_instances.insert(id) {
                self.visit_definition(model, id);
            }
        }
        visitor::walk_simple_type(self, model, ty);
    }

    fn visit_dimensionality(&mut self, model: &Model, dimensionality: &Dimensionality) {
        if let Dimensionality::Map { key_type, location } = dimensionality {
            if !is_valid_key(model, key_type) {
                self.errors.push(Diagnostic::structural(
                    "map key type must be a primitive scalar type",
                    location,
                ));
            }
        }
        visitor::walk_dimensionality(self, model, dimensionality);
    }
}

/// Primitive scalars and generic parameters are valid keys. Unresolved names were already reported.
fn is_valid_key(model: &Model, key: &Type) -> bool {
    match typefns::underlying(model, key) {
        Type::Simple(simple) => match simple.resolved.map(|id| model.definition(id)) {
            None | Some(TypeDefinition::Primitive(_) | TypeDefinition::Parameter(_)) => true,
            Some(_) => false,
        },
        Type::Generalized(_) => false,
    }
}

pub(super) fn validate_maps(cx: &mut PassContext) {
    let mut checker = MapChecker::default();
    for id in cx.definition_ids() {
        checker.visit_definition(&cx.model, id);
    }
    cx.sink.extend(checker.errors);
}
