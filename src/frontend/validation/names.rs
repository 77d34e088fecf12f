//! Naming-convention and uniqueness passes.

use std::collections::HashSet;

use yarrow_core::lang::conventions::{self, MEMBER_NAME_FORMAT, TYPE_NAME_FORMAT};

use super::PassContext;
use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::walk::visitor::{self, Visitor};

pub(super) fn validate_type_definition_names(cx: &mut PassContext) {
    for id in cx.definition_ids() {
        let definition = cx.model.definition(id);
        let (Some(location), name) = (definition.location(), definition.name()) else {
            continue;
        };
        if !conventions::is_type_name(name) {
            cx.sink.push(Diagnostic::structural(
                format!("type name '{name}' must be PascalCased matching the format {TYPE_NAME_FORMAT}"),
                location,
            ));
        }
    }
}

/// Only records and aliases may declare type parameters.
pub(super) fn validate_generic_type_definitions(cx: &mut PassContext) {
    for id in cx.definition_ids() {
        let definition = cx.model.definition(id);
        if !matches!(definition, TypeDefinition::Enum(_) | TypeDefinition::Protocol(_)) {
            continue;
        }
        if let Some(meta) = definition.meta().filter(|m| m.is_generic()) {
            cx.sink.push(Diagnostic::structural(
                format!("'{}' cannot have generic type parameters", meta.name),
                &meta.location,
            ));
        }
    }
}

/// Fields and computed fields share one name space per record.
pub(super) fn validate_record_field_names(cx: &mut PassContext) {
    for id in cx.definition_ids() {
        let TypeDefinition::Record(record) = cx.model.definition(id) else {
            continue;
        };

        let mut seen = HashSet::new();
        for field in &record.fields {
            if !conventions::is_member_name(&field.name) {
                cx.sink.push(Diagnostic::structural(
                    format!(
                        "field name '{}' must be camelCased matching the format {MEMBER_NAME_FORMAT}",
                        field.name
                    ),
                    &field.location,
                ));
            }
            if !seen.insert(field.name.as_str()) {
                cx.sink.push(Diagnostic::structural(
                    format!(
                        "a field with the name '{}' is already defined on the record '{}'",
                        field.name, record.meta.name
                    ),
                    &field.location,
                ));
            }
        }

        for field in &record.computed_fields {
            if !conventions::is_member_name(&field.name) {
                cx.sink.push(Diagnostic::structural(
                    format!(
                        "computed field name '{}' must be camelCased matching the format {MEMBER_NAME_FORMAT}",
                        field.name
                    ),
                    &field.location,
                ));
            }
            if !seen.insert(field.name.as_str()) {
                cx.sink.push(Diagnostic::structural(
                    format!(
                        "a field or computed field with the name '{}' is already defined on the record '{}'",
                        field.name, record.meta.name
                    ),
                    &field.location,
                ));
            }
        }
    }
}

pub(super) fn validate_protocol_sequence_names(cx: &mut PassContext) {
    for id in cx.definition_ids() {
        let TypeDefinition::Protocol(protocol) = cx.model.definition(id) else {
            continue;
        };

        let mut seen = HashSet::new();
        for step in &protocol.sequence {
            if !conventions::is_member_name(&step.name) {
                cx.sink.push(Diagnostic::structural(
                    format!(
                        "protocol step name '{}' must be camelCased matching the format {MEMBER_NAME_FORMAT}",
                        step.name
                    ),
                    &step.location,
                ));
            }
            if !seen.insert(step.name.as_str()) {
                cx.sink.push(Diagnostic::structural(
                    format!(
                        "a sequence step with the name '{}' is already defined on the protocol '{}'",
                        step.name, protocol.meta.name
                    ),
                    &step.location,
                ));
            }
        }
    }
}

/// Collects the generic parameters a definition body refers to.
#[derive(Default)]
struct ParameterUses {
    used: HashSet<DefId>,
}

impl Visitor for ParameterUses {
    fn visit_simple_type(&mut self, model: &Model, ty: &SimpleType) {
        if let Some(id) = ty.resolved {
            if matches!(model.definition(id), TypeDefinition::Parameter(_)) {
                self.used.insert(id);
            }
        }
        visitor::walk_simple_type(self, model, ty);
    }
}

pub(super) fn validate_generic_parameters_used(cx: &mut PassContext) {
    if cx.sink.has_errors() {
        return;
    }

    for id in cx.definition_ids() {
        let parameters = cx.model.definition(id).type_parameters();
        if parameters.is_empty() {
            continue;
        }

        let mut uses = ParameterUses::default();
        uses.visit_definition(&cx.model, id);
        for parameter in parameters {
            if uses.used.contains(parameter) {
                continue;
            }
            let definition = cx.model.definition(*parameter);
            if let Some(location) = definition.location() {
                cx.sink.push(Diagnostic::structural(
                    format!("generic type parameter '{}' is not used", definition.name()),
                    location,
                ));
            }
        }
    }
}
