//! Dependency ordering of type definitions and reference-cycle detection.
//!
//! Each namespace is sorted independently with a depth-first walk that follows references into definitions of the
//! same namespace. A definition is appended after everything it refers to, so the resulting order never contains a
//! forward reference.
//!
//! ## Notes
//! - A reference marked `!recursive` (and everything reached through it) may close a cycle.
//! - Generic instances are followed through their origin. Type arguments are followed as children of the reference.
//! - Protocols are never referenced by types; they are neither traversed nor reordered.
//! - Computed-field expressions are not dependencies.

use std::collections::HashMap;

use super::PassContext;
use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::typefns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Node {
    Root,
    Definition(DefId),
    /// A record field, by record id and field index.
    Field(DefId, usize),
}

struct Sorter<'m> {
    model: &'m Model,
    namespace: &'m str,
    /// `Some(parent)` while a node is on the walk stack, `None` once it is sorted.
    predecessors: HashMap<Node, Option<Node>>,
    visiting_recursive: bool,
    sorted: Vec<DefId>,
    errors: Vec<Diagnostic>,
}

impl<'m> Sorter<'m> {
    fn new(model: &'m Model, namespace: &'m str) -> Self {
        Self {
            model,
            namespace,
            predecessors: HashMap::new(),
            visiting_recursive: false,
            sorted: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn visit_definition(&mut self, id: DefId, parent: Node) {
        let model = self.model;
        let definition = model.definition(id);
        if matches!(
            definition,
            TypeDefinition::Primitive(_) | TypeDefinition::Parameter(_) | TypeDefinition::Protocol(_)
        ) {
            return;
        }

        let node = Node::Definition(id);
        match self.predecessors.get(&node) {
            Some(Some(_)) => {
                if !self.visiting_recursive {
                    self.report_cycle(id, parent);
                }
                return;
            }
            Some(None) => return,
            None => {}
        }

        self.predecessors.insert(node, Some(parent));
        match definition {
            TypeDefinition::Alias(alias) => self.visit_type(&alias.ty, node),
            TypeDefinition::Record(record) => {
                for (index, field) in record.fields.iter().enumerate() {
                    let field_node = Node::Field(id, index);
                    self.predecessors.insert(field_node, Some(node));
                    self.visit_type(&field.ty, field_node);
                    self.predecessors.remove(&field_node);
                }
            }
            TypeDefinition::Enum(definition) => {
                if let Some(base) = &definition.base {
                    self.visit_type(base, node);
                }
            }
            TypeDefinition::Primitive(_) | TypeDefinition::Parameter(_) | TypeDefinition::Protocol(_) => {}
        }
        self.predecessors.insert(node, None);
        self.sorted.push(id);
    }

    fn visit_type(&mut self, ty: &'m Type, parent: Node) {
        match ty {
            Type::Simple(simple) => {
                let was_recursive = self.visiting_recursive;
                if let Some(target) = simple.resolved {
                    self.visiting_recursive |= simple.is_recursive;
                    let origin = typefns::generic_origin(self.model, target);
                    let same_namespace = self
                        .model
                        .definition(origin)
                        .meta()
                        .is_some_and(|m| m.namespace == self.namespace);
                    if same_namespace {
                        self.visit_definition(origin, parent);
                    }
                }
                for argument in &simple.type_arguments {
                    self.visit_type(argument, parent);
                }
                self.visiting_recursive = was_recursive;
            }
            Type::Generalized(generalized) => {
                for ty in generalized.cases.iter().filter_map(|c| c.ty.as_ref()) {
                    self.visit_type(ty, parent);
                }
                if let Some(Dimensionality::Map { key_type, .. }) = &generalized.dimensionality {
                    self.visit_type(key_type, parent);
                }
            }
        }
    }

    /// Report the cycle closed by revisiting `target` from `parent`.
    fn report_cycle(&mut self, target: DefId, parent: Node) {
        let target_node = Node::Definition(target);
        let mut path = vec![self.node_name(target_node), self.node_name(parent)];
        let mut predecessor = self.predecessors.get(&parent).copied().flatten();
        while let Some(node) = predecessor {
            if node == Node::Root {
                break;
            }
            path.push(self.node_name(node));
            if node == target_node {
                break;
            }
            predecessor = self.predecessors.get(&node).copied().flatten();
        }
        path.reverse();

        let location = self.node_location(parent);
        self.errors.push(Diagnostic::structural(
            format!(
                "there is a reference cycle, which is not supported, within namespace '{}': {}",
                self.namespace,
                path.join(" -> ")
            ),
            &location,
        ));
    }

    fn node_name(&self, node: Node) -> String {
        match node {
            Node::Root => String::new(),
            Node::Field(record, index) => match self.model.definition(record) {
                TypeDefinition::Record(r) => format!("Field '{}'", r.fields[index].name),
                _ => String::new(),
            },
            Node::Definition(id) => {
                let definition = self.model.definition(id);
                let kind = match definition {
                    TypeDefinition::Alias(NamedType {
                        ty: Type::Generalized(GeneralizedType {
                            dimensionality: Some(dimensionality),
                            ..
                        }),
                        ..
                    }) => dimensionality.kind_label(),
                    other => other.kind_label(),
                };
                format!("{kind} '{}'", definition.name())
            }
        }
    }

    fn node_location(&self, node: Node) -> SourceLocation {
        match node {
            Node::Root => SourceLocation::builtin(),
            Node::Field(record, index) => match self.model.definition(record) {
                TypeDefinition::Record(r) => r.fields[index].location.clone(),
                _ => SourceLocation::builtin(),
            },
            Node::Definition(id) => self
                .model
                .definition(id)
                .location()
                .cloned()
                .unwrap_or_else(SourceLocation::builtin),
        }
    }
}

pub(super) fn topological_sort_types(cx: &mut PassContext) {
    for index in 0..cx.model.namespaces.len() {
        let (sorted, errors) = {
            let namespace = &cx.model.namespaces[index];
            let mut sorter = Sorter::new(&cx.model, &namespace.name);
            for id in &namespace.types {
                sorter.visit_definition(*id, Node::Root);
            }
            (sorter.sorted, sorter.errors)
        };
        cx.sink.extend(errors);
        cx.model.namespaces[index].types = sorted;
    }
}
