//! Read-only depth-first traversal.
//!
//! Each `visit_*` hook defaults to the matching `walk_*` function, which visits the node's children. Override a hook
//! to act on a node; call the `walk_*` function from the override to keep descending.

use crate::frontend::ast::*;

pub trait Visitor {
    fn visit_namespace(&mut self, model: &Model, namespace: &Namespace) {
        walk_namespace(self, model, namespace);
    }

    fn visit_definition(&mut self, model: &Model, id: DefId) {
        walk_definition(self, model, id);
    }

    fn visit_field(&mut self, model: &Model, field: &Field) {
        self.visit_type(model, &field.ty);
    }

    fn visit_protocol_step(&mut self, model: &Model, step: &ProtocolStep) {
        self.visit_type(model, &step.ty);
    }

    fn visit_computed_field(&mut self, model: &Model, field: &ComputedField) {
        self.visit_expression(model, &field.expression);
    }

    fn visit_type(&mut self, model: &Model, ty: &Type) {
        walk_type(self, model, ty);
    }

    fn visit_simple_type(&mut self, model: &Model, ty: &SimpleType) {
        walk_simple_type(self, model, ty);
    }

    fn visit_generalized_type(&mut self, model: &Model, ty: &GeneralizedType) {
        walk_generalized_type(self, model, ty);
    }

    fn visit_type_case(&mut self, model: &Model, case: &TypeCase) {
        if let Some(ty) = &case.ty {
            self.visit_type(model, ty);
        }
    }

    fn visit_dimensionality(&mut self, model: &Model, dimensionality: &Dimensionality) {
        walk_dimensionality(self, model, dimensionality);
    }

    fn visit_expression(&mut self, model: &Model, expression: &Expression) {
        walk_expression(self, model, expression);
    }

    fn visit_pattern(&mut self, model: &Model, pattern: &Pattern) {
        if let Some(ty) = pattern.ty() {
            self.visit_type(model, ty);
        }
    }
}

/// Visit every namespace of the model in order.
pub fn walk_model<V: Visitor + ?Sized>(visitor: &mut V, model: &Model) {
    for namespace in &model.namespaces {
        visitor.visit_namespace(model, namespace);
    }
}

/// Visit a namespace's types, then its protocols.
pub fn walk_namespace<V: Visitor + ?Sized>(visitor: &mut V, model: &Model, namespace: &Namespace) {
    for id in namespace.types.iter().chain(&namespace.protocols) {
        visitor.visit_definition(model, *id);
    }
}

pub fn walk_definition<V: Visitor + ?Sized>(visitor: &mut V, model: &Model, id: DefId) {
    match model.definition(id) {
        TypeDefinition::Primitive(_) | TypeDefinition::Parameter(_) => {}
        TypeDefinition::Alias(alias) => visitor.visit_type(model, &alias.ty),
        TypeDefinition::Record(record) => {
            for field in &record.fields {
                visitor.visit_field(model, field);
            }
            for field in &record.computed_fields {
                visitor.visit_computed_field(model, field);
            }
        }
        TypeDefinition::Enum(definition) => {
            if let Some(base) = &definition.base {
                visitor.visit_type(model, base);
            }
        }
        TypeDefinition::Protocol(protocol) => {
            for step in &protocol.sequence {
                visitor.visit_protocol_step(model, step);
            }
        }
    }
}

pub fn walk_type<V: Visitor + ?Sized>(visitor: &mut V, model: &Model, ty: &Type) {
    match ty {
        Type::Simple(simple) => visitor.visit_simple_type(model, simple),
        Type::Generalized(generalized) => visitor.visit_generalized_type(model, generalized),
    }
}

pub fn walk_simple_type<V: Visitor + ?Sized>(visitor: &mut V, model: &Model, ty: &SimpleType) {
    for argument in &ty.type_arguments {
        visitor.visit_type(model, argument);
    }
}

pub fn walk_generalized_type<V: Visitor + ?Sized>(visitor: &mut V, model: &Model, ty: &GeneralizedType) {
    for case in &ty.cases {
        visitor.visit_type_case(model, case);
    }
    if let Some(dimensionality) = &ty.dimensionality {
        visitor.visit_dimensionality(model, dimensionality);
    }
}

pub fn walk_dimensionality<V: Visitor + ?Sized>(visitor: &mut V, model: &Model, dimensionality: &Dimensionality) {
    if let Dimensionality::Map { key_type, .. } = dimensionality {
        visitor.visit_type(model, key_type);
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, model: &Model, expression: &Expression) {
    match &expression.kind {
        ExpressionKind::IntegerLiteral(_) | ExpressionKind::FloatLiteral(_) | ExpressionKind::StringLiteral(_) => {}
        ExpressionKind::MemberAccess { target, .. } => {
            if let Some(target) = target {
                visitor.visit_expression(model, target);
            }
        }
        ExpressionKind::Index { target, arguments } => {
            visitor.visit_expression(model, target);
            for argument in arguments {
                visitor.visit_expression(model, &argument.value);
            }
        }
        ExpressionKind::FunctionCall { arguments, .. } => {
            for argument in arguments {
                visitor.visit_expression(model, argument);
            }
        }
        ExpressionKind::TypeConversion { expression, ty } => {
            visitor.visit_expression(model, expression);
            visitor.visit_type(model, ty);
        }
        ExpressionKind::Switch { target, cases } => {
            visitor.visit_expression(model, target);
            for case in cases {
                visitor.visit_pattern(model, &case.pattern);
                visitor.visit_expression(model, &case.expression);
            }
        }
        ExpressionKind::Binary { left, right, .. } => {
            visitor.visit_expression(model, left);
            visitor.visit_expression(model, right);
        }
        ExpressionKind::Unary { operand, .. } => visitor.visit_expression(model, operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::loader;

    #[derive(Default)]
    struct NameCollector {
        names: Vec<String>,
    }

    impl Visitor for NameCollector {
        fn visit_simple_type(&mut self, model: &Model, ty: &SimpleType) {
            self.names.push(ty.name.clone());
            walk_simple_type(self, model, ty);
        }
    }

    #[test]
    fn test_visits_nested_types_in_order() {
        let mut model = Model::new();
        loader::load_str(
            &mut model,
            "Ns",
            "t.yml",
            "R: !record\n  fields:\n    a: G<int, float>\n    b: string->bool*\nP: !protocol\n  sequence:\n    x: R\n",
        )
        .expect("loads");

        let mut collector = NameCollector::default();
        walk_model(&mut collector, &model);
        assert_eq!(collector.names, vec!["G", "int", "float", "bool", "string", "R"]);
    }
}
