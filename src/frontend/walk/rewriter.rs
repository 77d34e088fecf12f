//! Copy-on-write structural rewriting.
//!
//! Every hook returns `Option<T>`: `None` means "unchanged", so a parent is only rebuilt when one of its children
//! actually changed and untouched subtrees are never cloned. The default hooks rewrite children via the matching
//! `rewrite_*_children` function.
//!
//! ## Notes
//! - Hooks receive the model mutably so a rewriter can read other definitions and allocate new arena entries (generic
//!   instances) while it runs. The node being rewritten is always a value owned outside the arena.
//! - [`rewrite_in_place`] writes a replacement into the definition's own arena slot. The symbol table and every
//!   resolved [`SimpleType`] hold [`DefId`]s, so all of them observe the replacement.

use crate::frontend::ast::*;

pub trait Rewriter {
    fn rewrite_definition(&mut self, model: &mut Model, definition: &TypeDefinition) -> Option<TypeDefinition> {
        rewrite_definition_children(self, model, definition)
    }

    fn rewrite_type(&mut self, model: &mut Model, ty: &Type) -> Option<Type> {
        rewrite_type_children(self, model, ty)
    }

    fn rewrite_type_case(&mut self, model: &mut Model, case: &TypeCase) -> Option<TypeCase> {
        let ty = case.ty.as_ref()?;
        let rewritten = self.rewrite_type(model, ty)?;
        Some(TypeCase {
            ty: Some(rewritten),
            ..case.clone()
        })
    }

    fn rewrite_computed_field(&mut self, model: &mut Model, field: &ComputedField) -> Option<ComputedField> {
        let expression = self.rewrite_expression(model, &field.expression)?;
        Some(ComputedField {
            expression,
            ..field.clone()
        })
    }

    fn rewrite_expression(&mut self, model: &mut Model, expression: &Expression) -> Option<Expression> {
        rewrite_expression_children(self, model, expression)
    }

    fn rewrite_pattern(&mut self, model: &mut Model, pattern: &Pattern) -> Option<Pattern> {
        match pattern {
            Pattern::Discard { .. } => None,
            Pattern::Type { ty, location } => {
                let ty = self.rewrite_type(model, ty.as_ref()?)?;
                Some(Pattern::Type {
                    ty: Some(ty),
                    location: location.clone(),
                })
            }
            Pattern::Declaration {
                ty,
                identifier,
                location,
            } => {
                let ty = self.rewrite_type(model, ty.as_ref()?)?;
                Some(Pattern::Declaration {
                    ty: Some(ty),
                    identifier: identifier.clone(),
                    location: location.clone(),
                })
            }
        }
    }
}

/// Rewrite the definition at `id` and store the result in the same slot.
///
/// ## Returns
/// `true` when the definition changed.
pub fn rewrite_in_place<R: Rewriter + ?Sized>(rewriter: &mut R, model: &mut Model, id: DefId) -> bool {
    let original = model.definition(id).clone();
    match rewriter.rewrite_definition(model, &original) {
        Some(replacement) => {
            model.replace(id, replacement);
            true
        }
        None => false,
    }
}

/// Rewrite every element of `items`, cloning the list only once an element changes.
pub fn rewrite_list<T: Clone>(items: &[T], mut rewrite: impl FnMut(&T) -> Option<T>) -> Option<Vec<T>> {
    let mut result: Option<Vec<T>> = None;
    for (index, item) in items.iter().enumerate() {
        match (rewrite(item), &mut result) {
            (Some(new), Some(list)) => list.push(new),
            (Some(new), None) => {
                let mut list = Vec::with_capacity(items.len());
                list.extend_from_slice(&items[..index]);
                list.push(new);
                result = Some(list);
            }
            (None, Some(list)) => list.push(item.clone()),
            (None, None) => {}
        }
    }
    result
}

pub fn rewrite_definition_children<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    model: &mut Model,
    definition: &TypeDefinition,
) -> Option<TypeDefinition> {
    match definition {
        TypeDefinition::Primitive(_) | TypeDefinition::Parameter(_) => None,
        TypeDefinition::Alias(alias) => {
            let ty = rewriter.rewrite_type(model, &alias.ty)?;
            Some(TypeDefinition::Alias(NamedType {
                meta: alias.meta.clone(),
                ty,
            }))
        }
        TypeDefinition::Record(record) => {
            let fields = rewrite_list(&record.fields, |field| {
                let ty = rewriter.rewrite_type(model, &field.ty)?;
                Some(Field { ty, ..field.clone() })
            });
            let computed_fields =
                rewrite_list(&record.computed_fields, |field| rewriter.rewrite_computed_field(model, field));
            if fields.is_none() && computed_fields.is_none() {
                return None;
            }
            Some(TypeDefinition::Record(RecordDefinition {
                meta: record.meta.clone(),
                fields: fields.unwrap_or_else(|| record.fields.clone()),
                computed_fields: computed_fields.unwrap_or_else(|| record.computed_fields.clone()),
            }))
        }
        TypeDefinition::Enum(definition) => {
            let base = rewriter.rewrite_type(model, definition.base.as_ref()?)?;
            Some(TypeDefinition::Enum(EnumDefinition {
                base: Some(base),
                ..definition.clone()
            }))
        }
        TypeDefinition::Protocol(protocol) => {
            let sequence = rewrite_list(&protocol.sequence, |step| {
                let ty = rewriter.rewrite_type(model, &step.ty)?;
                Some(ProtocolStep { ty, ..step.clone() })
            })?;
            Some(TypeDefinition::Protocol(ProtocolDefinition {
                meta: protocol.meta.clone(),
                sequence,
            }))
        }
    }
}

pub fn rewrite_type_children<R: Rewriter + ?Sized>(rewriter: &mut R, model: &mut Model, ty: &Type) -> Option<Type> {
    match ty {
        Type::Simple(simple) => {
            let type_arguments = rewrite_list(&simple.type_arguments, |arg| rewriter.rewrite_type(model, arg))?;
            Some(Type::Simple(SimpleType {
                type_arguments,
                ..simple.clone()
            }))
        }
        Type::Generalized(generalized) => {
            let cases = rewrite_list(&generalized.cases, |case| rewriter.rewrite_type_case(model, case));
            let dimensionality = match &generalized.dimensionality {
                Some(Dimensionality::Map { key_type, location }) => {
                    rewriter.rewrite_type(model, key_type).map(|key| Dimensionality::Map {
                        key_type: Box::new(key),
                        location: location.clone(),
                    })
                }
                _ => None,
            };
            if cases.is_none() && dimensionality.is_none() {
                return None;
            }
            Some(Type::Generalized(GeneralizedType {
                cases: cases.unwrap_or_else(|| generalized.cases.clone()),
                dimensionality: dimensionality.or_else(|| generalized.dimensionality.clone()),
                location: generalized.location.clone(),
            }))
        }
    }
}

pub fn rewrite_expression_children<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    model: &mut Model,
    expression: &Expression,
) -> Option<Expression> {
    let kind = match &expression.kind {
        ExpressionKind::IntegerLiteral(_) | ExpressionKind::FloatLiteral(_) | ExpressionKind::StringLiteral(_) => {
            return None;
        }
        ExpressionKind::MemberAccess {
            target,
            member,
            is_computed_field,
        } => {
            let target = rewriter.rewrite_expression(model, target.as_deref()?)?;
            ExpressionKind::MemberAccess {
                target: Some(Box::new(target)),
                member: member.clone(),
                is_computed_field: *is_computed_field,
            }
        }
        ExpressionKind::Index { target, arguments } => {
            let new_target = rewriter.rewrite_expression(model, target);
            let new_arguments = rewrite_list(arguments, |argument| {
                let value = rewriter.rewrite_expression(model, &argument.value)?;
                Some(IndexArgument {
                    value,
                    ..argument.clone()
                })
            });
            if new_target.is_none() && new_arguments.is_none() {
                return None;
            }
            ExpressionKind::Index {
                target: Box::new(new_target.unwrap_or_else(|| (**target).clone())),
                arguments: new_arguments.unwrap_or_else(|| arguments.clone()),
            }
        }
        ExpressionKind::FunctionCall { function, arguments } => {
            let arguments = rewrite_list(arguments, |argument| rewriter.rewrite_expression(model, argument))?;
            ExpressionKind::FunctionCall {
                function: function.clone(),
                arguments,
            }
        }
        ExpressionKind::TypeConversion { expression: inner, ty } => {
            let new_inner = rewriter.rewrite_expression(model, inner);
            let new_ty = rewriter.rewrite_type(model, ty);
            if new_inner.is_none() && new_ty.is_none() {
                return None;
            }
            ExpressionKind::TypeConversion {
                expression: Box::new(new_inner.unwrap_or_else(|| (**inner).clone())),
                ty: new_ty.unwrap_or_else(|| ty.clone()),
            }
        }
        ExpressionKind::Switch { target, cases } => {
            let new_target = rewriter.rewrite_expression(model, target);
            let new_cases = rewrite_list(cases, |case| {
                let pattern = rewriter.rewrite_pattern(model, &case.pattern);
                let expression = rewriter.rewrite_expression(model, &case.expression);
                if pattern.is_none() && expression.is_none() {
                    return None;
                }
                Some(SwitchCase {
                    pattern: pattern.unwrap_or_else(|| case.pattern.clone()),
                    expression: expression.unwrap_or_else(|| case.expression.clone()),
                    location: case.location.clone(),
                })
            });
            if new_target.is_none() && new_cases.is_none() {
                return None;
            }
            ExpressionKind::Switch {
                target: Box::new(new_target.unwrap_or_else(|| (**target).clone())),
                cases: new_cases.unwrap_or_else(|| cases.clone()),
            }
        }
        ExpressionKind::Binary { op, left, right } => {
            let new_left = rewriter.rewrite_expression(model, left);
            let new_right = rewriter.rewrite_expression(model, right);
            if new_left.is_none() && new_right.is_none() {
                return None;
            }
            ExpressionKind::Binary {
                op: *op,
                left: Box::new(new_left.unwrap_or_else(|| (**left).clone())),
                right: Box::new(new_right.unwrap_or_else(|| (**right).clone())),
            }
        }
        ExpressionKind::Unary { op, operand } => {
            let operand = rewriter.rewrite_expression(model, operand)?;
            ExpressionKind::Unary {
                op: *op,
                operand: Box::new(operand),
            }
        }
    };

    Some(Expression {
        kind,
        resolved_type: expression.resolved_type.clone(),
        location: expression.location.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use yarrow_core::lang::primitives::PrimitiveId;

    fn loc() -> SourceLocation {
        SourceLocation::new("t.yml", 1, 1)
    }

    /// Replaces every reference named `from` with `int32`.
    struct Rename {
        from: &'static str,
    }

    impl Rewriter for Rename {
        fn rewrite_type(&mut self, model: &mut Model, ty: &Type) -> Option<Type> {
            match ty {
                Type::Simple(simple) if simple.name == self.from => {
                    Some(Type::primitive(PrimitiveId::Int32, simple.location.clone()))
                }
                _ => rewrite_type_children(self, model, ty),
            }
        }
    }

    #[test]
    fn test_rewrite_list_clones_only_on_change() {
        let items = vec![1, 2, 3];
        assert_eq!(rewrite_list(&items, |_| None), None);
        assert_eq!(rewrite_list(&items, |i| (*i == 2).then_some(20)), Some(vec![1, 20, 3]));
    }

    #[test]
    fn test_unchanged_tree_returns_none() {
        let mut model = Model::new();
        let ty = Type::Generalized(GeneralizedType {
            cases: vec![TypeCase::new(None, loc()), TypeCase::new(Some(Type::named("X", loc())), loc())],
            dimensionality: None,
            location: loc(),
        });
        assert!(Rename { from: "Y" }.rewrite_type(&mut model, &ty).is_none());

        let rewritten = Rename { from: "X" }.rewrite_type(&mut model, &ty).expect("changed");
        let cases = &rewritten.as_generalized().expect("still generalized").cases;
        assert_eq!(cases[1].ty.as_ref().and_then(Type::as_simple).map(|s| s.name.as_str()), Some("int32"));
    }

    #[test]
    fn test_rewrite_in_place_updates_the_arena_slot() {
        let mut model = Model::new();
        let id = model.add_definition(
            "Ns",
            TypeDefinition::Alias(NamedType {
                meta: DefinitionMeta::new("A", loc()),
                ty: Type::named("X", loc()),
            }),
        );
        assert!(rewrite_in_place(&mut Rename { from: "X" }, &mut model, id));
        let TypeDefinition::Alias(alias) = model.definition(id) else {
            panic!("expected an alias");
        };
        assert_eq!(alias.ty.as_simple().and_then(|s| s.resolved), Some(DefId::primitive(PrimitiveId::Int32)));
        assert!(!rewrite_in_place(&mut Rename { from: "X" }, &mut model, id));
    }
}
