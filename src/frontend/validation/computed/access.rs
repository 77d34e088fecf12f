//! Identifiers and member access.

use super::{ComputedResolver, Scope};
use crate::frontend::ast::*;
use crate::frontend::typefns;

impl ComputedResolver<'_> {
    /// Resolve `target.member`, or a bare `member` against switch variables and then the enclosing record.
    pub(super) fn resolve_member_access(
        &mut self,
        target: Option<&Expression>,
        member: &str,
        location: &SourceLocation,
        scope: &Scope,
    ) -> Expression {
        let access = |target: Option<Expression>, is_computed_field: bool, ty: Option<Type>| Expression {
            kind: ExpressionKind::MemberAccess {
                target: target.map(Box::new),
                member: member.to_string(),
                is_computed_field,
            },
            resolved_type: ty,
            location: location.clone(),
        };

        let (target, record) = match target {
            None => {
                if let Some((_, ty)) = scope.variables.iter().rev().find(|(name, _)| name == member) {
                    return access(None, false, Some(ty.clone()));
                }
                (None, scope.record)
            }
            Some(target) => {
                let target = self.resolve(target, scope);
                let Some(target_type) = &target.resolved_type else {
                    return access(Some(target), false, None);
                };
                match typefns::record_of(self.model, target_type) {
                    Some(record) => (Some(target), record),
                    None => {
                        self.error("member access target must be a !record type", location);
                        return access(Some(target), false, None);
                    }
                }
            }
        };

        let model = self.model;
        let TypeDefinition::Record(definition) = model.definition(record) else {
            return access(target, false, None);
        };

        if let Some(field) = definition.fields.iter().find(|f| f.name == member) {
            return access(target, false, Some(field.ty.clone()));
        }
        if let Some(index) = definition.computed_fields.iter().position(|f| f.name == member) {
            let ty = self.resolve_field(record, index);
            return access(target, true, ty);
        }

        self.error(
            format!(
                "there is no variable in scope with the name '{member}' nor does the record '{}' does not have a \
                 field or computed field named '{member}'",
                definition.meta.name
            ),
            location,
        );
        access(target, false, None)
    }
}
