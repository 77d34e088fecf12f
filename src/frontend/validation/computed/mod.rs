//! Resolve computed-field expressions and assign their types.
//!
//! Every computed field of every record is resolved once. Resolution rebuilds the expression tree with
//! `resolved_type` filled in, folds what is statically known (sizes of fixed containers, dimension lookups, literal
//! arithmetic) into literals, and inserts conversion nodes where a switch or an operator widens a branch.
//!
//! ## Notes
//! - **On-demand resolution**: a member access to another computed field resolves that field first, in the context
//!   of its own record. Results are cached by `(record, field index)`.
//! - **Cycles**: fields under resolution form a stack; meeting one of them again reports the whole chain.
//! - **Error accumulation**: a failed subexpression leaves `resolved_type` empty and its parents stop checking,
//!   so one mistake yields one diagnostic.
//!
//! ## See also
//! - [`crate::frontend::typefns`]: equality and the common type of two types.

mod access;
mod functions;
mod index;
mod ops;
mod switch;

use std::collections::HashMap;

use num_bigint::BigInt;
use yarrow_core::lang::primitives::PrimitiveId;

use super::PassContext;
use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;

pub(super) fn resolve_computed_fields(cx: &mut PassContext) {
    if cx.sink.has_errors() {
        return;
    }

    let mut resolver = ComputedResolver::new(&cx.model);
    for id in cx.definition_ids() {
        if let TypeDefinition::Record(record) = cx.model.definition(id) {
            for index in 0..record.computed_fields.len() {
                resolver.resolve_field(id, index);
            }
        }
    }

    let ComputedResolver { resolved, errors, .. } = resolver;
    cx.sink.extend(errors);
    for ((record, index), expression) in resolved {
        if let TypeDefinition::Record(definition) = cx.model.definition_mut(record) {
            definition.computed_fields[index].expression = expression;
        }
    }
}

/// Names visible while resolving one expression.
#[derive(Debug, Clone)]
pub(super) struct Scope {
    /// Record whose fields bare identifiers refer to.
    record: DefId,
    /// Variables bound by enclosing switch declaration patterns, innermost last.
    variables: Vec<(String, Type)>,
}

impl Scope {
    fn new(record: DefId) -> Self {
        Self {
            record,
            variables: Vec::new(),
        }
    }

    fn with_variable(&self, identifier: &str, ty: Type) -> Self {
        let mut scope = self.clone();
        scope.variables.push((identifier.to_string(), ty));
        scope
    }
}

pub(super) struct ComputedResolver<'m> {
    model: &'m Model,
    resolved: HashMap<(DefId, usize), Expression>,
    in_progress: Vec<(DefId, usize)>,
    errors: Vec<Diagnostic>,
}

impl<'m> ComputedResolver<'m> {
    fn new(model: &'m Model) -> Self {
        Self {
            model,
            resolved: HashMap::new(),
            in_progress: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Resolve computed field `index` of `record` (once) and return its type.
    fn resolve_field(&mut self, record: DefId, index: usize) -> Option<Type> {
        if let Some(expression) = self.resolved.get(&(record, index)) {
            return expression.resolved_type.clone();
        }

        let model = self.model;
        let TypeDefinition::Record(definition) = model.definition(record) else {
            return None;
        };
        let field = &definition.computed_fields[index];

        if self.in_progress.contains(&(record, index)) {
            let chain: Vec<&str> = self
                .in_progress
                .iter()
                .map(|(r, i)| computed_field_name(model, *r, *i))
                .chain(std::iter::once(field.name.as_str()))
                .collect();
            self.error(
                format!("cycle detected in computed fields: {}", chain.join(" -> ")),
                &field.location,
            );
            return None;
        }

        self.in_progress.push((record, index));
        let expression = self.resolve(&field.expression, &Scope::new(record));
        self.in_progress.pop();

        let ty = expression.resolved_type.clone();
        self.resolved.insert((record, index), expression);
        ty
    }

    fn resolve(&mut self, expression: &Expression, scope: &Scope) -> Expression {
        match &expression.kind {
            ExpressionKind::IntegerLiteral(value) => self.resolve_integer_literal(value, &expression.location),
            ExpressionKind::FloatLiteral(_) => typed(expression.clone(), PrimitiveId::Float64),
            ExpressionKind::StringLiteral(_) => typed(expression.clone(), PrimitiveId::String),
            ExpressionKind::MemberAccess { target, member, .. } => {
                self.resolve_member_access(target.as_deref(), member, &expression.location, scope)
            }
            ExpressionKind::Index { target, arguments } => {
                self.resolve_index(target, arguments, &expression.location, scope)
            }
            ExpressionKind::FunctionCall { function, arguments } => {
                self.resolve_function_call(function, arguments, &expression.location, scope)
            }
            ExpressionKind::TypeConversion { expression: inner, ty } => {
                self.resolve_conversion(inner, ty, &expression.location, scope)
            }
            ExpressionKind::Switch { target, cases } => self.resolve_switch(target, cases, &expression.location, scope),
            ExpressionKind::Binary { op, left, right } => {
                self.resolve_binary(*op, left, right, &expression.location, scope)
            }
            ExpressionKind::Unary { op, operand } => self.resolve_unary(*op, operand, &expression.location, scope),
        }
    }

    fn error(&mut self, message: impl Into<String>, location: &SourceLocation) {
        self.errors.push(Diagnostic::expression(message, location));
    }
}

fn computed_field_name(model: &Model, record: DefId, index: usize) -> &str {
    match model.definition(record) {
        TypeDefinition::Record(definition) => &definition.computed_fields[index].name,
        _ => "",
    }
}

/// `expression` with its type set to `primitive`.
fn typed(mut expression: Expression, primitive: PrimitiveId) -> Expression {
    expression.resolved_type = Some(Type::primitive(primitive, expression.location.clone()));
    expression
}

/// A folded `size` literal.
fn size_literal(value: impl Into<BigInt>, location: &SourceLocation) -> Expression {
    typed(Expression::integer(value, location.clone()), PrimitiveId::Size)
}
