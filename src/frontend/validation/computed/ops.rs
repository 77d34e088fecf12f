//! Literals, arithmetic, negation and explicit conversions.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use yarrow_core::lang::primitives::{self, PrimitiveId};
use yarrow_core::numeric;

use super::{ComputedResolver, Scope};
use crate::frontend::ast::*;
use crate::frontend::printer::type_syntax;
use crate::frontend::typefns;

/// Larger exponents are left unfolded.
const MAX_FOLDED_EXPONENT: u32 = 64;

impl ComputedResolver<'_> {
    /// Type an integer literal with the narrowest integer primitive that holds it.
    pub(super) fn resolve_integer_literal(&mut self, value: &BigInt, location: &SourceLocation) -> Expression {
        let literal = Expression::integer(value.clone(), location.clone());
        match value.to_i128().and_then(numeric::narrowest_integer) {
            Some(primitive) => super::typed(literal, primitive),
            None => {
                self.error("integer literal is too large", location);
                literal
            }
        }
    }

    pub(super) fn resolve_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        location: &SourceLocation,
        scope: &Scope,
    ) -> Expression {
        let left = self.resolve(left, scope);
        let right = self.resolve(right, scope);

        if let (Some(a), Some(b)) = (left.as_integer_literal(), right.as_integer_literal()) {
            if let Some(folded) = self.fold_binary(op, a, b, location) {
                return folded;
            }
        }

        let (Some(left_type), Some(right_type)) = (&left.resolved_type, &right.resolved_type) else {
            return binary(op, left, right, None, location);
        };

        let operands = (
            typefns::primitive_of(self.model, left_type),
            typefns::primitive_of(self.model, right_type),
        );
        let (Some(a), Some(b)) = operands else {
            self.error(
                format!("operator '{op}' cannot be applied to non-numeric operands"),
                location,
            );
            return binary(op, left, right, None, location);
        };
        if !primitives::is_numeric(a) || !primitives::is_numeric(b) {
            self.error(
                format!("operator '{op}' cannot be applied to non-numeric operands"),
                location,
            );
            return binary(op, left, right, None, location);
        }

        let Some(common) = numeric::common_primitive(a, b) else {
            self.error(format!("no common type for the operands of '{op}'"), location);
            return binary(op, left, right, None, location);
        };
        let common = Type::primitive(common, location.clone());
        let left = self.insert_conversion(left, &common);
        let right = self.insert_conversion(right, &common);
        binary(op, left, right, Some(common), location)
    }

    /// Fold arithmetic on two integer literals. `None` leaves the operation in place.
    fn fold_binary(&mut self, op: BinaryOp, a: &BigInt, b: &BigInt, location: &SourceLocation) -> Option<Expression> {
        let value = match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => {
                if b.is_zero() {
                    self.error("division by zero", location);
                    return Some(Expression::new(ExpressionKind::IntegerLiteral(a.clone()), location.clone()));
                }
                a / b
            }
            BinaryOp::Pow => {
                let exponent = b.to_u32().filter(|e| *e <= MAX_FOLDED_EXPONENT)?;
                num_traits::pow(a.clone(), exponent as usize)
            }
        };
        Some(self.resolve_integer_literal(&value, location))
    }

    pub(super) fn resolve_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expression,
        location: &SourceLocation,
        scope: &Scope,
    ) -> Expression {
        let operand = self.resolve(operand, scope);
        if let Some(value) = operand.as_integer_literal() {
            return self.resolve_integer_literal(&-value, location);
        }

        let ty = match &operand.resolved_type {
            None => None,
            Some(ty) => match typefns::primitive_of(self.model, ty) {
                Some(p) if primitives::is_numeric(p) && !is_unsigned(p) => Some(ty.clone()),
                // Negating an unsigned value needs the next signed width.
                Some(p) if is_unsigned(p) => match numeric::common_primitive(p, PrimitiveId::Int8) {
                    Some(signed) => Some(Type::primitive(signed, location.clone())),
                    None => {
                        self.error(format!("no common type for the operand of '{op}'"), location);
                        None
                    }
                },
                _ => {
                    self.error(format!("operator '{op}' cannot be applied to a non-numeric operand"), location);
                    None
                }
            },
        };

        let operand = match &ty {
            Some(target) => self.insert_conversion(operand, target),
            None => operand,
        };
        Expression {
            kind: ExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            resolved_type: ty,
            location: location.clone(),
        }
    }

    /// `expression as T`: both sides must be primitive scalars.
    pub(super) fn resolve_conversion(
        &mut self,
        inner: &Expression,
        ty: &Type,
        location: &SourceLocation,
        scope: &Scope,
    ) -> Expression {
        let inner = self.resolve(inner, scope);
        if let Some(source) = &inner.resolved_type {
            let convertible = typefns::primitive_of(self.model, source).is_some()
                && typefns::primitive_of(self.model, ty).is_some();
            if !convertible {
                self.error(
                    format!(
                        "cannot convert '{}' to '{}'",
                        type_syntax(source, false),
                        type_syntax(ty, false)
                    ),
                    location,
                );
            }
        }
        Expression {
            kind: ExpressionKind::TypeConversion {
                expression: Box::new(inner),
                ty: ty.clone(),
            },
            resolved_type: Some(ty.clone()),
            location: location.clone(),
        }
    }

    /// Convert `expression` to `target` unless it already has that type. Integer literals are retyped in place.
    pub(super) fn insert_conversion(&self, mut expression: Expression, target: &Type) -> Expression {
        if let Some(ty) = &expression.resolved_type {
            if typefns::types_equal(self.model, ty, target) {
                return expression;
            }
        }

        let literal_fits = match (expression.as_integer_literal(), typefns::primitive_of(self.model, target)) {
            (Some(value), Some(primitive)) => value.to_i128().is_some_and(|v| numeric::fits(primitive, v)),
            _ => false,
        };
        if literal_fits {
            expression.resolved_type = Some(target.clone());
            return expression;
        }

        let location = expression.location.clone();
        Expression {
            kind: ExpressionKind::TypeConversion {
                expression: Box::new(expression),
                ty: target.clone(),
            },
            resolved_type: Some(target.clone()),
            location,
        }
    }
}

fn is_unsigned(primitive: PrimitiveId) -> bool {
    primitives::integer_range(primitive).is_some_and(|(min, _)| min == 0)
}

fn binary(op: BinaryOp, left: Expression, right: Expression, ty: Option<Type>, location: &SourceLocation) -> Expression {
    Expression {
        kind: ExpressionKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        resolved_type: ty,
        location: location.clone(),
    }
}
