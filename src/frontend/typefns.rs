//! Structural queries over resolved types: alias transparency, primitive classification, equality and the common
//! type of two types.
//!
//! ## Notes
//! - Every function takes the [`Model`] because a resolved [`SimpleType`] only holds the [`DefId`] of its target.
//! - Equality is structural. Two definitions are equal when they have the same qualified name, pairwise-equal
//!   parameters and arguments, and equal bodies. Self-referential definitions compare coinductively: a pair already
//!   under comparison is assumed equal.
//! - `size` and `uint64` are distinct primitives but structurally equal.

use std::collections::HashSet;

use yarrow_core::lang::primitives::{self, PrimitiveId};
use yarrow_core::numeric;

use crate::frontend::ast::*;
use crate::frontend::walk::visitor::{self, Visitor};

/// Alias chains longer than this are treated as cyclic and left unfollowed.
const MAX_ALIAS_DEPTH: usize = 64;

/// Follow aliases and unwrap undimensioned single-case types down to the type that actually carries structure.
pub fn underlying<'m>(model: &'m Model, ty: &'m Type) -> &'m Type {
    let mut current = ty;
    for _ in 0..MAX_ALIAS_DEPTH {
        let next = match current {
            Type::Simple(simple) => match simple.resolved.map(|id| model.definition(id)) {
                Some(TypeDefinition::Alias(alias)) => &alias.ty,
                _ => return current,
            },
            Type::Generalized(generalized) if generalized.dimensionality.is_none() && generalized.is_single() => {
                match &generalized.cases[0].ty {
                    Some(ty) => ty,
                    None => return current,
                }
            }
            Type::Generalized(_) => return current,
        };
        current = next;
    }
    current
}

/// The primitive behind `ty`, after following aliases.
pub fn primitive_of(model: &Model, ty: &Type) -> Option<PrimitiveId> {
    match underlying(model, ty) {
        Type::Simple(simple) => simple.resolved.and_then(|id| model.definition(id).as_primitive()),
        Type::Generalized(_) => None,
    }
}

pub fn is_integral(model: &Model, ty: &Type) -> bool {
    primitive_of(model, ty).is_some_and(primitives::is_integral)
}

/// The record behind `ty`, after following aliases.
pub fn record_of(model: &Model, ty: &Type) -> Option<DefId> {
    match underlying(model, ty) {
        Type::Simple(simple) => {
            let id = simple.resolved?;
            matches!(model.definition(id), TypeDefinition::Record(_)).then_some(id)
        }
        Type::Generalized(_) => None,
    }
}

/// View any type as a [`GeneralizedType`]; a simple type becomes a single case.
pub fn to_generalized(ty: &Type) -> GeneralizedType {
    match ty {
        Type::Generalized(generalized) => generalized.clone(),
        Type::Simple(simple) => GeneralizedType {
            cases: vec![TypeCase::new(Some(ty.clone()), simple.location.clone())],
            dimensionality: None,
            location: simple.location.clone(),
        },
    }
}

/// The generic definition an instance was produced from, or `id` itself.
pub fn generic_origin(model: &Model, id: DefId) -> DefId {
    model.definition(id).meta().and_then(|m| m.origin).unwrap_or(id)
}

/// Whether the type mentions a generic type parameter anywhere.
pub fn contains_open_generic(model: &Model, ty: &Type) -> bool {
    struct Finder {
        found: bool,
    }

    impl Visitor for Finder {
        fn visit_simple_type(&mut self, model: &Model, ty: &SimpleType) {
            if let Some(TypeDefinition::Parameter(_)) = ty.resolved.map(|id| model.definition(id)) {
                self.found = true;
            }
            visitor::walk_simple_type(self, model, ty);
        }
    }

    let mut finder = Finder { found: false };
    finder.visit_type(model, ty);
    finder.found
}

pub fn types_equal(model: &Model, a: &Type, b: &Type) -> bool {
    Equality::new(model).types(a, b)
}

pub fn definitions_equal(model: &Model, a: DefId, b: DefId) -> bool {
    Equality::new(model).definitions(a, b)
}

pub fn expressions_equal(model: &Model, a: &Expression, b: &Expression) -> bool {
    Equality::new(model).expressions(a, b)
}

/// The type both operands can be converted to.
///
/// ## Returns
/// - For two primitives, their entry in the widening lattice.
/// - For structurally equal types, the underlying type of `a`.
/// - `None` otherwise.
pub fn common_type(model: &Model, a: &Type, b: &Type) -> Option<Type> {
    let ua = underlying(model, a);
    let ub = underlying(model, b);
    if let (Some(pa), Some(pb)) = (primitive_of(model, ua), primitive_of(model, ub)) {
        if pa == pb {
            return Some(ua.clone());
        }
        return numeric::common_primitive(pa, pb).map(|common| Type::primitive(common, a.location().clone()));
    }
    types_equal(model, ua, ub).then(|| ua.clone())
}

/// Structural comparison with a set of definition pairs assumed equal while their bodies are compared.
struct Equality<'m> {
    model: &'m Model,
    assumed: HashSet<(DefId, DefId)>,
}

impl<'m> Equality<'m> {
    fn new(model: &'m Model) -> Self {
        Self {
            model,
            assumed: HashSet::new(),
        }
    }

    fn optional_types(&mut self, a: Option<&Type>, b: Option<&Type>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.types(a, b),
            _ => false,
        }
    }

    fn types(&mut self, a: &Type, b: &Type) -> bool {
        let model = self.model;
        match (underlying(model, a), underlying(model, b)) {
            (Type::Simple(a), Type::Simple(b)) => match (a.resolved, b.resolved) {
                (Some(ra), Some(rb)) => self.definitions(ra, rb),
                (None, None) => a.name == b.name,
                _ => false,
            },
            (Type::Generalized(a), Type::Generalized(b)) => {
                a.cases.len() == b.cases.len()
                    && a
                        .cases
                        .iter()
                        .zip(&b.cases)
                        .all(|(ca, cb)| self.optional_types(ca.ty.as_ref(), cb.ty.as_ref()))
                    && self.dimensionalities(a.dimensionality.as_ref(), b.dimensionality.as_ref())
            }
            _ => false,
        }
    }

    fn dimensionalities(&mut self, a: Option<&Dimensionality>, b: Option<&Dimensionality>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(Dimensionality::Vector { length: la, .. }), Some(Dimensionality::Vector { length: lb, .. })) => la == lb,
            (
                Some(Dimensionality::Array { dimensions: da, .. }),
                Some(Dimensionality::Array { dimensions: db, .. }),
            ) => match (da, db) {
                (None, None) => true,
                // Dimension names are labels only and do not affect equality.
                (Some(da), Some(db)) => da.len() == db.len() && da.iter().zip(db).all(|(x, y)| x.length == y.length),
                _ => false,
            },
            (Some(Dimensionality::Map { key_type: ka, .. }), Some(Dimensionality::Map { key_type: kb, .. })) => {
                self.types(ka, kb)
            }
            (Some(Dimensionality::Stream { .. }), Some(Dimensionality::Stream { .. })) => true,
            _ => false,
        }
    }

    fn definitions(&mut self, a: DefId, b: DefId) -> bool {
        if a == b || self.assumed.contains(&(a, b)) {
            return true;
        }
        let model = self.model;
        let (da, db) = (model.definition(a), model.definition(b));

        if let (Some(pa), Some(pb)) = (da.as_primitive(), db.as_primitive()) {
            return equivalent_primitives(pa, pb);
        }
        let (Some(ma), Some(mb)) = (da.meta(), db.meta()) else {
            return false;
        };
        if ma.namespace != mb.namespace || ma.name != mb.name {
            return false;
        }

        self.assumed.insert((a, b));
        let equal = ma.type_parameters.len() == mb.type_parameters.len()
            && ma
                .type_parameters
                .iter()
                .zip(&mb.type_parameters)
                .all(|(pa, pb)| self.definitions(*pa, *pb))
            && ma.type_arguments.len() == mb.type_arguments.len()
            && ma
                .type_arguments
                .iter()
                .zip(&mb.type_arguments)
                .all(|(ta, tb)| self.types(ta, tb))
            && self.bodies(da, db);
        self.assumed.remove(&(a, b));
        equal
    }

    fn bodies(&mut self, a: &TypeDefinition, b: &TypeDefinition) -> bool {
        match (a, b) {
            (TypeDefinition::Parameter(_), TypeDefinition::Parameter(_)) => true,
            (TypeDefinition::Alias(a), TypeDefinition::Alias(b)) => self.types(&a.ty, &b.ty),
            (TypeDefinition::Record(a), TypeDefinition::Record(b)) => {
                a.fields.len() == b.fields.len()
                    && a.computed_fields.len() == b.computed_fields.len()
                    && a
                        .fields
                        .iter()
                        .zip(&b.fields)
                        .all(|(fa, fb)| fa.name == fb.name && self.types(&fa.ty, &fb.ty))
                    && a
                        .computed_fields
                        .iter()
                        .zip(&b.computed_fields)
                        .all(|(fa, fb)| fa.name == fb.name && self.expressions(&fa.expression, &fb.expression))
            }
            (TypeDefinition::Enum(a), TypeDefinition::Enum(b)) => {
                a.is_flags == b.is_flags
                    && a.values.len() == b.values.len()
                    && a
                        .values
                        .iter()
                        .zip(&b.values)
                        .all(|(va, vb)| va.symbol == vb.symbol && va.value == vb.value)
            }
            (TypeDefinition::Protocol(a), TypeDefinition::Protocol(b)) => {
                a.sequence.len() == b.sequence.len()
                    && a
                        .sequence
                        .iter()
                        .zip(&b.sequence)
                        .all(|(sa, sb)| sa.name == sb.name && self.types(&sa.ty, &sb.ty))
            }
            _ => false,
        }
    }

    fn expressions(&mut self, a: &Expression, b: &Expression) -> bool {
        use ExpressionKind as K;
        match (&a.kind, &b.kind) {
            (K::IntegerLiteral(x), K::IntegerLiteral(y)) => x == y,
            (K::FloatLiteral(x), K::FloatLiteral(y)) | (K::StringLiteral(x), K::StringLiteral(y)) => x == y,
            (
                K::MemberAccess {
                    target: ta, member: ma, ..
                },
                K::MemberAccess {
                    target: tb, member: mb, ..
                },
            ) => {
                ma == mb
                    && match (ta, tb) {
                        (None, None) => true,
                        (Some(ta), Some(tb)) => self.expressions(ta, tb),
                        _ => false,
                    }
            }
            (
                K::Index {
                    target: ta,
                    arguments: aa,
                },
                K::Index {
                    target: tb,
                    arguments: ab,
                },
            ) => {
                self.expressions(ta, tb)
                    && aa.len() == ab.len()
                    && aa
                        .iter()
                        .zip(ab)
                        .all(|(x, y)| x.label == y.label && self.expressions(&x.value, &y.value))
            }
            (
                K::FunctionCall {
                    function: fa,
                    arguments: aa,
                },
                K::FunctionCall {
                    function: fb,
                    arguments: ab,
                },
            ) => fa == fb && aa.len() == ab.len() && aa.iter().zip(ab).all(|(x, y)| self.expressions(x, y)),
            (
                K::TypeConversion {
                    expression: ea,
                    ty: ta,
                },
                K::TypeConversion {
                    expression: eb,
                    ty: tb,
                },
            ) => self.expressions(ea, eb) && self.types(ta, tb),
            (K::Switch { target: ta, cases: ca }, K::Switch { target: tb, cases: cb }) => {
                self.expressions(ta, tb)
                    && ca.len() == cb.len()
                    && ca
                        .iter()
                        .zip(cb)
                        .all(|(x, y)| self.patterns(&x.pattern, &y.pattern) && self.expressions(&x.expression, &y.expression))
            }
            (
                K::Binary {
                    op: oa,
                    left: la,
                    right: ra,
                },
                K::Binary {
                    op: ob,
                    left: lb,
                    right: rb,
                },
            ) => oa == ob && self.expressions(la, lb) && self.expressions(ra, rb),
            (K::Unary { op: oa, operand: xa }, K::Unary { op: ob, operand: xb }) => {
                oa == ob && self.expressions(xa, xb)
            }
            _ => false,
        }
    }

    fn patterns(&mut self, a: &Pattern, b: &Pattern) -> bool {
        match (a, b) {
            (Pattern::Discard { .. }, Pattern::Discard { .. }) => true,
            (Pattern::Type { ty: ta, .. }, Pattern::Type { ty: tb, .. }) => {
                self.optional_types(ta.as_ref(), tb.as_ref())
            }
            (
                Pattern::Declaration {
                    ty: ta,
                    identifier: ia,
                    ..
                },
                Pattern::Declaration {
                    ty: tb,
                    identifier: ib,
                    ..
                },
            ) => ia == ib && self.optional_types(ta.as_ref(), tb.as_ref()),
            _ => false,
        }
    }
}

fn equivalent_primitives(a: PrimitiveId, b: PrimitiveId) -> bool {
    let canonical = |p| if p == PrimitiveId::Size { PrimitiveId::Uint64 } else { p };
    canonical(a) == canonical(b)
}
