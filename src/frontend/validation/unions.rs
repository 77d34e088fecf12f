//! Union tagging and union case validation.
//!
//! ## Notes
//! - A case whose type carries a different location than the case itself was substituted from a type argument. Such
//!   redundancies are reported against the argument, so the user sees which use of a generic caused them.
//! - Generic instances reached through a non-recursive reference are validated once each. Only redundancies caused
//!   by type arguments are reported there; everything else was already reported on the generic itself.

use std::collections::{HashMap, HashSet};

use yarrow_core::lang::conventions::{self, MEMBER_NAME_FORMAT};
use yarrow_core::lang::primitives::PrimitiveId;

use super::PassContext;
use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::printer::type_syntax;
use crate::frontend::typefns;
use crate::frontend::walk::rewriter::{self, Rewriter};
use crate::frontend::walk::visitor::{self, Visitor};

// ============================================================================
// TAG ASSIGNMENT
// ============================================================================

/// Fills in implicit tags: the short type syntax of each case, `null` for the null case.
struct TagAssigner;

impl Rewriter for TagAssigner {
    fn rewrite_type(&mut self, model: &mut Model, ty: &Type) -> Option<Type> {
        let rewritten = rewriter::rewrite_type_children(self, model, ty);
        let current = rewritten.as_ref().unwrap_or(ty);
        let Type::Generalized(generalized) = current else {
            return rewritten;
        };

        let first_tagged = generalized.cases.first().is_some_and(|c| !c.tag.is_empty());
        let needs_tags = generalized.cases.iter().any(|c| c.tag.is_empty());
        if !(generalized.is_union() || first_tagged) || !needs_tags {
            return rewritten;
        }

        let mut tagged = generalized.clone();
        for case in tagged.cases.iter_mut().filter(|c| c.tag.is_empty()) {
            case.tag = match &case.ty {
                Some(ty) => type_syntax(ty, false),
                None => "null".to_string(),
            };
        }
        Some(Type::Generalized(tagged))
    }
}

pub(super) fn assign_union_case_tags(cx: &mut PassContext) {
    for id in cx.definition_ids() {
        rewriter::rewrite_in_place(&mut TagAssigner, &mut cx.model, id);
    }
}

// ============================================================================
// CASE VALIDATION
// ============================================================================

#[derive(Default)]
struct UnionChecker {
    errors: Vec<Diagnostic>,
    /// Sorted explicit-tag sets mapped to the first type that used them.
    tag_types: HashMap<String, Type>,
    visited_instances: HashSet<DefId>,
    visiting_reference: bool,
}

impl Visitor for UnionChecker {
    fn visit_generalized_type(&mut self, model: &Model, ty: &GeneralizedType) {
        self.check(model, ty);
        visitor::walk_generalized_type(self, model, ty);
    }

    fn visit_simple_type(&mut self, model: &Model, ty: &SimpleType) {
        if let Some(id) = ty.resolved {
            let is_instance = !model.definition(id).type_arguments().is_empty();
            if is_instance && !ty.is_recursive && self.visited_instances.insert(id) {
                let outer = std::mem::replace(&mut self.visiting_reference, true);
                self.visit_definition(model, id);
                self.visiting_reference = outer;
            }
        }
        visitor::walk_simple_type(self, model, ty);
    }
}

impl UnionChecker {
    fn check(&mut self, model: &Model, ty: &GeneralizedType) {
        let snapshot = self.errors.len();
        let cases = &ty.cases;

        if cases.is_empty() {
            self.error("a union type must have at least one option", &ty.location);
        }
        if cases.len() == 1 && cases[0].is_null() {
            self.error("null cannot be the only option in a union type", &ty.location);
        }
        for _ in cases.iter().skip(1).filter(|c| c.is_null()) {
            self.error(
                "if null is specified in a union type, it must be the first option",
                &ty.location,
            );
        }

        if cases.len() > 1 {
            for case in cases {
                if let Some(Type::Generalized(child)) = &case.ty {
                    if child.cases.len() > 1 {
                        self.error("unions may not immediately contain other unions", &case.location);
                    }
                }
            }

            for (i, item) in cases.iter().enumerate() {
                for other in &cases[i + 1..] {
                    if optional_types_equal(model, item.ty.as_ref(), other.ty.as_ref()) {
                        self.report_redundant(model, item, other);
                    }
                }
            }
        }

        let tagged = ty.is_union() || cases.first().is_some_and(|c| c.explicit_tag);
        if tagged && self.errors.len() == snapshot && !self.visiting_reference {
            self.check_tags(model, ty);
        }
    }

    fn report_redundant(&mut self, model: &Model, item: &TypeCase, other: &TypeCase) {
        let (Some(item_ty), Some(other_ty)) = (&item.ty, &other.ty) else {
            if !self.visiting_reference {
                self.error("redundant union type cases", &item.location);
            }
            return;
        };

        let explanation = match (typefns::primitive_of(model, item_ty), typefns::primitive_of(model, other_ty)) {
            (Some(PrimitiveId::Uint64), Some(PrimitiveId::Size)) | (Some(PrimitiveId::Size), Some(PrimitiveId::Uint64)) => {
                " (uint64 and size are equivalent)"
            }
            _ => "",
        };

        let item_elsewhere = &item.location != item_ty.location();
        let other_elsewhere = &other.location != other_ty.location();
        match (item_elsewhere, other_elsewhere) {
            (true, true) => self.error(
                format!(
                    "redundant union type cases resulting from the type arguments given at {} and {}{explanation}",
                    item_ty.location(),
                    other_ty.location()
                ),
                &item.location,
            ),
            (true, false) => self.error(
                format!(
                    "redundant union type cases resulting from the type argument given at {}{explanation}",
                    item_ty.location()
                ),
                &other.location,
            ),
            (false, true) => self.error(
                format!(
                    "redundant union type cases resulting from the type argument given at {}{explanation}",
                    other_ty.location()
                ),
                &item.location,
            ),
            (false, false) => {
                if !self.visiting_reference {
                    self.error(format!("redundant union type cases{explanation}"), &item.location);
                }
            }
        }
    }

    fn check_tags(&mut self, model: &Model, ty: &GeneralizedType) {
        for case in &ty.cases {
            if case.explicit_tag {
                if !conventions::is_member_name(&case.tag) {
                    self.error(
                        format!(
                            "union tag '{}' must be camelCased matching the format {MEMBER_NAME_FORMAT}",
                            case.tag
                        ),
                        &case.location,
                    );
                }
                continue;
            }
            if conventions::is_member_name(&case.tag.to_lowercase()) {
                continue;
            }

            let explicit_example = format!("!union {{ myTag: \"{}\", ... }}", case.tag);
            let has_open_generic = ty
                .cases
                .iter()
                .filter_map(|c| c.ty.as_ref())
                .any(|t| typefns::contains_open_generic(model, t));
            let message = if has_open_generic {
                format!(
                    "the type '{}' cannot be used as a tag for the union case. An explicit tag can be given using \
                     the `!union` syntax (e.g. `{explicit_example}`)",
                    case.tag
                )
            } else {
                let alias_example = format!("MyTypeAlias = {}\nMyUnion = [..., MyTypeAlias, ...]", case.tag);
                format!(
                    "the type '{}' cannot be used as a tag for the union case. Explicit tags can be given using the \
                     `!union` syntax (e.g. `{explicit_example}`) or the type can be aliased for the type case (e.g. \
                     `{alias_example}`)",
                    case.tag
                )
            };
            self.error(message, &case.location);
        }

        let mut tags = HashSet::new();
        for case in &ty.cases {
            if !tags.insert(case.tag.as_str()) {
                self.error("all union cases must have distinct tags", &ty.location);
            }
        }

        if ty.cases.iter().any(|c| c.explicit_tag) {
            let mut keys: Vec<&str> = tags.into_iter().collect();
            keys.sort_unstable();
            let key = keys.join(", ");
            let scalar = ty.to_scalar();
            let conflict = self
                .tag_types
                .get(&key)
                .map(|existing| (!typefns::types_equal(model, existing, &scalar)).then(|| existing.location().clone()));
            match conflict {
                Some(Some(location)) => {
                    let message = format!(
                        "the combination of tags used by the union are already in use with different types in file \
                         '{}' line '{}'",
                        location.file, location.line
                    );
                    self.error(message, &ty.location);
                }
                Some(None) => {}
                None => {
                    self.tag_types.insert(key, scalar);
                }
            }
        }
    }

    /// Record an error once; an argument union is seen both directly and through the instance it produced.
    fn error(&mut self, message: impl Into<String>, location: &SourceLocation) {
        let diagnostic = Diagnostic::structural(message, location);
        if !self.errors.contains(&diagnostic) {
            self.errors.push(diagnostic);
        }
    }
}

pub(super) fn optional_types_equal(model: &Model, a: Option<&Type>, b: Option<&Type>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => typefns::types_equal(model, a, b),
        _ => false,
    }
}

pub(super) fn validate_union_cases(cx: &mut PassContext) {
    if cx.sink.has_errors() {
        return;
    }
    let mut checker = UnionChecker::default();
    for id in cx.definition_ids() {
        checker.visit_definition(&cx.model, id);
    }
    cx.sink.extend(checker.errors);
}
