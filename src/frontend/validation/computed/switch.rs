//! Switch expressions over unions and optionals.
//!
//! ## What is validated
//! - The target is a scalar union or optional, not a container.
//! - Each type pattern names one of the target's cases that is not yet matched; `_` takes whatever remains.
//! - Every case of the target is matched by the end.
//! - The branches have a common type; branches of a narrower type get a conversion.

use super::{ComputedResolver, Scope};
use crate::frontend::ast::*;
use crate::frontend::typefns;
use crate::frontend::validation::unions::optional_types_equal;

impl ComputedResolver<'_> {
    pub(super) fn resolve_switch(
        &mut self,
        target: &Expression,
        cases: &[SwitchCase],
        location: &SourceLocation,
        scope: &Scope,
    ) -> Expression {
        let target = self.resolve(target, scope);
        let Some(target_type) = target.resolved_type.clone() else {
            return switch(target, cases.to_vec(), None, location);
        };

        let union = typefns::to_generalized(typefns::underlying(self.model, &target_type));
        if union.dimensionality.is_some() {
            self.error("switch expression cannot be applied to a vector or array", &target.location);
            return switch(target, cases.to_vec(), None, location);
        }

        let mut matched = vec![false; union.cases.len()];
        let mut resolved_cases = Vec::with_capacity(cases.len());
        for case in cases {
            let Some(resolved) = self.resolve_switch_case(case, &union, scope) else {
                resolved_cases.push(case.clone());
                continue;
            };

            match &resolved.pattern {
                Pattern::Discard { location } => {
                    if matched.iter().all(|m| *m) {
                        self.error("switch expression has no remaining cases to discard", location);
                    }
                    matched.iter_mut().for_each(|m| *m = true);
                }
                pattern => {
                    let remaining = union
                        .cases
                        .iter()
                        .zip(matched.iter_mut())
                        .find(|(c, m)| !**m && optional_types_equal(self.model, c.ty.as_ref(), pattern.ty()));
                    match remaining {
                        Some((_, m)) => *m = true,
                        None => self.error("the switch case is not reachable", pattern.location()),
                    }
                }
            }
            resolved_cases.push(resolved);
        }

        if matched.iter().any(|m| !*m) {
            self.error("switch expression is not exhaustive", location);
        }

        let mut common: Option<Type> = None;
        for case in &resolved_cases {
            let Some(ty) = &case.expression.resolved_type else {
                continue;
            };
            common = match common {
                None => Some(ty.clone()),
                Some(current) => match typefns::common_type(self.model, &current, ty) {
                    Some(next) => Some(next),
                    None => {
                        self.error("no best type was found for the switch expression", location);
                        return switch(target, resolved_cases, None, location);
                    }
                },
            };
        }

        if let Some(common) = &common {
            for case in &mut resolved_cases {
                if case.expression.resolved_type.is_some() {
                    let expression = std::mem::replace(&mut case.expression, Expression::integer(0, location.clone()));
                    case.expression = self.insert_conversion(expression, common);
                }
            }
        }
        switch(target, resolved_cases, common, location)
    }

    /// Resolve one arm. `None` when its pattern does not name a case of the target.
    fn resolve_switch_case(&mut self, case: &SwitchCase, union: &GeneralizedType, scope: &Scope) -> Option<SwitchCase> {
        let scope = match &case.pattern {
            Pattern::Discard { .. } => scope.clone(),
            Pattern::Type { ty, location } | Pattern::Declaration { ty, location, .. } => {
                let valid = union
                    .cases
                    .iter()
                    .any(|c| optional_types_equal(self.model, c.ty.as_ref(), ty.as_ref()));
                if !valid {
                    self.error("the type is not a valid case for this switch expression", location);
                    return None;
                }
                match (&case.pattern, ty) {
                    (Pattern::Declaration { identifier, .. }, Some(ty)) => scope.with_variable(identifier, ty.clone()),
                    (Pattern::Declaration { .. }, None) => {
                        self.error("a declaration pattern cannot be used with the null type", location);
                        scope.clone()
                    }
                    _ => scope.clone(),
                }
            }
        };

        Some(SwitchCase {
            pattern: case.pattern.clone(),
            expression: self.resolve(&case.expression, &scope),
            location: case.location.clone(),
        })
    }
}

fn switch(target: Expression, cases: Vec<SwitchCase>, ty: Option<Type>, location: &SourceLocation) -> Expression {
    Expression {
        kind: ExpressionKind::Switch {
            target: Box::new(target),
            cases,
        },
        resolved_type: ty,
        location: location.clone(),
    }
}
