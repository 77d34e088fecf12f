//! Subscripts on vectors, arrays and maps.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use yarrow_core::numeric;

use super::{ComputedResolver, Scope};
use crate::frontend::ast::*;
use crate::frontend::typefns;

impl ComputedResolver<'_> {
    pub(super) fn resolve_index(
        &mut self,
        target: &Expression,
        arguments: &[IndexArgument],
        location: &SourceLocation,
        scope: &Scope,
    ) -> Expression {
        let target = self.resolve(target, scope);
        let mut arguments: Vec<IndexArgument> = arguments
            .iter()
            .map(|argument| IndexArgument {
                label: argument.label.clone(),
                value: self.resolve(&argument.value, scope),
                location: argument.location.clone(),
            })
            .collect();

        let element_type = match &target.resolved_type {
            Some(ty) => {
                let generalized = typefns::to_generalized(typefns::underlying(self.model, ty));
                self.check_index(&generalized, &mut arguments, location)
                    .then(|| generalized.to_scalar())
            }
            None => None,
        };

        Expression {
            kind: ExpressionKind::Index {
                target: Box::new(target),
                arguments,
            },
            resolved_type: element_type,
            location: location.clone(),
        }
    }

    /// Validate the arguments against the container. Labeled array arguments are put in dimension order.
    fn check_index(
        &mut self,
        container: &GeneralizedType,
        arguments: &mut Vec<IndexArgument>,
        location: &SourceLocation,
    ) -> bool {
        let errors_before = self.errors.len();
        let mut arguments_validated = false;

        match &container.dimensionality {
            None | Some(Dimensionality::Stream { .. }) => {
                self.error("index target must be a vector, array, or map", location);
                return false;
            }
            Some(Dimensionality::Vector { length, .. }) => {
                if arguments.len() != 1 {
                    self.error("vector index must have exactly one argument", location);
                }
                if let (Some(length), Some(argument)) = (length, arguments.first()) {
                    if let Some(value) = too_large(&argument.value, *length) {
                        self.error(
                            format!("index argument ({value}) is too large for the vector of length {length}"),
                            &argument.value.location,
                        );
                    }
                }
            }
            Some(Dimensionality::Map { key_type, .. }) => {
                if arguments.len() != 1 {
                    self.error("map lookup must have exactly one argument", location);
                }
                let Some(argument) = arguments.first_mut() else {
                    return false;
                };
                let Some(argument_type) = &argument.value.resolved_type else {
                    return false;
                };
                if !typefns::types_equal(self.model, argument_type, key_type) {
                    if !self.literal_fits(&argument.value, key_type) {
                        self.error("incorrect map lookup argument type", &argument.value.location);
                        return false;
                    }
                    argument.value.resolved_type = Some((**key_type).clone());
                }
                arguments_validated = true;
            }
            Some(Dimensionality::Array { dimensions, .. }) => {
                let labeled = arguments.iter().filter(|a| a.label.is_some()).count();
                if labeled > 0 && labeled < arguments.len() {
                    self.error("array index cannot mix labeled and unlabeled arguments", location);
                    return false;
                }
                if let Some(dimensions) = dimensions {
                    if !self.check_array_arguments(dimensions, arguments, labeled > 0, location) {
                        return false;
                    }
                }
            }
        }

        if !arguments_validated {
            for argument in arguments.iter() {
                let Some(ty) = &argument.value.resolved_type else {
                    return false;
                };
                if !typefns::is_integral(self.model, ty) {
                    self.error("index argument must be an integral type", &argument.value.location);
                    return false;
                }
            }
        }

        self.errors.len() == errors_before
    }

    fn check_array_arguments(
        &mut self,
        dimensions: &[ArrayDimension],
        arguments: &mut Vec<IndexArgument>,
        labeled: bool,
        location: &SourceLocation,
    ) -> bool {
        if arguments.len() < dimensions.len() {
            self.error(
                format!("array index must provide arguments for all {} dimensions", dimensions.len()),
                location,
            );
            return false;
        }
        if arguments.len() > dimensions.len() {
            self.error(
                "array index has more arguments than dimensions",
                &arguments[dimensions.len()].value.location,
            );
            return false;
        }

        if labeled {
            let mut ordered: Vec<Option<IndexArgument>> = vec![None; dimensions.len()];
            for (position, argument) in arguments.iter().enumerate() {
                let label = argument.label.as_deref().unwrap_or_default();
                let Some(dimension) = dimensions.iter().position(|d| d.name.as_deref() == Some(label)) else {
                    self.error(
                        format!("the array has no dimension named '{label}'"),
                        &argument.value.location,
                    );
                    return false;
                };
                if ordered[dimension].is_some() {
                    self.error(
                        format!("array index has multiple arguments for dimension '{label}'"),
                        &argument.value.location,
                    );
                    return false;
                }
                if dimension != position {
                    let expected: Vec<&str> = dimensions.iter().filter_map(|d| d.name.as_deref()).collect();
                    self.error(
                        format!(
                            "array index has arguments must be specified in order: {}",
                            expected.join(", ")
                        ),
                        &argument.value.location,
                    );
                    return false;
                }
                ordered[dimension] = Some(argument.clone());
            }
            *arguments = ordered.into_iter().flatten().collect();
        }

        for (position, (argument, dimension)) in arguments.iter().zip(dimensions).enumerate() {
            let Some(length) = dimension.length else {
                continue;
            };
            if let Some(value) = too_large(&argument.value, length) {
                let label = argument.label.clone().unwrap_or_else(|| position.to_string());
                self.error(
                    format!("index argument ({value}) is too large for array dimension '{label}' of length {length}"),
                    &argument.value.location,
                );
            }
        }
        true
    }

    /// Whether an integer literal can stand for a value of the integral type `ty`.
    fn literal_fits(&self, expression: &Expression, ty: &Type) -> bool {
        match (expression.as_integer_literal(), typefns::primitive_of(self.model, ty)) {
            (Some(value), Some(primitive)) => value.to_i128().is_some_and(|v| numeric::fits(primitive, v)),
            _ => false,
        }
    }
}

/// The literal value of `argument` if it is not below `length`.
fn too_large(argument: &Expression, length: u64) -> Option<&BigInt> {
    argument
        .as_integer_literal()
        .filter(|value| **value >= BigInt::from(length))
}
