//! Builtin functions: `size`, `dimensionIndex` and `dimensionCount`.
//!
//! All three return `size`. Calls whose answer is known from the declared shape fold into literals.

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use yarrow_core::lang::builtins::{self, BuiltinFnId};
use yarrow_core::lang::primitives::{self, PrimitiveId};

use super::{ComputedResolver, Scope, size_literal};
use crate::frontend::ast::*;
use crate::frontend::typefns;

impl ComputedResolver<'_> {
    pub(super) fn resolve_function_call(
        &mut self,
        function: &str,
        arguments: &[Expression],
        location: &SourceLocation,
        scope: &Scope,
    ) -> Expression {
        let arguments: Vec<Expression> = arguments.iter().map(|a| self.resolve(a, scope)).collect();
        match builtins::from_str(function) {
            Some(BuiltinFnId::Size) => self.size(arguments, location),
            Some(BuiltinFnId::DimensionIndex) => self.dimension_index(arguments, location),
            Some(BuiltinFnId::DimensionCount) => self.dimension_count(arguments, location),
            None => {
                self.error(format!("unknown function '{function}'"), location);
                call(function, arguments, location)
            }
        }
    }

    /// The container shape of a resolved argument.
    fn dimensionality_of(&self, argument: &Expression) -> Option<Option<Dimensionality>> {
        let ty = argument.resolved_type.as_ref()?;
        Some(typefns::to_generalized(typefns::underlying(self.model, ty)).dimensionality)
    }

    fn size(&mut self, arguments: Vec<Expression>, location: &SourceLocation) -> Expression {
        let name = builtins::as_str(BuiltinFnId::Size);
        if arguments.is_empty() || arguments.len() > 2 {
            self.error(
                format!("{name}() expects 1 or 2 arguments, but called with {}", arguments.len()),
                location,
            );
            return sized_call(name, arguments, location);
        }
        let Some(dimensionality) = self.dimensionality_of(&arguments[0]) else {
            return sized_call(name, arguments, location);
        };

        match dimensionality {
            Some(Dimensionality::Vector { length, .. }) => {
                if arguments.len() == 2 {
                    self.error(
                        format!("{name}() does not accept a second argument when called with a !vector"),
                        location,
                    );
                } else if let Some(length) = length {
                    return size_literal(length, location);
                }
            }
            Some(Dimensionality::Map { .. }) => {
                if arguments.len() == 2 {
                    self.error(
                        format!("{name}() does not accept a second argument when called with a !map"),
                        location,
                    );
                }
            }
            Some(Dimensionality::Array { dimensions, .. }) => {
                if arguments.len() == 1 {
                    if let Some(dimensions) = dimensions.as_ref().filter(|_| is_fixed_array(&dimensions)) {
                        // Element counts beyond `size` stay unfolded.
                        let product: BigInt = dimensions.iter().filter_map(|d| d.length).map(BigInt::from).product();
                        if let Some(count) = product.to_u64() {
                            return size_literal(count, location);
                        }
                    }
                    return sized_call(name, arguments, location);
                }
                return self.array_dimension_size(arguments, dimensions.as_deref(), location);
            }
            None | Some(Dimensionality::Stream { .. }) => {
                self.error(
                    format!("{name}() must be called with a !vector, !array, or !map as the first argument"),
                    location,
                );
            }
        }
        sized_call(name, arguments, location)
    }

    /// `size(array, dim)` where `dim` is a dimension name or index.
    fn array_dimension_size(
        &mut self,
        mut arguments: Vec<Expression>,
        dimensions: Option<&[ArrayDimension]>,
        location: &SourceLocation,
    ) -> Expression {
        let name = builtins::as_str(BuiltinFnId::Size);
        let Some(dimension_type) = arguments[1].resolved_type.clone() else {
            return sized_call(name, arguments, location);
        };

        match typefns::primitive_of(self.model, &dimension_type) {
            Some(PrimitiveId::String) => {
                let Some(label) = arguments[1].as_string_literal().map(str::to_string) else {
                    let target = arguments[0].clone();
                    let dimension = arguments.remove(1);
                    let index = self.dimension_index(vec![target, dimension], location);
                    arguments.push(index);
                    return sized_call(name, arguments, location);
                };
                let position = dimensions
                    .and_then(|dims| dims.iter().position(|d| d.name.as_deref() == Some(label.as_str())));
                match (position, dimensions) {
                    (Some(position), Some(dims)) => {
                        if let Some(length) = dims[position].length {
                            return size_literal(length, location);
                        }
                        let argument_location = arguments[1].location.clone();
                        arguments[1] = self.resolve_integer_literal(&position.into(), &argument_location);
                    }
                    _ => {
                        self.error(
                            format!("this array does not have a dimension named '{label}'"),
                            &arguments[1].location,
                        );
                    }
                }
            }
            Some(primitive) if primitives::is_integral(primitive) => {
                let Some(value) = arguments[1].as_integer_literal() else {
                    return sized_call(name, arguments, location);
                };
                if value.is_negative() {
                    self.error("array dimension cannot be negative", &arguments[1].location);
                } else if let Some(dims) = dimensions {
                    match value.to_usize().filter(|i| *i < dims.len()) {
                        None => self.error("array dimension index is out of bounds", &arguments[1].location),
                        Some(index) => {
                            if let Some(length) = dims[index].length {
                                return size_literal(length, location);
                            }
                        }
                    }
                }
            }
            _ => {
                self.error(
                    format!("{name}() expects a string or integer as its second argument"),
                    &arguments[1].location,
                );
            }
        }
        sized_call(name, arguments, location)
    }

    fn dimension_index(&mut self, arguments: Vec<Expression>, location: &SourceLocation) -> Expression {
        let name = builtins::as_str(BuiltinFnId::DimensionIndex);
        if arguments.len() != 2 {
            self.error(
                format!("{name}() expects 2 arguments, but called with {}", arguments.len()),
                location,
            );
            return sized_call(name, arguments, location);
        }
        let Some(dimensionality) = self.dimensionality_of(&arguments[0]) else {
            return sized_call(name, arguments, location);
        };

        let Some(Dimensionality::Array { dimensions, .. }) = dimensionality else {
            self.error(
                format!("{name}() must be called with an !array as the first argument"),
                location,
            );
            return sized_call(name, arguments, location);
        };
        let Some(dimension_type) = &arguments[1].resolved_type else {
            return sized_call(name, arguments, location);
        };

        let named = dimensions.as_ref().filter(|dims| dims.iter().any(|d| d.name.is_some()));
        let Some(dims) = named else {
            self.error(format!("{name}() is only valid for arrays with named dimensions"), location);
            return sized_call(name, arguments, location);
        };

        if typefns::primitive_of(self.model, dimension_type) != Some(PrimitiveId::String) {
            self.error(
                format!("the second argument to {name}() must be a dimension name string"),
                &arguments[1].location,
            );
            return sized_call(name, arguments, location);
        }

        if let Some(label) = arguments[1].as_string_literal() {
            match dims.iter().position(|d| d.name.as_deref() == Some(label)) {
                Some(position) => return size_literal(position, location),
                None => {
                    let message = format!("the array does not have a dimension named '{label}'");
                    self.error(message, location);
                }
            }
        }
        sized_call(name, arguments, location)
    }

    fn dimension_count(&mut self, arguments: Vec<Expression>, location: &SourceLocation) -> Expression {
        let name = builtins::as_str(BuiltinFnId::DimensionCount);
        if arguments.len() != 1 {
            self.error(
                format!("{name}() expects 1 argument, but called with {}", arguments.len()),
                location,
            );
            return sized_call(name, arguments, location);
        }
        let Some(dimensionality) = self.dimensionality_of(&arguments[0]) else {
            return sized_call(name, arguments, location);
        };

        match dimensionality {
            Some(Dimensionality::Array {
                dimensions: Some(dims), ..
            }) => size_literal(dims.len(), location),
            Some(Dimensionality::Array { dimensions: None, .. }) => sized_call(name, arguments, location),
            _ => {
                self.error(format!("{name}() must be called with an !array argument"), location);
                sized_call(name, arguments, location)
            }
        }
    }
}

fn call(function: &str, arguments: Vec<Expression>, location: &SourceLocation) -> Expression {
    Expression::new(
        ExpressionKind::FunctionCall {
            function: function.to_string(),
            arguments,
        },
        location.clone(),
    )
}

/// A call left in place, typed `size`.
fn sized_call(function: &str, arguments: Vec<Expression>, location: &SourceLocation) -> Expression {
    super::typed(call(function, arguments, location), PrimitiveId::Size)
}
