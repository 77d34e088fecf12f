//! Enum and flags validation.
//!
//! Values left blank in the model are assigned here: an enum value is one more than the previous value (starting at
//! zero), a flags value is the next power of two above the previous value (starting at one).

use std::collections::{BTreeMap, HashSet};

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use yarrow_core::lang::conventions::{self, MEMBER_NAME_FORMAT};
use yarrow_core::lang::primitives::{self, PrimitiveId};

use super::PassContext;
use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;

pub(super) fn validate_enums(cx: &mut PassContext) {
    for id in cx.definition_ids() {
        let TypeDefinition::Enum(definition) = cx.model.definition(id) else {
            continue;
        };

        let mut errors = Vec::new();
        let values = assign_values(definition, &mut errors);
        check_symbols(definition, &values, &mut errors);
        check_range(&cx.model, definition, &values, &mut errors);
        cx.sink.extend(errors);

        if let TypeDefinition::Enum(definition) = cx.model.definition_mut(id) {
            for (value, assigned) in definition.values.iter_mut().zip(values) {
                value.value = Some(assigned);
            }
        }
    }
}

/// "enum" or "flags", as used in diagnostics.
fn kind(definition: &EnumDefinition) -> &'static str {
    if definition.is_flags { "flags" } else { "enum" }
}

fn assign_values(definition: &EnumDefinition, errors: &mut Vec<Diagnostic>) -> Vec<BigInt> {
    let mut assigned: Vec<BigInt> = Vec::with_capacity(definition.values.len());
    for value in &definition.values {
        let next = match (&value.value, assigned.last()) {
            (Some(explicit), _) => explicit.clone(),
            (None, previous) if definition.is_flags => match previous {
                None => BigInt::one(),
                Some(previous) if previous.is_zero() => BigInt::one(),
                Some(previous) if previous.is_negative() => {
                    errors.push(Diagnostic::structural(
                        "flag value following a negative value must be explicitly specified",
                        &value.location,
                    ));
                    BigInt::zero()
                }
                Some(previous) => next_power_of_two(previous),
            },
            (None, None) => BigInt::zero(),
            (None, Some(previous)) => previous + 1,
        };
        assigned.push(next);
    }
    assigned
}

/// The smallest power of two greater than a positive `value`.
fn next_power_of_two(value: &BigInt) -> BigInt {
    BigInt::one() << value.bits()
}

fn check_symbols(definition: &EnumDefinition, values: &[BigInt], errors: &mut Vec<Diagnostic>) {
    let kind = kind(definition);
    let name = &definition.meta.name;

    let mut seen = HashSet::new();
    let mut by_value: BTreeMap<&BigInt, Vec<&str>> = BTreeMap::new();
    for (value, assigned) in definition.values.iter().zip(values) {
        if !conventions::is_member_name(&value.symbol) {
            errors.push(Diagnostic::structural(
                format!(
                    "in {kind} '{name}', the symbol name '{}' must be camelCased matching the format \
                     {MEMBER_NAME_FORMAT}",
                    value.symbol
                ),
                &value.location,
            ));
        }
        if !seen.insert(value.symbol.as_str()) {
            errors.push(Diagnostic::structural(
                format!("in {kind} '{name}', the symbol '{}' is defined more than once", value.symbol),
                &definition.meta.location,
            ));
        }
        by_value.entry(assigned).or_default().push(&value.symbol);
    }

    for (value, symbols) in by_value {
        if symbols.len() > 1 {
            errors.push(Diagnostic::structural(
                format!(
                    "in {kind} '{name}', the symbols [{}] have the same value of {value}",
                    symbols.join(" ")
                ),
                &definition.meta.location,
            ));
        }
    }
}

fn check_range(model: &Model, definition: &EnumDefinition, values: &[BigInt], errors: &mut Vec<Diagnostic>) {
    let kind = kind(definition);
    let name = &definition.meta.name;

    let base = match &definition.base {
        None => PrimitiveId::Int32,
        Some(base) => match crate::frontend::typefns::underlying(model, base) {
            // Unresolved names were already reported.
            Type::Simple(SimpleType { resolved: None, .. }) => return,
            Type::Simple(SimpleType {
                resolved: Some(id), ..
            }) => match model.definition(*id).as_primitive() {
                Some(primitive) => primitive,
                None => return non_integer_base(definition, errors),
            },
            Type::Generalized(_) => return non_integer_base(definition, errors),
        },
    };

    let Some((min, max)) = primitives::integer_range(base) else {
        return non_integer_base(definition, errors);
    };
    let (min, max) = (BigInt::from(min), BigInt::from(max));
    for (value, assigned) in definition.values.iter().zip(values) {
        if *assigned < min || *assigned > max {
            errors.push(Diagnostic::structural(
                format!(
                    "in {kind} '{name}', the value '{assigned}' for symbol '{}' is out of range for the base type \
                     '{}'",
                    value.symbol,
                    primitives::as_str(base)
                ),
                &value.location,
            ));
        }
    }
}

fn non_integer_base(definition: &EnumDefinition, errors: &mut Vec<Diagnostic>) {
    errors.push(Diagnostic::structural(
        format!(
            "in {} '{}', the base type must be an integer type",
            kind(definition),
            definition.meta.name
        ),
        &definition.meta.location,
    ));
}
