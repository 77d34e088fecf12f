//! Property-based tests for the yarrow front end
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use proptest::prelude::*;

use yarrow::ast::{Model, SourceLocation, Type};
use yarrow::diagnostics::{Diagnostic, sort_diagnostics};
use yarrow::frontend::generics::{Instantiator, Mode};
use yarrow::frontend::{loader, parser, printer, typefns};
use yarrow_core::lang::primitives::PrimitiveId;
use yarrow_core::numeric;

// =============================================================================
// Literal Narrowing Properties
// =============================================================================

mod literal_tests {
    use super::*;

    proptest! {
        /// Property: every 64-bit literal gets a type that can hold it
        #[test]
        fn narrowest_integer_fits(value in (i64::MIN as i128)..=(u64::MAX as i128)) {
            let primitive = numeric::narrowest_integer(value);
            prop_assert!(primitive.is_some());
            prop_assert!(numeric::fits(primitive.unwrap(), value));
        }

        /// Property: literals beyond 64 bits have no integer type
        #[test]
        fn oversized_literals_have_no_type(excess in 1i128..=i64::MAX as i128) {
            prop_assert_eq!(numeric::narrowest_integer(u64::MAX as i128 + excess), None);
            prop_assert_eq!(numeric::narrowest_integer(i64::MIN as i128 - excess), None);
        }

        /// Property: non-negative literals never get a signed type when an unsigned one fits
        #[test]
        fn small_positive_literals_are_unsigned(value in 0i128..=255) {
            prop_assert_eq!(numeric::narrowest_integer(value), Some(PrimitiveId::Uint8));
        }
    }
}

// =============================================================================
// Type String Properties
// =============================================================================

mod type_string_tests {
    use super::*;

    fn leaf() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["int", "uint8", "float", "string", "Foo", "Ns.Bar", "Box<int>", "Pair<T, string>"])
            .prop_map(str::to_string)
    }

    fn type_string() -> impl Strategy<Value = String> {
        leaf().prop_recursive(4, 24, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(|t| format!("({t})?")),
                inner.clone().prop_map(|t| format!("({t})*")),
                (inner.clone(), 1u64..100).prop_map(|(t, n)| format!("({t})*{n}")),
                inner.clone().prop_map(|t| format!("({t})[]")),
                inner.clone().prop_map(|t| format!("({t})[y, x]")),
                (inner.clone(), 1u64..8, 1u64..8).prop_map(|(t, a, b)| format!("({t})[{a}, {b}]")),
                (leaf(), inner).prop_map(|(k, v)| format!("{k}->({v})")),
            ]
        })
    }

    fn normalize(text: &str) -> Result<String, Vec<Diagnostic>> {
        let ty = parser::parse_type(text, &SourceLocation::new("prop", 1, 1))?;
        Ok(printer::type_syntax(&ty, true))
    }

    proptest! {
        /// Property: printing a parsed type string gives a fixed point of parse-then-print
        #[test]
        fn printed_types_reparse_to_the_same_text(text in type_string()) {
            let once = normalize(&text).expect("generated type strings parse");
            let twice = normalize(&once).expect("printed type strings parse");
            prop_assert_eq!(once, twice);
        }
    }
}

// =============================================================================
// Diagnostic Ordering Properties
// =============================================================================

mod diagnostic_tests {
    use super::*;

    fn diagnostic() -> impl Strategy<Value = Diagnostic> {
        (0usize..3, 1usize..20, 1usize..20, 0usize..4).prop_map(|(file, line, column, message)| {
            let location = SourceLocation::new(format!("f{file}.yml"), line, column);
            Diagnostic::structural(format!("problem {message}"), &location)
        })
    }

    fn key(d: &Diagnostic) -> (String, usize, usize, String) {
        let location = d.location.as_ref().expect("located");
        (location.file.to_string(), location.line, location.column, d.message.clone())
    }

    proptest! {
        /// Property: sorted diagnostics are ordered and independent of the input order
        #[test]
        fn sorting_is_total_and_order_independent(mut diagnostics in prop::collection::vec(diagnostic(), 0..30)) {
            let mut reversed: Vec<Diagnostic> = diagnostics.iter().rev().cloned().collect();
            sort_diagnostics(&mut diagnostics);
            sort_diagnostics(&mut reversed);

            prop_assert!(diagnostics.windows(2).all(|w| key(&w[0]) <= key(&w[1])));
            prop_assert_eq!(diagnostics, reversed);
        }
    }
}

// =============================================================================
// Generic Instantiation Properties
// =============================================================================

mod instantiation_tests {
    use super::*;

    const PRIMITIVES: &[PrimitiveId] = &[
        PrimitiveId::Int8,
        PrimitiveId::Uint16,
        PrimitiveId::Int32,
        PrimitiveId::Float64,
        PrimitiveId::String,
        PrimitiveId::Bool,
    ];

    fn pair_model() -> (Model, yarrow::ast::DefId) {
        let mut model = Model::new();
        loader::load_str(&mut model, "Test", "pair.yml", "Pair<A, B>: !record\n  fields:\n    a: A\n    b: B\n")
            .expect("loads");
        let env = yarrow::validate(model).expect("valid");
        let pair = env.symbols().get("Test.Pair").expect("registered");
        (env.model().clone(), pair)
    }

    fn arguments(a: PrimitiveId, b: PrimitiveId, line: usize) -> Vec<Type> {
        vec![
            Type::primitive(a, SourceLocation::new("use.yml", line, 1)),
            Type::primitive(b, SourceLocation::new("use.yml", line, 10)),
        ]
    }

    proptest! {
        /// Property: instances built from structurally equal arguments are equal definitions
        #[test]
        fn equal_arguments_give_equal_instances(
            a in prop::sample::select(PRIMITIVES),
            b in prop::sample::select(PRIMITIVES),
        ) {
            let (mut model, pair) = pair_model();
            let mut instantiator = Instantiator::new();
            let first = instantiator.instantiate(&mut model, pair, arguments(a, b, 1), Mode::Shallow).expect("instantiates");
            let second = instantiator.instantiate(&mut model, pair, arguments(a, b, 2), Mode::Shallow).expect("instantiates");

            prop_assert_ne!(first, second);
            prop_assert!(typefns::definitions_equal(&model, first, second));
        }

        /// Property: different arguments give different instances
        #[test]
        fn different_arguments_give_different_instances(
            a in prop::sample::select(PRIMITIVES),
            b in prop::sample::select(PRIMITIVES),
        ) {
            prop_assume!(a != b);
            let (mut model, pair) = pair_model();
            let mut instantiator = Instantiator::new();
            let first = instantiator.instantiate(&mut model, pair, arguments(a, a, 1), Mode::Shallow).expect("instantiates");
            let second = instantiator.instantiate(&mut model, pair, arguments(b, b, 1), Mode::Shallow).expect("instantiates");

            prop_assert!(!typefns::definitions_equal(&model, first, second));
        }
    }
}
