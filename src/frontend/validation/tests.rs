//! Validation unit tests.

use num_bigint::BigInt;
use yarrow_core::lang::primitives::PrimitiveId;

use super::*;
use crate::frontend::ast::{Expression, TypeDefinition};
use crate::frontend::{loader, typefns};

fn validate_str(source: &str) -> Result<Environment, Vec<Diagnostic>> {
    let mut model = Model::new();
    loader::load_str(&mut model, "Test", "test.yml", source.trim_start_matches('\n'))?;
    validate(model)
}

fn messages(source: &str) -> Vec<String> {
    match validate_str(source) {
        Ok(_) => Vec::new(),
        Err(errors) => errors.into_iter().map(|e| e.message).collect(),
    }
}

#[track_caller]
fn assert_valid(source: &str) -> Environment {
    match validate_str(source) {
        Ok(env) => env,
        Err(errors) => panic!("expected a valid model, got {:#?}", errors),
    }
}

#[track_caller]
fn assert_error(source: &str, needle: &str) {
    let messages = messages(source);
    assert!(
        messages.iter().any(|m| m.contains(needle)),
        "expected an error containing {needle:?}, got {messages:#?}"
    );
}

fn computed(env: &Environment, record: &str, field: &str) -> Expression {
    let Some(TypeDefinition::Record(definition)) = env.lookup(record) else {
        panic!("'{record}' is not a record");
    };
    definition
        .computed_fields
        .iter()
        .find(|f| f.name == field)
        .map(|f| f.expression.clone())
        .expect("computed field exists")
}

fn computed_primitive(env: &Environment, record: &str, field: &str) -> Option<PrimitiveId> {
    let expression = computed(env, record, field);
    expression
        .resolved_type
        .as_ref()
        .and_then(|ty| typefns::primitive_of(env.model(), ty))
}

fn folded(env: &Environment, record: &str, field: &str) -> Option<BigInt> {
    computed(env, record, field).as_integer_literal().cloned()
}

// ========================================
// Names
// ========================================

#[test]
fn test_type_name_must_be_pascal_case() {
    assert_error(
        "point: !record\n  fields:\n    x: int\n",
        "type name 'point' must be PascalCased matching the format ^[A-Z][a-zA-Z0-9]{0,63}$",
    );
}

#[test]
fn test_field_name_must_be_camel_case() {
    assert_error(
        "X: !record\n  fields:\n    Bad: int\n",
        "field name 'Bad' must be camelCased",
    );
}

#[test]
fn test_computed_field_clashes_with_field() {
    let source = r#"
X: !record
  fields:
    a: int
  computedFields:
    a: 1
"#;
    assert_error(
        source,
        "a field or computed field with the name 'a' is already defined on the record 'X'",
    );
}

#[test]
fn test_generic_enum_is_rejected() {
    assert_error(
        "E<T>: !enum\n  values:\n    - a\n",
        "'E' cannot have generic type parameters",
    );
}

#[test]
fn test_unused_generic_parameter() {
    assert_error(
        "Box<T>: !record\n  fields:\n    v: int\n",
        "generic type parameter 'T' is not used",
    );
}

#[test]
fn test_duplicate_definition_reports_first_location() {
    let source = "X: !record\n  fields:\n    a: int\n---\nX: !record\n  fields:\n    b: int\n";
    assert_error(source, "the name 'X' is already defined in file 'test.yml' line '1'");
}

// ========================================
// Resolution
// ========================================

#[test]
fn test_unknown_type() {
    assert_error(
        "X: !record\n  fields:\n    a: Missing\n",
        "the type 'Missing' is not recognized",
    );
}

#[test]
fn test_protocol_cannot_be_referenced() {
    let source = r#"
P: !protocol
  sequence:
    a: int
X: !record
  fields:
    p: P
"#;
    assert_error(source, "cannot reference a protocol");
}

#[test]
fn test_generic_arity() {
    let source = r#"
Box<T>: !record
  fields:
    v: T
X: !record
  fields:
    b: Box<int, float>
"#;
    assert_error(source, "was given 2 type argument(s) but has 1 type parameter(s)");
}

#[test]
fn test_generic_instance_validates() {
    let source = r#"
Box<T>: !record
  fields:
    v: T
X: !record
  fields:
    b: Box<int>
    c: Box<string>
"#;
    assert_valid(source);
}

// ========================================
// Dimensions, streams and maps
// ========================================

#[test]
fn test_array_lengths_all_or_none() {
    assert_error(
        "X: !record\n  fields:\n    a: int[x:2, y]\n",
        "lengths must either be specified on all dimensions or none of them",
    );
}

#[test]
fn test_array_dimension_name_format() {
    assert_error(
        "X: !record\n  fields:\n    a: int[X:2]\n",
        "dimension name 'X' must match the format",
    );
}

#[test]
fn test_stream_outside_protocol() {
    let source = r#"
X: !record
  fields:
    s: !stream
      items: int
"#;
    assert_error(
        source,
        "!streams can only be declared as top-level protocol sequence elements",
    );
}

#[test]
fn test_stream_in_protocol() {
    let source = r#"
P: !protocol
  sequence:
    header: string
    samples: !stream
      items: int
"#;
    assert_valid(source);
}

#[test]
fn test_map_key_must_be_primitive() {
    let source = r#"
Y: !record
  fields:
    a: int
X: !record
  fields:
    m: Y->int
"#;
    assert_error(source, "map key type must be a primitive scalar type");
}

// ========================================
// Ordering and cycles
// ========================================

#[test]
fn test_types_are_sorted_by_dependency() {
    let source = r#"
A: !record
  fields:
    b: B
B: !record
  fields:
    x: int
"#;
    let env = assert_valid(source);
    let names: Vec<&str> = env.types("Test").map(|d| d.name()).collect();
    assert_eq!(names, vec!["B", "A"]);
}

#[test]
fn test_reference_cycle() {
    let source = r#"
A: !record
  fields:
    b: B
B: !record
  fields:
    a: A
"#;
    assert_eq!(
        messages(source),
        vec![
            "there is a reference cycle, which is not supported, within namespace 'Test': \
             Record 'A' -> Field 'b' -> Record 'B' -> Field 'a' -> Record 'A'"
        ]
    );
}

#[test]
fn test_recursive_reference_is_allowed() {
    let source = r#"
Node: !record
  fields:
    value: int
    children: !vector
      items: !recursive Node
"#;
    assert_valid(source);
}

// ========================================
// Unions
// ========================================

#[test]
fn test_redundant_union_cases() {
    assert_error("U: [int, int]\n", "redundant union type cases");
}

#[test]
fn test_generic_union_with_distinct_arguments() {
    let source = r#"
MyUnion<T, U>: [T, U]
MyRecord: !record
  fields:
    f: MyUnion<int, float>
"#;
    assert_valid(source);
}

#[test]
fn test_redundant_cases_from_two_type_arguments() {
    let source = r#"
MyUnion<T, U>: [T, U]
MyRecord: !record
  fields:
    f: MyUnion<int, int>
"#;
    assert_eq!(
        messages(source),
        vec!["redundant union type cases resulting from the type arguments given at test.yml:4:16 and test.yml:4:21"]
    );
}

#[test]
fn test_redundant_cases_from_one_type_argument() {
    let source = r#"
MyUnion<T, U>: [T, int]
MyRecord: !record
  fields:
    f: MyUnion<int, float>
"#;
    assert_eq!(
        messages(source),
        vec!["redundant union type cases resulting from the type argument given at test.yml:4:16"]
    );
}

#[test]
fn test_redundant_cases_through_alias_chain() {
    let source = r#"
Rec<T>: !record
  fields:
    f: [T, int]
Alias1<T>: Rec<T>
Alias2: Alias1<int>
"#;
    assert_eq!(
        messages(source),
        vec!["redundant union type cases resulting from the type argument given at test.yml:5:16"]
    );
}

#[test]
fn test_null_must_come_first() {
    assert_error(
        "U: [int, null]\n",
        "if null is specified in a union type, it must be the first option",
    );
}

#[test]
fn test_union_cannot_directly_contain_union() {
    assert_error(
        "U: [int, [float, string]]\n",
        "unions may not immediately contain other unions",
    );
}

#[test]
fn test_union_tags_are_assigned() {
    let env = assert_valid("U: [null, int, string]\n");
    let Some(TypeDefinition::Alias(alias)) = env.lookup("Test.U") else {
        panic!("expected an alias");
    };
    let generalized = alias.ty.as_generalized().expect("a union");
    let tags: Vec<&str> = generalized.cases.iter().map(|c| c.tag.as_str()).collect();
    assert_eq!(tags[0], "null");
    assert!(tags[1..].iter().all(|t| !t.is_empty()));
}

// ========================================
// Enums and flags
// ========================================

#[test]
fn test_enum_values_are_assigned() {
    let env = assert_valid("E: !enum\n  values:\n    - a\n    - b\n    - c\n");
    let Some(TypeDefinition::Enum(definition)) = env.lookup("Test.E") else {
        panic!("expected an enum");
    };
    let values: Vec<BigInt> = definition.values.iter().filter_map(|v| v.value.clone()).collect();
    assert_eq!(values, vec![BigInt::from(0), BigInt::from(1), BigInt::from(2)]);
}

#[test]
fn test_flags_values_are_powers_of_two() {
    let env = assert_valid("F: !flags\n  values:\n    - a\n    - b\n    - c\n");
    let Some(TypeDefinition::Enum(definition)) = env.lookup("Test.F") else {
        panic!("expected flags");
    };
    let values: Vec<BigInt> = definition.values.iter().filter_map(|v| v.value.clone()).collect();
    assert_eq!(values, vec![BigInt::from(1), BigInt::from(2), BigInt::from(4)]);
}

#[test]
fn test_enum_duplicate_symbol() {
    assert_error(
        "E: !enum\n  values:\n    - a\n    - b\n    - a\n",
        "in enum 'E', the symbol 'a' is defined more than once",
    );
}

#[test]
fn test_enum_value_out_of_range() {
    let source = r#"
E: !enum
  base: uint8
  values:
    a: 256
"#;
    assert_error(
        source,
        "in enum 'E', the value '256' for symbol 'a' is out of range for the base type 'uint8'",
    );
}

#[test]
fn test_enum_value_beyond_64_bits_is_out_of_range() {
    let source = r#"
E: !enum
  base: uint64
  values:
    a: 18446744073709551616
"#;
    assert_error(
        source,
        "in enum 'E', the value '18446744073709551616' for symbol 'a' is out of range for the base type 'uint64'",
    );
}

#[test]
fn test_enum_base_must_be_integer() {
    let source = r#"
E: !enum
  base: string
  values:
    - a
"#;
    assert_error(source, "in enum 'E', the base type must be an integer type");
}

// ========================================
// Computed fields: members and literals
// ========================================

#[test]
fn test_unbound_computed_field() {
    assert_error(
        "X: !record\n  computedFields:\n    f: missingField\n",
        "record 'X' does not have a field or computed field named 'missingField'",
    );
}

#[test]
fn test_self_referencing_computed_field() {
    assert_error(
        "X: !record\n  computedFields:\n    f: f\n",
        "cycle detected in computed fields: f -> f",
    );
}

#[test]
fn test_computed_field_cycle() {
    let source = r#"
X: !record
  computedFields:
    a: b
    b: c
    c: a
"#;
    let messages = messages(source);
    assert_eq!(messages, vec!["cycle detected in computed fields: a -> b -> c -> a"]);
}

#[test]
fn test_computed_field_chain_without_cycle() {
    let source = r#"
X: !record
  computedFields:
    a: b
    b: c
    c: 9
"#;
    let env = assert_valid(source);
    assert_eq!(computed_primitive(&env, "Test.X", "a"), Some(PrimitiveId::Uint8));
}

#[test]
fn test_integer_literal_too_large() {
    assert_error(
        "X: !record\n  computedFields:\n    a: 0xFFFFFFFFFFFFFFFF1\n",
        "integer literal is too large",
    );
}

#[test]
fn test_decimal_integer_literal_too_large() {
    assert_error(
        "X: !record\n  computedFields:\n    a: 18446744073709551616\n",
        "integer literal is too large",
    );
    assert_error(
        "X: !record\n  computedFields:\n    a: -9223372036854775809\n",
        "integer literal is too large",
    );
}

#[test]
fn test_member_access_through_records() {
    let source = r#"
X: !record
  fields:
    y: Y
  computedFields:
    yInt: y.anInt
Y: !record
  fields:
    anInt: int
"#;
    let env = assert_valid(source);
    assert_eq!(computed_primitive(&env, "Test.X", "yInt"), Some(PrimitiveId::Int32));
}

#[test]
fn test_member_access_target_not_a_record() {
    let source = r#"
X: !record
  fields:
    y: int
  computedFields:
    yInt: y.anInt
"#;
    assert_error(source, "member access target must be a !record type");
}

// ========================================
// Computed fields: arithmetic
// ========================================

#[test]
fn test_literal_arithmetic_folds() {
    let env = assert_valid("X: !record\n  computedFields:\n    c: 1 + 2 * 3\n");
    assert_eq!(folded(&env, "Test.X", "c"), Some(BigInt::from(7)));
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Uint8));
}

#[test]
fn test_division_by_zero() {
    assert_error("X: !record\n  computedFields:\n    c: 1 / 0\n", "division by zero");
}

#[test]
fn test_mixed_operands_widen() {
    let source = r#"
X: !record
  fields:
    a: int
    b: float
  computedFields:
    c: a + b
"#;
    let env = assert_valid(source);
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Float32));
}

#[test]
fn test_negating_unsigned_widens_to_signed() {
    let source = r#"
X: !record
  fields:
    a: uint32
  computedFields:
    c: -a
"#;
    let env = assert_valid(source);
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Int64));
}

#[test]
fn test_non_numeric_operands() {
    let source = r#"
X: !record
  fields:
    s: string
  computedFields:
    c: s + 1
"#;
    assert_error(source, "operator '+' cannot be applied to non-numeric operands");
}

#[test]
fn test_conversion_of_record_is_rejected() {
    let source = r#"
Y: !record
  fields:
    a: int
X: !record
  fields:
    y: Y
  computedFields:
    c: y as int
"#;
    assert_error(source, "cannot convert");
}

#[test]
fn test_unknown_function() {
    assert_error(
        "X: !record\n  computedFields:\n    c: sin(0)\n",
        "unknown function 'sin'",
    );
}

// ========================================
// Computed fields: subscripts
// ========================================

const CONTAINERS: &str = r#"
X: !record
  fields:
    v: int*
    fixed: int*10
    a: int[x:2, y:3]
    b: int[2, 3]
    m: string->int
"#;

fn with_computed(expression: &str) -> String {
    format!("{CONTAINERS}  computedFields:\n    c: {expression}\n")
}

#[test]
fn test_vector_index() {
    let env = assert_valid(&with_computed("v[1]"));
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Int32));
}

#[test]
fn test_vector_index_requires_integral_argument() {
    assert_error(&with_computed(r#"v["1"]"#), "index argument must be an integral type");
}

#[test]
fn test_vector_index_argument_count() {
    assert_error(&with_computed("v[0, 1]"), "vector index must have exactly one argument");
}

#[test]
fn test_fixed_vector_bounds() {
    assert_error(
        &with_computed("fixed[10]"),
        "index argument (10) is too large for the vector of length 10",
    );
}

#[test]
fn test_index_target_must_be_container() {
    let source = r#"
R: !record
  fields:
    a: int
X: !record
  fields:
    r: R
  computedFields:
    c: r[0]
"#;
    assert_error(source, "index target must be a vector, array, or map");
}

#[test]
fn test_labeled_array_index() {
    let env = assert_valid(&with_computed("a[x:1, y:2]"));
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Int32));
}

#[test]
fn test_labeled_array_index_out_of_order() {
    assert_error(
        &with_computed("a[y:1, x:1]"),
        "array index has arguments must be specified in order: x, y",
    );
}

#[test]
fn test_array_index_mixing_labels() {
    assert_error(
        &with_computed("a[x:1, 2]"),
        "array index cannot mix labeled and unlabeled arguments",
    );
}

#[test]
fn test_array_index_missing_dimensions() {
    assert_error(
        &with_computed("a[1]"),
        "array index must provide arguments for all 2 dimensions",
    );
}

#[test]
fn test_array_index_bounds() {
    assert_error(
        &with_computed("b[1, 3]"),
        "index argument (3) is too large for array dimension '1' of length 3",
    );
}

#[test]
fn test_map_lookup() {
    let env = assert_valid(&with_computed(r#"m["k"]"#));
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Int32));
    assert_error(&with_computed("m[1]"), "incorrect map lookup argument type");
}

// ========================================
// Computed fields: builtin functions
// ========================================

#[test]
fn test_size_of_fixed_containers_folds() {
    let env = assert_valid(&with_computed("size(fixed)"));
    assert_eq!(folded(&env, "Test.X", "c"), Some(BigInt::from(10)));
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Size));

    let env = assert_valid(&with_computed("size(a)"));
    assert_eq!(folded(&env, "Test.X", "c"), Some(BigInt::from(6)));
}

#[test]
fn test_size_of_huge_fixed_array_stays_a_call() {
    let source = r#"
X: !record
  fields:
    a: int[18446744073709551615, 18446744073709551615, 18446744073709551615]
    b: int[4294967296, 4294967295]
  computedFields:
    c: size(a)
    d: size(b)
"#;
    let env = assert_valid(source);
    assert_eq!(folded(&env, "Test.X", "c"), None);
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Size));
    assert_eq!(folded(&env, "Test.X", "d"), Some(BigInt::from(18_446_744_069_414_584_320u64)));
}

#[test]
fn test_size_of_dynamic_vector_stays_a_call() {
    let env = assert_valid(&with_computed("size(v)"));
    assert_eq!(folded(&env, "Test.X", "c"), None);
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Size));
}

#[test]
fn test_size_along_dimension() {
    let env = assert_valid(&with_computed(r#"size(a, "y")"#));
    assert_eq!(folded(&env, "Test.X", "c"), Some(BigInt::from(3)));

    let env = assert_valid(&with_computed("size(a, 0)"));
    assert_eq!(folded(&env, "Test.X", "c"), Some(BigInt::from(2)));
}

#[test]
fn test_size_dimension_errors() {
    assert_error(&with_computed("size(a, 2)"), "array dimension index is out of bounds");
    assert_error(
        &with_computed(r#"size(a, "z")"#),
        "this array does not have a dimension named 'z'",
    );
    assert_error(
        &with_computed(r#"size(m, "k")"#),
        "size() does not accept a second argument when called with a !map",
    );
    assert_error(&with_computed("size()"), "size() expects 1 or 2 arguments, but called with 0");
}

#[test]
fn test_dimension_index_and_count() {
    let env = assert_valid(&with_computed(r#"dimensionIndex(a, "y")"#));
    assert_eq!(folded(&env, "Test.X", "c"), Some(BigInt::from(1)));

    let env = assert_valid(&with_computed("dimensionCount(b)"));
    assert_eq!(folded(&env, "Test.X", "c"), Some(BigInt::from(2)));

    assert_error(
        &with_computed(r#"dimensionIndex(b, "x")"#),
        "dimensionIndex() is only valid for arrays with named dimensions",
    );
    assert_error(
        &with_computed("dimensionCount(v)"),
        "dimensionCount() must be called with an !array argument",
    );
}

// ========================================
// Computed fields: switch
// ========================================

fn switch_source(cases: &str) -> String {
    format!(
        "X: !record\n  fields:\n    u: [null, int, float]\n  computedFields:\n    c:\n      !switch u:\n{cases}"
    )
}

#[test]
fn test_switch_common_type() {
    let env = assert_valid(&switch_source("        null: 0\n        int i: i\n        float f: f\n"));
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Float32));
}

#[test]
fn test_switch_with_discard() {
    let env = assert_valid(&switch_source("        int i: i\n        _: 0\n"));
    assert_eq!(computed_primitive(&env, "Test.X", "c"), Some(PrimitiveId::Int32));
}

#[test]
fn test_switch_not_exhaustive() {
    assert_error(
        &switch_source("        null: 0\n        int i: i\n"),
        "switch expression is not exhaustive",
    );
}

#[test]
fn test_switch_unreachable_case() {
    assert_error(
        &switch_source("        null: 0\n        int i: i\n        int j: j\n        float f: f\n"),
        "the switch case is not reachable",
    );
}

#[test]
fn test_switch_invalid_case_type() {
    assert_error(
        &switch_source("        string s: 1\n        _: 0\n"),
        "the type is not a valid case for this switch expression",
    );
}

#[test]
fn test_switch_nothing_left_to_discard() {
    assert_error(
        &switch_source("        null: 0\n        int i: i\n        float f: f\n        _: 1\n"),
        "switch expression has no remaining cases to discard",
    );
}

// ========================================
// Output
// ========================================

#[test]
fn test_diagnostics_are_sorted_and_stable() {
    let source = r#"
X: !record
  fields:
    b: Missing
    a: AlsoMissing
"#;
    let first = messages(source);
    assert_eq!(first, messages(source));
    assert_eq!(first.len(), 2);
    assert!(first[0].contains("Missing"));
    assert!(first[1].contains("AlsoMissing"));
}

#[test]
fn test_protocol_schemas_are_computed() {
    let env = assert_valid("P: !protocol\n  sequence:\n    a: int\n");
    assert!(env.protocol_schema("Test.P").is_some());

    let mut model = Model::new();
    loader::load_str(&mut model, "Test", "test.yml", "P: !protocol\n  sequence:\n    a: int\n").expect("loads");
    let env = Validator::with_options(ValidateOptions::default().with_protocol_schemas(false))
        .validate(model)
        .expect("valid");
    assert!(env.protocol_schema("Test.P").is_none());
}
