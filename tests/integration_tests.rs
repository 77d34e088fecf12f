//! Integration tests for the yarrow front end

use std::path::Path;

use yarrow::ast::{Model, TypeDefinition};
use yarrow::config::{self, ConfigError};
use yarrow::diagnostics::Diagnostic;
use yarrow::frontend::{loader, typefns};
use yarrow::{Environment, validate};
use yarrow_core::lang::primitives::PrimitiveId;

/// Helper to run the full pipeline on one in-memory model file
fn validate_source(source: &str) -> Result<Environment, Vec<Diagnostic>> {
    let mut model = Model::new();
    loader::load_str(&mut model, "Test", "test.yml", source)?;
    validate(model)
}

fn error_messages(source: &str) -> Vec<String> {
    match validate_source(source) {
        Ok(_) => panic!("expected validation to fail"),
        Err(errors) => errors.into_iter().map(|e| e.message).collect(),
    }
}

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/packages").join(name)
}

fn validate_fixture(name: &str) -> Environment {
    let packages = config::load_package(&fixture(name)).expect("package loads");
    let model = packages.load_model().expect("model files load");
    match validate(model) {
        Ok(env) => env,
        Err(errors) => panic!("expected {name} to validate, got {errors:#?}"),
    }
}

fn computed_type(env: &Environment, record: &str, field: &str) -> Option<PrimitiveId> {
    let Some(TypeDefinition::Record(definition)) = env.lookup(record) else {
        panic!("'{record}' is not a record");
    };
    let field = definition.computed_fields.iter().find(|f| f.name == field)?;
    let ty = field.expression.resolved_type.as_ref()?;
    typefns::primitive_of(env.model(), ty)
}

/// Package fixtures on disk
mod package_tests {
    use super::*;

    #[test]
    fn test_imported_packages_validate_together() {
        let env = validate_fixture("imaging");
        assert!(env.namespace("Geometry").is_some());
        assert!(env.namespace("Imaging").is_some());
        assert!(env.lookup("Imaging.Frame").is_some());
        assert!(env.lookup("Geometry.Rect").is_some());
    }

    #[test]
    fn test_types_follow_their_dependencies() {
        let env = validate_fixture("imaging");
        let names: Vec<&str> = env.types("Imaging").map(|d| d.name()).collect();
        let position = |name: &str| names.iter().position(|n| *n == name).expect("type present");
        assert!(position("Kind") < position("Header"));
        assert!(position("Header") < position("Frame"));
        assert!(position("Image") < position("Frame"));
    }

    #[test]
    fn test_computed_fields_are_typed() {
        let env = validate_fixture("imaging");
        assert_eq!(computed_type(&env, "Geometry.Rect", "area"), Some(PrimitiveId::Float32));
        assert_eq!(computed_type(&env, "Geometry.Rect", "right"), Some(PrimitiveId::Float32));
        assert_eq!(computed_type(&env, "Imaging.Frame", "width"), Some(PrimitiveId::Size));
        assert_eq!(computed_type(&env, "Imaging.Frame", "pixelCount"), Some(PrimitiveId::Size));
        assert_eq!(computed_type(&env, "Imaging.Frame", "firstLabel"), Some(PrimitiveId::String));
    }

    #[test]
    fn test_fixed_vector_size_folds() {
        let env = validate_fixture("imaging");
        let Some(TypeDefinition::Record(frame)) = env.lookup("Imaging.Frame") else {
            panic!("Frame is a record");
        };
        let count = frame.computed_fields.iter().find(|f| f.name == "labelCount").expect("labelCount");
        assert_eq!(count.expression.as_integer_literal().map(ToString::to_string), Some("4".to_string()));

        let pixels = frame.computed_fields.iter().find(|f| f.name == "pixelCount").expect("pixelCount");
        assert!(pixels.expression.as_integer_literal().is_none());
    }

    #[test]
    fn test_protocol_schema_lists_referenced_types_in_order() {
        let env = validate_fixture("imaging");
        let schema = env.protocol_schema("Imaging.Capture").expect("schema computed");
        assert!(schema.starts_with(r#"{"protocol":{"name":"Capture","sequence":["#));

        let order = [
            r#"{"record":{"name":"Point""#,
            r#"{"record":{"name":"Rect""#,
            r#"{"alias":{"name":"Shape""#,
            r#"{"record":{"name":"Frame""#,
            r#"{"record":{"name":"Header""#,
            r#"{"alias":{"name":"Image""#,
            r#"{"enum":{"name":"Kind""#,
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| schema.find(needle).unwrap_or_else(|| panic!("{needle} missing from {schema}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "unexpected order in {schema}");
        assert!(!schema.contains("area"), "computed fields are not part of the schema");
    }

    #[test]
    fn test_import_cycle_is_rejected() {
        let err = config::load_package(&fixture("cyclic_a")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref message, .. } if message == "import cycle detected"));
    }
}

/// Whole-model properties over inline sources
mod model_tests {
    use super::*;

    #[test]
    fn test_alias_transparency() {
        let env = validate_source("X: [int, string]\nY: X\n").expect("valid");
        let (Some(TypeDefinition::Alias(x)), Some(TypeDefinition::Alias(y))) =
            (env.lookup("Test.X"), env.lookup("Test.Y"))
        else {
            panic!("X and Y are aliases");
        };
        assert!(typefns::types_equal(env.model(), &y.ty, &x.ty));
    }

    #[test]
    fn test_unmarked_cycle_reports_the_path() {
        let source = "A: !record\n  fields:\n    b: B\nB: !record\n  fields:\n    a: A\n";
        let messages = error_messages(source);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("reference cycle"));
        assert!(messages[0].contains("Field 'b' -> Record 'B' -> Field 'a'"), "{}", messages[0]);
    }

    #[test]
    fn test_marked_generic_self_reference_is_allowed() {
        let source = "Tree<T>: !record\n  fields:\n    value: T\n    children: !vector\n      items: !recursive Tree<T>\nForest: Tree<int>*\n";
        assert!(validate_source(source).is_ok());
    }

    #[test]
    fn test_enum_value_out_of_range_for_base() {
        let source = "X: !enum\n  base: int8\n  values:\n    a: -129\n";
        let messages = error_messages(source);
        assert!(messages.iter().any(|m| m.contains("out of range for the base type")), "{messages:#?}");
    }

    #[test]
    fn test_fixed_vector_index_out_of_bounds() {
        let source = "R: !record\n  fields:\n    y: !vector\n      items: int\n      length: 10\n  computedFields:\n    y1: y[10]\n";
        let messages = error_messages(source);
        assert!(
            messages.contains(&"index argument (10) is too large for the vector of length 10".to_string()),
            "{messages:#?}"
        );
    }

    #[test]
    fn test_redundant_cases_from_type_arguments() {
        let source = "R<T>: !record\n  fields:\n    t: T\nX: [R<int>, R<int>]\n";
        let messages = error_messages(source);
        assert!(messages.iter().any(|m| m.starts_with("redundant union type cases")), "{messages:#?}");
    }

    #[test]
    fn test_switch_must_be_exhaustive() {
        let source = "R: !record\n  fields:\n    u: [int, float, string]\n  computedFields:\n    v:\n      !switch u:\n        int i: i\n        float f: f\n";
        let messages = error_messages(source);
        assert!(messages.contains(&"switch expression is not exhaustive".to_string()), "{messages:#?}");
    }

    #[test]
    fn test_errors_from_several_passes_are_all_reported() {
        let source = "badName: int\nR: !record\n  fields:\n    x: Missing\n";
        let messages = error_messages(source);
        assert_eq!(messages.len(), 2, "{messages:#?}");
    }
}
