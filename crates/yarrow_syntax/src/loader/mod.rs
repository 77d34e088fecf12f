//! YAML model loader.
//!
//! A model source is one or more YAML documents, each a mapping from a type name (optionally with type parameters,
//! `Image<T>`) to a definition. Definitions are added to a [`Model`] namespace in document order, with names left
//! unresolved for the semantic passes.
//!
//! ## Examples
//! ```
//! use yarrow_syntax::ast::Model;
//! use yarrow_syntax::loader;
//!
//! let mut model = Model::new();
//! loader::load_str(&mut model, "Geo", "geo.yml", "Point: !record\n  fields:\n    x: int\n").unwrap();
//! assert_eq!(model.namespace("Geo").map(|ns| ns.types.len()), Some(1));
//! ```

mod locator;
mod value;
mod yaml;

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use locator::{Locator, Segment};

use crate::ast::{Model, SourceLocation};
use crate::diagnostics::Diagnostic;

/// Name of the package manifest, which is never read as a model file.
pub const PACKAGE_FILE_NAME: &str = "_package.yml";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} error(s) in model sources", .0.len())]
    Diagnostics(Vec<Diagnostic>),
}

/// Load every document of one YAML source into `namespace`.
///
/// ## Errors
/// Returns the YAML syntax error or the first conversion error of each document. Documents that convert cleanly are
/// kept even when another document fails.
#[tracing::instrument(skip_all, fields(file = file, namespace = namespace))]
pub fn load_str(model: &mut Model, namespace: &str, file: &str, source: &str) -> Result<(), Vec<Diagnostic>> {
    let file: Arc<str> = Arc::from(file);
    let locator = Locator::new(file.clone(), source);
    let mut errors = Vec::new();

    model.namespace_mut(namespace);
    for (document, deserializer) in serde_yaml::Deserializer::from_str(source).enumerate() {
        let repeated = RefCell::new(None);
        let value = match value::read_document(deserializer, &repeated) {
            Ok(value) => value,
            Err(err) => {
                let location = err
                    .location()
                    .map_or_else(|| SourceLocation::new(file.clone(), 1, 1), |l| {
                        SourceLocation::new(file.clone(), l.line(), l.column())
                    });
                let diagnostic = match repeated.into_inner() {
                    Some(repeat) => repeated_key(&locator, document, &repeat, &location),
                    None => Diagnostic::syntax(err.to_string(), &location),
                };
                errors.push(diagnostic);
                break;
            }
        };

        let mut loader = yaml::DocumentLoader {
            model: &mut *model,
            namespace,
            locator: &locator,
            document,
        };
        if let Err(err) = loader.load(&value) {
            errors.push(err);
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Report a key given twice in one mapping, pointing at the second entry.
///
/// A repeated top-level key is a type defined twice and gets the same message the validator uses for names defined
/// in two files.
fn repeated_key(locator: &Locator, document: usize, repeat: &value::RepeatedKey, fallback: &SourceLocation) -> Diagnostic {
    let occurrences = locator.key_occurrences(document, &repeat.path, &repeat.key);
    let (Some(first), Some(second)) = (occurrences.first(), occurrences.get(1)) else {
        return Diagnostic::syntax(format!("mapping key '{}' is defined more than once", repeat.key), fallback);
    };
    if repeat.path.is_empty() {
        let name = repeat.key.split('<').next().unwrap_or_default().trim();
        Diagnostic::structural(
            format!("the name '{name}' is already defined in file '{}' line '{}'", first.file, first.line),
            second,
        )
    } else {
        Diagnostic::syntax(
            format!("mapping key '{}' is already defined at line {}", repeat.key, first.line),
            second,
        )
    }
}

/// Load all `*.yml` / `*.yaml` files directly inside `dir` (in sorted path order) into `namespace`.
#[tracing::instrument(skip_all, fields(dir = %dir.display(), namespace = namespace))]
pub fn load_dir(model: &mut Model, dir: &Path, namespace: &str) -> Result<(), LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_model_file(path))
        .collect();
    files.sort();
    tracing::debug!(count = files.len(), "model files found");

    let mut errors = Vec::new();
    for path in files {
        let source = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        if let Err(diagnostics) = load_str(model, namespace, &path.display().to_string(), &source) {
            errors.extend(diagnostics);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(LoadError::Diagnostics(errors))
    }
}

fn is_model_file(path: &Path) -> bool {
    let is_yaml = path.extension().is_some_and(|ext| ext == "yml" || ext == "yaml");
    let is_manifest = path.file_name().is_some_and(|name| name == PACKAGE_FILE_NAME);
    is_yaml && !is_manifest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::printer::{expression_tree, type_syntax};

    fn load(source: &str) -> Model {
        let mut model = Model::new();
        load_str(&mut model, "Test", "t.yml", source).unwrap_or_else(|e| panic!("should load: {e:?}"));
        model
    }

    fn load_err(source: &str) -> Diagnostic {
        let mut model = Model::new();
        let mut errors = load_str(&mut model, "Test", "t.yml", source).expect_err("should fail");
        errors.remove(0)
    }

    fn definition<'m>(model: &'m Model, name: &str) -> &'m TypeDefinition {
        let ns = model.namespace("Test").expect("namespace exists");
        ns.types
            .iter()
            .chain(&ns.protocols)
            .map(|id| model.definition(*id))
            .find(|d| d.name() == name)
            .unwrap_or_else(|| panic!("no definition '{name}'"))
    }

    fn alias_syntax(model: &Model, name: &str) -> String {
        match definition(model, name) {
            TypeDefinition::Alias(alias) => type_syntax(&alias.ty, true),
            other => panic!("expected an alias, got {}", other.kind_label()),
        }
    }

    #[test]
    fn test_record_fields_and_comments() {
        let model = load(
            "\
# A point in space
Point<T>: !record
  fields:
    # the x coordinate
    x: T
    y: T?
  computedFields:
    sum: x + y
",
        );
        let TypeDefinition::Record(record) = definition(&model, "Point") else {
            panic!("expected a record");
        };
        assert_eq!(record.meta.comment, "A point in space");
        assert_eq!(record.meta.type_parameters.len(), 1);
        assert_eq!(record.fields[0].comment, "the x coordinate");
        assert_eq!(record.fields[1].location, SourceLocation::new("t.yml", 6, 5));
        assert_eq!(type_syntax(&record.fields[1].ty, true), "T?");
        assert_eq!(expression_tree(&record.computed_fields[0].expression), "(+ x y)");
    }

    #[test]
    fn test_enums_and_flags() {
        let model = load(
            "\
Fruit: !enum
  values:
    - apple
    - banana
Perm: !flags
  base: uint8
  values:
    read: 1
    write:
",
        );
        let TypeDefinition::Enum(fruit) = definition(&model, "Fruit") else {
            panic!("expected an enum");
        };
        assert!(!fruit.is_flags);
        assert_eq!(fruit.values.len(), 2);
        assert!(fruit.values.iter().all(|v| v.value.is_none()));

        let TypeDefinition::Enum(perm) = definition(&model, "Perm") else {
            panic!("expected flags");
        };
        assert!(perm.is_flags);
        assert_eq!(perm.values[0].value, Some(1.into()));
        assert_eq!(perm.values[1].value, None);
        assert!(perm.base.is_some());
    }

    #[test]
    fn test_container_tags() {
        let model = load(
            "\
V: !vector
  items: int
  length: 3
A: !array
  items: float
  dimensions:
    x: 2
    y: 3
N: !array
  items: float
  dimensions: 2
M: !map
  keys: string
  values: [int, float]
U: !union
  one: int
  two: string
O: [null, int]
G: !generic
  name: Image
  args: [int, float]
",
        );
        assert_eq!(alias_syntax(&model, "V"), "int*3");
        assert_eq!(alias_syntax(&model, "A"), "float[x:2, y:3]");
        assert_eq!(alias_syntax(&model, "N"), "float[,]");
        assert_eq!(alias_syntax(&model, "M"), "string->(int | float)");
        assert_eq!(alias_syntax(&model, "U"), "one: int | two: string");
        assert_eq!(alias_syntax(&model, "O"), "int?");
        assert_eq!(alias_syntax(&model, "G"), "Image<int, float>");
    }

    #[test]
    fn test_protocols_are_routed_separately() {
        let model = load("P: !protocol\n  sequence:\n    a: int\n    b: !stream\n      items: int\n");
        let ns = model.namespace("Test").expect("namespace exists");
        assert!(ns.types.is_empty());
        let TypeDefinition::Protocol(protocol) = definition(&model, "P") else {
            panic!("expected a protocol");
        };
        assert!(protocol.sequence[1].is_stream());
    }

    #[test]
    fn test_recursive_marker() {
        let model = load("L: !record\n  fields:\n    next: [null, !recursive L]\n");
        let TypeDefinition::Record(record) = definition(&model, "L") else {
            panic!("expected a record");
        };
        let Type::Generalized(optional) = &record.fields[0].ty else {
            panic!("expected an optional");
        };
        let Some(Type::Simple(inner)) = &optional.cases[1].ty else {
            panic!("expected a simple type");
        };
        assert!(inner.is_recursive);
    }

    #[test]
    fn test_switch_computed_field() {
        let model = load(
            "\
R: !record
  fields:
    u: [null, int, string]
  computedFields:
    c:
      !switch u:
        int i: i
        string: 1
        null: 0
",
        );
        let TypeDefinition::Record(record) = definition(&model, "R") else {
            panic!("expected a record");
        };
        assert_eq!(
            expression_tree(&record.computed_fields[0].expression),
            "(switch u (int i i) (string 1) (null 0))"
        );
    }

    #[test]
    fn test_multiple_documents() {
        let model = load("A: int\n---\nB: string\n");
        assert_eq!(model.namespace("Test").map(|ns| ns.types.len()), Some(2));
    }

    #[test]
    fn test_loader_errors() {
        assert_eq!(load_err("- a\n- b\n").message, "expected a mapping from <typename>: <type definition>");
        assert_eq!(load_err("R: !record\n  fields: [a]\n").message, "expected field map");
        assert_eq!(
            load_err("R: !record\n  fields:\n    a:\n").message,
            "a field or protocol step cannot be null"
        );
        assert_eq!(
            load_err("R: !record\n  computedFields:\n    a:\n").message,
            "An expression cannot be null"
        );
        assert_eq!(
            load_err("R: !record\n  computedFields:\n    a:\n      x: 1\n").message,
            "expected a !switch expression"
        );
        assert_eq!(
            load_err("R: !record\n  computedFields: [a]\n").message,
            "expected computed fields to be a map"
        );
        assert_eq!(load_err("E: !enum\n  values:\n    a: x\n").message, "enum value must be an integer");
        assert_eq!(
            load_err("R: !record\n  bogus: 1\n").message,
            "field 'bogus' is not valid on a !record specification"
        );
    }

    #[test]
    fn test_error_locations() {
        let err = load_err("R: !record\n  fields:\n    a: int<\n");
        assert_eq!(err.location.as_ref().map(|l| l.line), Some(3));
        let err = load_err("R: !record\n  fields:\n    a: !vector\n      length: -1\n      items: int\n");
        assert_eq!(err.message, "vector length cannot be negative");
        assert_eq!(err.location, Some(SourceLocation::new("t.yml", 4, 15)));
    }

    #[test]
    fn test_integers_beyond_64_bits() {
        let model = load(
            "\
E: !enum
  base: uint64
  values:
    a: 18446744073709551616
R: !record
  computedFields:
    big: 18446744073709551616
    low: -9223372036854775809
",
        );
        let TypeDefinition::Enum(e) = definition(&model, "E") else {
            panic!("expected an enum");
        };
        let expected: num_bigint::BigInt = "18446744073709551616".parse().unwrap();
        assert_eq!(e.values[0].value, Some(expected));

        let TypeDefinition::Record(record) = definition(&model, "R") else {
            panic!("expected a record");
        };
        assert_eq!(expression_tree(&record.computed_fields[0].expression), "18446744073709551616");
        assert_eq!(expression_tree(&record.computed_fields[1].expression), "-9223372036854775809");

        let err = load_err("V: !vector\n  items: int\n  length: 18446744073709551616\n");
        assert_eq!(err.message, "integer out of range");
    }

    #[test]
    fn test_repeated_keys() {
        let err = load_err("A: int\nB: string\nA: float\n");
        assert_eq!(err.message, "the name 'A' is already defined in file 't.yml' line '1'");
        assert_eq!(err.location, Some(SourceLocation::new("t.yml", 3, 1)));

        let err = load_err("Box<T>: T\nBox<T>: T?\n");
        assert_eq!(err.message, "the name 'Box' is already defined in file 't.yml' line '1'");

        let err = load_err("R: !record\n  fields:\n    x: int\n    x: float\n");
        assert_eq!(err.message, "mapping key 'x' is already defined at line 3");
        assert_eq!(err.location, Some(SourceLocation::new("t.yml", 4, 5)));
    }

    #[test]
    fn test_package_manifest_is_not_a_model_file() {
        assert!(is_model_file(Path::new("a/b.yml")));
        assert!(is_model_file(Path::new("a/b.yaml")));
        assert!(!is_model_file(Path::new("a/_package.yml")));
        assert!(!is_model_file(Path::new("a/readme.md")));
    }
}
