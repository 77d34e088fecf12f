//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::Path;

use crate::config::{self, ValidateOptions};
use crate::frontend::ast::SourceLocation;
use crate::frontend::environment::Environment;
use crate::frontend::loader::LoadError;
use crate::frontend::validation::Validator;
use crate::frontend::{parser, printer};

use super::report::{RenderMode, render_diagnostics};
use super::{CliError, CliResult, ExitCode};

// ============================================================================
// Package loading (shared between validate and schema)
// ============================================================================

/// Read the package in `dir` with its imports, load every model file and validate the result.
fn load_environment(dir: &Path, options: ValidateOptions, mode: RenderMode) -> CliResult<Environment> {
    let packages = config::load_package(dir).map_err(|e| CliError::failure(format!("Error: {e}")))?;
    let model = match packages.load_model() {
        Ok(model) => model,
        Err(LoadError::Diagnostics(mut diagnostics)) => {
            crate::frontend::diagnostics::sort_diagnostics(&mut diagnostics);
            return Err(CliError::failure(render_diagnostics(&diagnostics, mode)));
        }
        Err(err) => return Err(CliError::failure(format!("Error: {err}"))),
    };

    Validator::with_options(options)
        .validate(model)
        .map_err(|diagnostics| CliError::failure(render_diagnostics(&diagnostics, mode)))
}

/// Validate a package and report every problem found.
pub fn validate_package(dir: &Path, mode: RenderMode) -> CliResult<ExitCode> {
    let options = ValidateOptions::new().with_protocol_schemas(false);
    let env = load_environment(dir, options, mode)?;

    let definitions: usize = env
        .namespaces()
        .iter()
        .map(|ns| ns.types.len() + ns.protocols.len())
        .sum();
    println!(
        "✓ Model is valid ({} namespace(s), {definitions} definition(s))",
        env.namespaces().len()
    );
    Ok(ExitCode::SUCCESS)
}

/// Print protocol schema strings. With `protocol`, print only that schema.
pub fn print_schemas(dir: &Path, protocol: Option<&str>, mode: RenderMode) -> CliResult<ExitCode> {
    let env = load_environment(dir, ValidateOptions::new(), mode)?;

    if let Some(name) = protocol {
        let qualified = if name.contains('.') {
            name.to_string()
        } else {
            env.namespaces()
                .last()
                .map_or_else(|| name.to_string(), |ns| format!("{}.{name}", ns.name))
        };
        let Some(schema) = env.protocol_schema(&qualified) else {
            return Err(CliError::failure(format!("Error: no protocol named '{name}'")));
        };
        println!("{schema}");
        return Ok(ExitCode::SUCCESS);
    }

    for (name, schema) in env.protocol_schemas() {
        println!("{name}");
        println!("{schema}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse a type string and print its normalized spelling and tree.
pub fn check_type(text: &str) -> CliResult<ExitCode> {
    let location = SourceLocation::new("<type>", 1, 1);
    match parser::parse_type(text, &location) {
        Ok(ty) => {
            println!("{}", printer::type_syntax(&ty, true));
            println!("{ty:#?}");
            Ok(ExitCode::SUCCESS)
        }
        Err(diagnostics) => Err(CliError::failure(render_diagnostics(&diagnostics, RenderMode::Plain))),
    }
}

/// Parse a computed-field expression and print its tree.
pub fn check_expr(text: &str) -> CliResult<ExitCode> {
    let location = SourceLocation::new("<expr>", 1, 1);
    match parser::parse_expression(text, &location) {
        Ok(expression) => {
            println!("{}", printer::expression_tree(&expression));
            Ok(ExitCode::SUCCESS)
        }
        Err(diagnostics) => Err(CliError::failure(render_diagnostics(&diagnostics, RenderMode::Plain))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    fn package(model: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_package.yml"), "namespace: Demo\n").unwrap();
        fs::write(dir.path().join("model.yml"), model).unwrap();
        dir
    }

    #[test]
    fn test_validate_valid_package() {
        let dir = package("Point: !record\n  fields:\n    x: int\n");
        assert_eq!(validate_package(dir.path(), RenderMode::Plain).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_validate_reports_sorted_plain_diagnostics() {
        let dir = package("Point: !record\n  fields:\n    x: Nope\n    y: Missing\n");
        let err = validate_package(dir.path(), RenderMode::Plain).unwrap_err();
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        let lines: Vec<&str> = err.message.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("the type 'Nope' is not recognized"));
        assert!(lines[1].ends_with("the type 'Missing' is not recognized"));
        assert_eq!(lines[2], "2 errors");
    }

    #[test]
    fn test_missing_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_package(dir.path(), RenderMode::Plain).unwrap_err();
        assert!(err.message.contains("_package.yml"));
    }

    #[test]
    fn test_unknown_protocol() {
        let dir = package("P: !protocol\n  sequence:\n    a: int\n");
        assert!(print_schemas(dir.path(), Some("P"), RenderMode::Plain).is_ok());
        let err = print_schemas(dir.path(), Some("Q"), RenderMode::Plain).unwrap_err();
        assert_eq!(err.message, "Error: no protocol named 'Q'");
    }

    #[test]
    fn test_check_type_and_expr() {
        assert!(check_type("int?*").is_ok());
        assert!(check_type("int<").is_err());
        assert!(check_expr("size(a) + 1").is_ok());
        assert!(check_expr("1 +").is_err());
    }
}
