//! Semantic validation of a loaded model.
//!
//! The [`Validator`] runs a fixed, ordered list of passes over one shared mutable [`Model`]. Each pass walks the
//! tree, may rewrite definitions in their arena slots, and pushes diagnostics into a single [`DiagnosticSink`].
//! A model that leaves the sink empty becomes an [`Environment`].
//!
//! ## Notes
//!
//! - **Error accumulation**: passes never stop the run. Passes whose input would be unsafe after earlier failures
//!   (deep instantiation, union validation, computed fields, unused generic parameters) check the sink and skip.
//! - **Order matters**: names are resolved before maps are validated so alias chains can be followed, and tags are
//!   assigned before the cycle check so instances inherit them.
//!
//! ## What is validated
//!
//! - Type, field, computed-field, protocol-step, enum-symbol and dimension names follow the naming conventions
//! - Every referenced type is known, is not a protocol, and receives the right number of type arguments
//! - `!recursive` markers only mark a definition's reference to itself
//! - Arrays, maps and streams are well formed
//! - Type definitions have no illegal reference cycles
//! - Union cases are distinct, correctly ordered and tagged
//! - Enum and flags values are unique and fit their base type
//! - Computed-field expressions type check
//! - Generic type parameters are used
//!
//! ## Examples
//!
//! ```ignore
//! use yarrow::frontend::{ast::Model, loader, validation::Validator};
//!
//! let mut model = Model::new();
//! loader::load_str(&mut model, "Demo", "demo.yml", "Point: !record\n  fields:\n    x: int\n")?;
//! let env = Validator::new().validate(model)?;
//! assert!(env.lookup("Demo.Point").is_some());
//! ```

mod computed;
mod dimensions;
mod enums;
mod names;
mod resolve;
mod topo;
mod unions;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use crate::config::ValidateOptions;
use crate::frontend::ast::{DefId, Model};
use crate::frontend::diagnostics::{Diagnostic, DiagnosticSink};
use crate::frontend::environment::Environment;
use crate::frontend::generics::Instantiator;
use crate::frontend::schema;
use crate::frontend::symbols::SymbolTable;

/// Mutable state shared by every pass of one run.
pub(crate) struct PassContext {
    pub model: Model,
    pub symbols: SymbolTable,
    pub sink: DiagnosticSink,
    pub instantiator: Instantiator,
}

impl PassContext {
    fn new(model: Model) -> Self {
        Self {
            model,
            symbols: SymbolTable::new(),
            sink: DiagnosticSink::new(),
            instantiator: Instantiator::new(),
        }
    }

    /// Ids of every namespace-level definition: each namespace's types, then its protocols.
    pub fn definition_ids(&self) -> Vec<DefId> {
        self.model
            .namespaces
            .iter()
            .flat_map(|ns| ns.types.iter().chain(&ns.protocols).copied())
            .collect()
    }
}

type Pass = fn(&mut PassContext);

/// Every pass, in execution order.
const PASSES: &[(&str, Pass)] = &[
    ("validate_type_definition_names", names::validate_type_definition_names),
    ("validate_generic_type_definitions", names::validate_generic_type_definitions),
    ("validate_record_field_names", names::validate_record_field_names),
    ("validate_protocol_sequence_names", names::validate_protocol_sequence_names),
    ("validate_array_and_vector_dimensions", dimensions::validate_array_and_vector_dimensions),
    ("validate_streams", dimensions::validate_streams),
    ("build_symbol_table", resolve::build_symbol_table),
    ("resolve_types", resolve::resolve_types),
    ("validate_maps", dimensions::validate_maps),
    ("assign_union_case_tags", unions::assign_union_case_tags),
    ("topological_sort_types", topo::topological_sort_types),
    ("convert_generic_references", resolve::convert_generic_references),
    ("validate_union_cases", unions::validate_union_cases),
    ("validate_enums", enums::validate_enums),
    ("resolve_computed_fields", computed::resolve_computed_fields),
    ("validate_generic_parameters_used", names::validate_generic_parameters_used),
];

/// Runs the validation passes.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    options: ValidateOptions,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidateOptions) -> Self {
        Self { options }
    }

    /// Validate `model`, consuming it.
    ///
    /// ## Returns
    /// The [`Environment`] when no pass reported a problem.
    ///
    /// ## Errors
    /// Every diagnostic of the run, sorted by file, line, column and message.
    #[tracing::instrument(skip_all, fields(namespaces = model.namespaces.len()))]
    pub fn validate(&self, model: Model) -> Result<Environment, Vec<Diagnostic>> {
        let mut cx = PassContext::new(model);
        for (name, pass) in PASSES {
            pass(&mut cx);
            tracing::debug!(pass = name, errors = cx.sink.error_count(), "pass finished");
        }

        if cx.sink.has_errors() {
            return Err(cx.sink.into_sorted());
        }

        let mut schemas = BTreeMap::new();
        if self.options.protocol_schemas {
            for namespace in &cx.model.namespaces {
                for id in &namespace.protocols {
                    match schema::protocol_schema(&cx.model, *id) {
                        Ok(schema) => {
                            schemas.insert(cx.model.qualified_name(*id), schema);
                        }
                        Err(err) => {
                            let location = cx.model.definition(*id).location();
                            return Err(vec![Diagnostic::internal(
                                format!("unable to serialize protocol schema: {err}"),
                                location,
                            )]);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            definitions = cx.model.len(),
            instances = cx.instantiator.instance_count(),
            "model validated"
        );
        Ok(Environment::new(cx.model, cx.symbols, schemas))
    }
}

/// Validate `model` with default options.
pub fn validate(model: Model) -> Result<Environment, Vec<Diagnostic>> {
    Validator::new().validate(model)
}
