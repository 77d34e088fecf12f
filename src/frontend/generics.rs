//! Generic type instantiation.
//!
//! [`Instantiator::instantiate`] specializes a generic definition for concrete type arguments by rewriting a copy of
//! its body, replacing every leaf that refers to one of its parameters with the matching argument. The copy is a new
//! arena entry whose meta records the arguments and the generic it came from.
//!
//! ## Notes
//! - [`Mode::Shallow`] only substitutes the definition's own parameter leaves. Nested generic references keep their
//!   current target, so a definition that refers to itself is never expanded. Resolution uses this mode before the
//!   model is known to be free of illegal cycles.
//! - [`Mode::Deep`] also re-instantiates every nested generic reference from its origin with substituted arguments.
//!   Deep instances are memoized by `(origin, argument key)`, and the slot of an instance is reserved before its
//!   body is rewritten, so a sanctioned self-reference resolves to the instance under construction.
//! - Substituted arguments keep their own source locations. Union validation relies on this to tell a duplicate
//!   written in a generic body from one introduced by a type argument.

use std::collections::HashMap;
use std::fmt::Write as _;

use yarrow_core::lang::primitives;

use crate::frontend::ast::*;
use crate::frontend::diagnostics::Diagnostic;
use crate::frontend::typefns;
use crate::frontend::walk::rewriter::{self, Rewriter};

/// Nested deep instantiations beyond this depth are rejected as non-terminating.
const MAX_INSTANTIATION_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Shallow,
    Deep,
}

#[derive(Debug, Default)]
pub struct Instantiator {
    memo: HashMap<(DefId, String), DefId>,
    depth: usize,
}

impl Instantiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized deep instances.
    pub fn instance_count(&self) -> usize {
        self.memo.len()
    }

    /// Instantiate `generic` with `arguments`.
    ///
    /// ## Returns
    /// The id of the instance. In deep mode, arguments that are exactly the generic's own parameters return
    /// `generic` itself.
    ///
    /// ## Errors
    /// - An internal diagnostic when the argument count is wrong or a parameter leaf cannot be matched. Resolution
    ///   reports a wrong argument count to the user ("'X' was given N type argument(s) but has M type
    ///   parameter(s)") and never instantiates such a reference, so reaching either case here means the model and
    ///   the symbol table disagree.
    /// - A structural diagnostic when deep instantiation does not terminate.
    pub fn instantiate(
        &mut self,
        model: &mut Model,
        generic: DefId,
        arguments: Vec<Type>,
        mode: Mode,
    ) -> Result<DefId, Diagnostic> {
        let definition = model.definition(generic);
        let parameters = definition.type_parameters().to_vec();
        if parameters.len() != arguments.len() {
            return Err(Diagnostic::internal(
                "incorrect number of type arguments given",
                definition.location(),
            ));
        }

        match mode {
            Mode::Shallow => {
                let instance = instance_shell(definition, generic, &arguments);
                let mut substitution = Substitution {
                    instantiator: self,
                    bindings: Some((parameters, arguments)),
                    mode,
                    errors: Vec::new(),
                };
                let body = substitution.rewrite_definition(model, &instance).unwrap_or(instance);
                first_error(substitution.errors)?;
                Ok(model.push(body))
            }
            Mode::Deep => self.instantiate_deep(model, generic, parameters, arguments),
        }
    }

    fn instantiate_deep(
        &mut self,
        model: &mut Model,
        generic: DefId,
        parameters: Vec<DefId>,
        arguments: Vec<Type>,
    ) -> Result<DefId, Diagnostic> {
        if is_identity(model, &parameters, &arguments) {
            return Ok(generic);
        }

        let key = (generic, arguments_key(model, &arguments));
        if let Some(id) = self.memo.get(&key) {
            return Ok(*id);
        }

        let definition = model.definition(generic);
        if self.depth >= MAX_INSTANTIATION_DEPTH {
            let location = definition.location().cloned().unwrap_or_else(SourceLocation::builtin);
            return Err(Diagnostic::structural(
                format!(
                    "instantiating '{}' does not terminate: type arguments keep growing",
                    definition.name()
                ),
                &location,
            ));
        }

        let shell = instance_shell(definition, generic, &arguments);
        let id = model.push(shell.clone());
        self.memo.insert(key, id);
        tracing::trace!(generic = %model.qualified_name(generic), instance = id.0, "deep instance reserved");

        self.depth += 1;
        let mut substitution = Substitution {
            instantiator: self,
            bindings: Some((parameters, arguments)),
            mode: Mode::Deep,
            errors: Vec::new(),
        };
        let body = substitution.rewrite_definition(model, &shell);
        let errors = std::mem::take(&mut substitution.errors);
        self.depth -= 1;

        if let Some(body) = body {
            model.replace(id, body);
        }
        first_error(errors)?;
        Ok(id)
    }

    /// Rewrite every generic reference inside the definition at `id` to point at a deep instance.
    ///
    /// Parameter leaves of the definition's own parameters are left in place.
    pub fn convert_references(&mut self, model: &mut Model, id: DefId) -> Vec<Diagnostic> {
        let mut substitution = Substitution {
            instantiator: self,
            bindings: None,
            mode: Mode::Deep,
            errors: Vec::new(),
        };
        rewriter::rewrite_in_place(&mut substitution, model, id);
        substitution.errors
    }
}

/// A copy of `definition` recording the arguments and the generic it is instantiated from.
fn instance_shell(definition: &TypeDefinition, generic: DefId, arguments: &[Type]) -> TypeDefinition {
    let mut shell = definition.clone();
    if let Some(meta) = shell.meta_mut() {
        meta.type_arguments = arguments.to_vec();
        meta.origin = Some(generic);
    }
    shell
}

fn first_error(errors: Vec<Diagnostic>) -> Result<(), Diagnostic> {
    match errors.into_iter().next() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Whether `arguments` are exactly the parameter leaves of `parameters`, in order.
fn is_identity(model: &Model, parameters: &[DefId], arguments: &[Type]) -> bool {
    parameters.iter().zip(arguments).all(|(parameter, argument)| {
        matches!(
            argument,
            Type::Simple(SimpleType { resolved: Some(id), type_arguments, .. })
                if id == parameter && type_arguments.is_empty()
        ) && matches!(model.definition(*parameter), TypeDefinition::Parameter(_))
    })
}

/// Canonical text for an argument list: equal keys mean the arguments resolve to the same definitions.
pub fn arguments_key(model: &Model, arguments: &[Type]) -> String {
    let mut key = String::new();
    for argument in arguments {
        write_type_key(model, argument, &mut key);
        key.push(';');
    }
    key
}

fn write_type_key(model: &Model, ty: &Type, out: &mut String) {
    match ty {
        Type::Simple(simple) => {
            match simple.resolved {
                Some(id) => match model.definition(id).as_primitive() {
                    Some(primitive) => out.push_str(primitives::as_str(primitive)),
                    None => {
                        let _ = write!(out, "#{}", id.0);
                    }
                },
                None => out.push_str(&simple.name),
            }
            if !simple.type_arguments.is_empty() {
                out.push('<');
                for argument in &simple.type_arguments {
                    write_type_key(model, argument, out);
                    out.push(',');
                }
                out.push('>');
            }
        }
        Type::Generalized(generalized) => {
            out.push('(');
            for case in &generalized.cases {
                match &case.ty {
                    Some(ty) => write_type_key(model, ty, out),
                    None => out.push_str("null"),
                }
                if case.explicit_tag {
                    let _ = write!(out, "@{}", case.tag);
                }
                out.push('|');
            }
            out.push(')');
            match &generalized.dimensionality {
                None => {}
                Some(Dimensionality::Vector { length, .. }) => {
                    let _ = write!(out, "*{}", length.map(|l| l.to_string()).unwrap_or_default());
                }
                Some(Dimensionality::Array { dimensions, .. }) => {
                    out.push('[');
                    for dimension in dimensions.iter().flatten() {
                        let _ = write!(
                            out,
                            "{}:{},",
                            dimension.name.as_deref().unwrap_or_default(),
                            dimension.length.map(|l| l.to_string()).unwrap_or_default()
                        );
                    }
                    out.push(']');
                }
                Some(Dimensionality::Map { key_type, .. }) => {
                    out.push_str("->");
                    write_type_key(model, key_type, out);
                }
                Some(Dimensionality::Stream { .. }) => out.push_str("!stream"),
            }
        }
    }
}

/// Rewriter that substitutes parameter leaves and, in deep mode, re-instantiates nested generic references.
struct Substitution<'i> {
    instantiator: &'i mut Instantiator,
    /// Parameters and their arguments; `None` leaves parameter leaves untouched.
    bindings: Option<(Vec<DefId>, Vec<Type>)>,
    mode: Mode,
    errors: Vec<Diagnostic>,
}

impl Substitution<'_> {
    fn substitute_parameter(&mut self, simple: &SimpleType, parameter: DefId) -> Option<Type> {
        let (parameters, arguments) = self.bindings.as_ref()?;
        match parameters.iter().position(|p| *p == parameter) {
            Some(index) => Some(arguments[index].clone()),
            None => {
                self.errors.push(Diagnostic::internal(
                    "internal error: unable to substitute generic type parameter",
                    Some(&simple.location),
                ));
                None
            }
        }
    }
}

impl Rewriter for Substitution<'_> {
    fn rewrite_type(&mut self, model: &mut Model, ty: &Type) -> Option<Type> {
        let Type::Simple(simple) = ty else {
            return rewriter::rewrite_type_children(self, model, ty);
        };
        let target = simple.resolved?;
        if matches!(model.definition(target), TypeDefinition::Parameter(_)) {
            return self.substitute_parameter(simple, target);
        }

        let new_arguments = rewriter::rewrite_list(&simple.type_arguments, |arg| self.rewrite_type(model, arg));
        if self.mode == Mode::Shallow || simple.type_arguments.is_empty() {
            return new_arguments.map(|type_arguments| {
                Type::Simple(SimpleType {
                    type_arguments,
                    ..simple.clone()
                })
            });
        }

        let changed_arguments = new_arguments.is_some();
        let arguments = new_arguments.unwrap_or_else(|| simple.type_arguments.clone());
        let origin = typefns::generic_origin(model, target);
        match self.instantiator.instantiate(model, origin, arguments.clone(), Mode::Deep) {
            Ok(instance) if instance == target && !changed_arguments => None,
            Ok(instance) => Some(Type::Simple(SimpleType {
                type_arguments: arguments,
                resolved: Some(instance),
                ..simple.clone()
            })),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yarrow_core::lang::primitives::PrimitiveId;

    use crate::frontend::diagnostics::DiagnosticKind;

    fn loc(line: usize, column: usize) -> SourceLocation {
        SourceLocation::new("t.yml", line, column)
    }

    fn reference(id: DefId, arguments: Vec<Type>) -> Type {
        let mut simple = SimpleType::new("ref", loc(1, 1));
        simple.resolved = Some(id);
        simple.type_arguments = arguments;
        Type::Simple(simple)
    }

    /// `Box<T>: !record { fields: { value: T } }`, returning the record and its parameter.
    fn boxed(model: &mut Model) -> (DefId, DefId) {
        let parameter = model.push(TypeDefinition::Parameter(GenericParameter {
            meta: DefinitionMeta::new("T", loc(1, 5)),
        }));
        let mut meta = DefinitionMeta::new("Box", loc(1, 1));
        meta.type_parameters = vec![parameter];
        let record = model.add_definition(
            "Ns",
            TypeDefinition::Record(RecordDefinition {
                meta,
                fields: vec![Field {
                    name: "value".to_string(),
                    ty: reference(parameter, Vec::new()),
                    comment: String::new(),
                    location: loc(3, 5),
                }],
                computed_fields: Vec::new(),
            }),
        );
        (record, parameter)
    }

    fn field_type(model: &Model, id: DefId) -> &Type {
        match model.definition(id) {
            TypeDefinition::Record(record) => &record.fields[0].ty,
            other => panic!("expected a record, got {}", other.kind_label()),
        }
    }

    #[test]
    fn test_shallow_substitutes_parameters() {
        let mut model = Model::new();
        let (record, _) = boxed(&mut model);
        let mut instantiator = Instantiator::new();
        let int = Type::primitive(PrimitiveId::Int32, loc(9, 9));
        let instance = instantiator
            .instantiate(&mut model, record, vec![int], Mode::Shallow)
            .expect("instantiates");

        let meta = model.definition(instance).meta().expect("has meta");
        assert_eq!(meta.origin, Some(record));
        assert_eq!(meta.type_arguments.len(), 1);
        let ty = field_type(&model, instance);
        assert_eq!(typefns::primitive_of(&model, ty), Some(PrimitiveId::Int32));
        assert_eq!(ty.location(), &loc(9, 9));
        assert_eq!(instantiator.instance_count(), 0);
    }

    #[test]
    fn test_deep_instances_are_memoized_and_equal() {
        let mut model = Model::new();
        let (record, _) = boxed(&mut model);
        let mut instantiator = Instantiator::new();
        let int = || Type::primitive(PrimitiveId::Int32, loc(2, 2));
        let a = instantiator
            .instantiate(&mut model, record, vec![int()], Mode::Deep)
            .expect("instantiates");
        let b = instantiator
            .instantiate(&mut model, record, vec![int()], Mode::Deep)
            .expect("instantiates");
        assert_eq!(a, b);

        let shallow = instantiator
            .instantiate(&mut model, record, vec![int()], Mode::Shallow)
            .expect("instantiates");
        assert_ne!(a, shallow);
        assert!(typefns::definitions_equal(&model, a, shallow));
    }

    #[test]
    fn test_identity_arguments_return_the_generic() {
        let mut model = Model::new();
        let (record, parameter) = boxed(&mut model);
        let mut instantiator = Instantiator::new();
        let id = instantiator
            .instantiate(&mut model, record, vec![reference(parameter, Vec::new())], Mode::Deep)
            .expect("instantiates");
        assert_eq!(id, record);
    }

    #[test]
    fn test_foreign_parameter_is_an_internal_error() {
        let mut model = Model::new();
        let (record, _) = boxed(&mut model);
        let stranger = model.push(TypeDefinition::Parameter(GenericParameter {
            meta: DefinitionMeta::new("U", loc(7, 7)),
        }));
        if let TypeDefinition::Record(r) = model.definition_mut(record) {
            r.fields[0].ty = reference(stranger, Vec::new());
        }
        let err = Instantiator::new()
            .instantiate(&mut model, record, vec![Type::primitive(PrimitiveId::Bool, loc(1, 1))], Mode::Deep)
            .expect_err("U is not a parameter of Box");
        assert_eq!(err.message, "internal error: unable to substitute generic type parameter");
    }

    #[test]
    fn test_wrong_argument_count() {
        let mut model = Model::new();
        let (record, _) = boxed(&mut model);
        let err = Instantiator::new()
            .instantiate(&mut model, record, Vec::new(), Mode::Shallow)
            .expect_err("Box takes one argument");
        assert_eq!(err.message, "incorrect number of type arguments given");
        assert_eq!(err.kind, DiagnosticKind::Internal);
    }
}
