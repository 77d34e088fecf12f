//! Conversion from `serde_yaml` documents to model definitions.
//!
//! ## Notes
//! - Conversion stops at the first problem in a document; the error carries the position of the offending node.
//! - Positions come from the [`Locator`], addressed by the same key/index path used to walk the value.

use num_bigint::BigInt;
use serde_yaml::{Mapping, Value};
use yarrow_core::lang::tags::{self, TagId};

use super::locator::{Locator, Segment};
use super::value::{key_text, wide_integer_text};
use crate::ast::*;
use crate::diagnostics::Diagnostic;
use crate::parser;

type Path = Vec<Segment>;

fn child(path: &[Segment], segment: Segment) -> Path {
    let mut path = path.to_vec();
    path.push(segment);
    path
}

fn key(path: &[Segment], name: &str) -> Path {
    child(path, Segment::Key(name.to_string()))
}

fn index(path: &[Segment], i: usize) -> Path {
    child(path, Segment::Index(i))
}

fn tag_of(value: &Value) -> Option<(Option<TagId>, String, &Value)> {
    match value {
        Value::Tagged(tagged) => {
            let spelling = tagged.tag.to_string();
            Some((tags::from_str(&spelling), spelling, &tagged.value))
        }
        _ => None,
    }
}

fn integer(value: &Value) -> Option<BigInt> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(BigInt::from)
            .or_else(|| n.as_u64().map(BigInt::from)),
        other => wide_integer_text(other).and_then(|text| text.parse().ok()),
    }
}

fn is_number(value: &Value) -> bool {
    matches!(value, Value::Number(_)) || wide_integer_text(value).is_some()
}

fn kind_name(value: &Value) -> String {
    match value {
        Value::Null => "!!null".to_string(),
        Value::Bool(_) => "!!bool".to_string(),
        Value::Number(n) if n.is_f64() => "!!float".to_string(),
        Value::Number(_) => "!!int".to_string(),
        Value::String(_) => "!!str".to_string(),
        Value::Sequence(_) => "!!seq".to_string(),
        Value::Mapping(_) => "!!map".to_string(),
        Value::Tagged(tagged) => tagged.tag.to_string(),
    }
}

/// Loads the definitions of one YAML document into a namespace.
pub(crate) struct DocumentLoader<'a> {
    pub model: &'a mut Model,
    pub namespace: &'a str,
    pub locator: &'a Locator,
    pub document: usize,
}

impl DocumentLoader<'_> {
    fn key_location(&self, path: &[Segment]) -> SourceLocation {
        self.locator.key(self.document, path)
    }

    fn value_location(&self, path: &[Segment]) -> SourceLocation {
        self.locator.value(self.document, path)
    }

    fn comment(&self, path: &[Segment]) -> String {
        self.locator.comment(self.document, path)
    }

    fn error_at_key(&self, path: &[Segment], message: impl Into<String>) -> Diagnostic {
        Diagnostic::syntax(message, &self.key_location(path))
    }

    fn error_at_value(&self, path: &[Segment], message: impl Into<String>) -> Diagnostic {
        Diagnostic::syntax(message, &self.value_location(path))
    }

    // ========================================================================
    // Documents and definitions
    // ========================================================================

    pub fn load(&mut self, root: &Value) -> Result<(), Diagnostic> {
        let mapping = match root {
            Value::Null => return Ok(()),
            Value::Mapping(mapping) => mapping,
            _ => {
                return Err(Diagnostic::syntax(
                    "expected a mapping from <typename>: <type definition>",
                    &self.locator.document(self.document),
                ));
            }
        };

        for (name, body) in mapping {
            let Value::String(text) = name else {
                return Err(Diagnostic::syntax(
                    "the name of a type is required to be a string",
                    &self.locator.document(self.document),
                ));
            };
            let path = vec![Segment::Key(text.clone())];
            let definition = self.definition(text, body, &path)?;
            self.model.add_definition(self.namespace, definition);
        }
        Ok(())
    }

    fn definition(&mut self, text: &str, body: &Value, path: &[Segment]) -> Result<TypeDefinition, Diagnostic> {
        let location = self.key_location(path);
        let head = parser::parse_definition_name(text, &location).map_err(first)?;

        let mut meta = DefinitionMeta::new(head.name, head.location);
        meta.comment = self.comment(path);
        for (parameter, parameter_location) in head.type_parameters {
            let id = self.model.push(TypeDefinition::Parameter(GenericParameter {
                meta: DefinitionMeta::new(parameter, parameter_location),
            }));
            meta.type_parameters.push(id);
        }

        match tag_of(body) {
            Some((Some(TagId::Record), _, inner)) => self.record(meta, inner, path).map(TypeDefinition::Record),
            Some((Some(TagId::Enum), _, inner)) => self.enumeration(meta, inner, path, false).map(TypeDefinition::Enum),
            Some((Some(TagId::Flags), _, inner)) => self.enumeration(meta, inner, path, true).map(TypeDefinition::Enum),
            Some((Some(TagId::Protocol), _, inner)) => {
                self.protocol(meta, inner, path).map(TypeDefinition::Protocol)
            }
            _ => {
                let Some(ty) = self.ty(body, path)? else {
                    return Err(self.error_at_key(path, "type cannot be empty"));
                };
                Ok(TypeDefinition::Alias(NamedType { meta, ty }))
            }
        }
    }

    fn record(&mut self, meta: DefinitionMeta, body: &Value, path: &[Segment]) -> Result<RecordDefinition, Diagnostic> {
        let mut record = RecordDefinition {
            meta,
            fields: Vec::new(),
            computed_fields: Vec::new(),
        };
        for (k, v, k_path) in self.entries(body, path, "!record")? {
            match k.as_str() {
                "fields" => record.fields = self.fields(v, &k_path)?,
                "computedFields" => record.computed_fields = self.computed_fields(v, &k_path)?,
                other => {
                    return Err(self.error_at_key(&k_path, format!("field '{other}' is not valid on a !record specification")));
                }
            }
        }
        Ok(record)
    }

    fn protocol(
        &mut self,
        meta: DefinitionMeta,
        body: &Value,
        path: &[Segment],
    ) -> Result<ProtocolDefinition, Diagnostic> {
        let mut protocol = ProtocolDefinition {
            meta,
            sequence: Vec::new(),
        };
        for (k, v, k_path) in self.entries(body, path, "!protocol")? {
            match k.as_str() {
                "sequence" => {
                    protocol.sequence = self
                        .fields(v, &k_path)?
                        .into_iter()
                        .map(|f| ProtocolStep {
                            name: f.name,
                            ty: f.ty,
                            comment: f.comment,
                            location: f.location,
                        })
                        .collect();
                }
                other => {
                    return Err(self.error_at_key(
                        &k_path,
                        format!("field '{other}' is not valid on a !protocol specification"),
                    ));
                }
            }
        }
        Ok(protocol)
    }

    fn enumeration(
        &mut self,
        meta: DefinitionMeta,
        body: &Value,
        path: &[Segment],
        is_flags: bool,
    ) -> Result<EnumDefinition, Diagnostic> {
        let mut definition = EnumDefinition {
            meta,
            base: None,
            values: Vec::new(),
            is_flags,
        };
        let tag = if is_flags { "an !flags" } else { "an !enum" };
        for (k, v, k_path) in self.entries(body, path, tag)? {
            match k.as_str() {
                "base" => definition.base = self.ty(v, &k_path)?,
                "values" => definition.values = self.enum_values(v, &k_path)?,
                other => {
                    return Err(self.error_at_key(&k_path, format!("field '{other}' is not valid on {tag} specification")));
                }
            }
        }
        Ok(definition)
    }

    fn enum_values(&self, value: &Value, path: &[Segment]) -> Result<Vec<EnumValue>, Diagnostic> {
        let mut values = Vec::new();
        match value {
            Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = index(path, i);
                    let Value::String(symbol) = item else {
                        return Err(self.error_at_key(path, "invalid enum specification"));
                    };
                    values.push(EnumValue {
                        symbol: symbol.clone(),
                        value: None,
                        comment: self.comment(&item_path),
                        location: self.value_location(&item_path),
                    });
                }
            }
            Value::Mapping(mapping) => {
                for (k, v) in mapping {
                    let Value::String(symbol) = k else {
                        return Err(self.error_at_key(path, "invalid enum specification"));
                    };
                    let symbol_path = key(path, symbol);
                    let value = match v {
                        Value::Null => None,
                        other => Some(
                            integer(other)
                                .ok_or_else(|| self.error_at_value(&symbol_path, "enum value must be an integer"))?,
                        ),
                    };
                    values.push(EnumValue {
                        symbol: symbol.clone(),
                        value,
                        comment: self.comment(&symbol_path),
                        location: self.key_location(&symbol_path),
                    });
                }
            }
            Value::Null => {}
            _ => return Err(self.error_at_key(path, "invalid enum specification")),
        }
        Ok(values)
    }

    /// Entries of a definition body mapping; a null body has none.
    fn entries<'v>(
        &self,
        body: &'v Value,
        path: &[Segment],
        what: &str,
    ) -> Result<Vec<(String, &'v Value, Path)>, Diagnostic> {
        match body {
            Value::Null => Ok(Vec::new()),
            Value::Mapping(mapping) => mapping
                .iter()
                .map(|(k, v)| {
                    let text = key_text(k).ok_or_else(|| self.error_at_key(path, "expected a string key"))?;
                    let k_path = key(path, &text);
                    Ok((text, v, k_path))
                })
                .collect(),
            _ => Err(self.error_at_key(path, format!("{what} must be specified as a mapping"))),
        }
    }

    // ========================================================================
    // Fields
    // ========================================================================

    fn fields(&self, value: &Value, path: &[Segment]) -> Result<Vec<Field>, Diagnostic> {
        let mapping = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Mapping(mapping) => mapping,
            _ => return Err(self.error_at_key(path, "expected field map")),
        };

        let mut fields = Vec::new();
        for (k, v) in mapping {
            let Value::String(name) = k else {
                return Err(self.error_at_key(path, "expected field name to be a string"));
            };
            let field_path = key(path, name);
            if matches!(v, Value::Null) {
                return Err(self.error_at_key(&field_path, "a field or protocol step cannot be null"));
            }
            let Some(ty) = self.ty(v, &field_path)? else {
                return Err(self.error_at_key(&field_path, "a field or protocol step cannot be null"));
            };
            fields.push(Field {
                name: name.clone(),
                ty,
                comment: self.comment(&field_path),
                location: self.key_location(&field_path),
            });
        }
        Ok(fields)
    }

    fn computed_fields(&self, value: &Value, path: &[Segment]) -> Result<Vec<ComputedField>, Diagnostic> {
        let mapping = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Mapping(mapping) => mapping,
            _ => return Err(self.error_at_key(path, "expected computed fields to be a map")),
        };

        let mut computed = Vec::new();
        for (k, v) in mapping {
            let Value::String(name) = k else {
                return Err(self.error_at_key(path, "expected computed field name to be a string"));
            };
            let field_path = key(path, name);
            computed.push(ComputedField {
                name: name.clone(),
                expression: self.expression(v, &field_path)?,
                comment: self.comment(&field_path),
                location: self.key_location(&field_path),
            });
        }
        Ok(computed)
    }

    // ========================================================================
    // Types
    // ========================================================================

    /// Convert a type node; `Ok(None)` is the null type.
    fn ty(&self, value: &Value, path: &[Segment]) -> Result<Option<Type>, Diagnostic> {
        match value {
            Value::Null => Ok(None),
            Value::String(text) => parser::parse_type(text, &self.value_location(path))
                .map(Some)
                .map_err(first),
            Value::Sequence(items) => {
                let location = self.value_location(path);
                let mut cases = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = index(path, i);
                    let ty = self.ty(item, &item_path)?;
                    cases.push(TypeCase::new(ty, self.value_location(&item_path)));
                }
                Ok(Some(Type::Generalized(GeneralizedType {
                    cases,
                    dimensionality: None,
                    location,
                })))
            }
            Value::Tagged(tagged) => {
                let spelling = tagged.tag.to_string();
                let inner = &tagged.value;
                match tags::from_str(&spelling) {
                    Some(TagId::Generic) => self.generic(inner, path).map(Some),
                    Some(TagId::Vector) => self.vector(inner, path).map(Some),
                    Some(TagId::Array) => self.array(inner, path).map(Some),
                    Some(TagId::Map) => self.map(inner, path).map(Some),
                    Some(TagId::Stream) => self.stream(inner, path).map(Some),
                    Some(TagId::Union) => self.union(inner, path).map(Some),
                    Some(TagId::Recursive) => self.recursive(inner, path).map(Some),
                    _ => Err(self.error_at_value(path, format!("unrecognized type kind '{spelling}'"))),
                }
            }
            other => Err(self.error_at_value(path, format!("unrecognized type kind '{}'", kind_name(other)))),
        }
    }

    /// The items of a container: a sequence is a union, anything else a single non-null case.
    fn type_cases(&self, value: &Value, path: &[Segment]) -> Result<Vec<TypeCase>, Diagnostic> {
        if let Value::Sequence(items) = value {
            let mut cases = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = index(path, i);
                let ty = self.ty(item, &item_path)?;
                cases.push(TypeCase::new(ty, self.value_location(&item_path)));
            }
            return Ok(cases);
        }

        match self.ty(value, path)? {
            Some(Type::Generalized(GeneralizedType {
                cases,
                dimensionality: None,
                ..
            })) => Ok(cases),
            Some(ty) => Ok(vec![TypeCase::new(Some(ty), self.value_location(path))]),
            None => Err(self.error_at_value(path, "type null is only supported in unions")),
        }
    }

    fn container<'v>(&self, value: &'v Value, path: &[Segment], message: &str) -> Result<&'v Mapping, Diagnostic> {
        match value {
            Value::Mapping(mapping) => Ok(mapping),
            _ => Err(self.error_at_value(path, message)),
        }
    }

    fn vector(&self, value: &Value, path: &[Segment]) -> Result<Type, Diagnostic> {
        let mapping = self.container(value, path, "a !vector must be specified with field `items` and optionally `length`")?;
        let location = self.value_location(path);
        let mut cases = None;
        let mut length = None;
        for (k, v) in mapping {
            let name = key_text(k).unwrap_or_default();
            let k_path = key(path, &name);
            match name.as_str() {
                "items" => cases = Some(self.type_cases(v, &k_path)?),
                "length" => {
                    if matches!(v, Value::Null) {
                        continue;
                    }
                    length = Some(self.length(v, &k_path, "vector length")?);
                }
                other => {
                    return Err(self.error_at_key(&k_path, format!("field '{other}' is not valid on a !vector specification")));
                }
            }
        }
        let Some(cases) = cases else {
            return Err(self.error_at_value(path, "`items` must be specified on a !vector"));
        };
        Ok(Type::Generalized(GeneralizedType {
            cases,
            dimensionality: Some(Dimensionality::Vector {
                length,
                location: location.clone(),
            }),
            location,
        }))
    }

    fn length(&self, value: &Value, path: &[Segment], what: &str) -> Result<u64, Diagnostic> {
        let Some(length) = integer(value) else {
            return Err(self.error_at_value(path, format!("{what} must be an integer")));
        };
        if length < BigInt::default() {
            return Err(self.error_at_value(path, format!("{what} cannot be negative")));
        }
        u64::try_from(&length).map_err(|_| self.error_at_value(path, "integer out of range"))
    }

    fn array(&self, value: &Value, path: &[Segment]) -> Result<Type, Diagnostic> {
        let mapping = self.container(value, path, "an !array must be specified with field `items` and optionally `dimensions`")?;
        let location = self.value_location(path);
        let mut cases = None;
        let mut dimensions = None;
        for (k, v) in mapping {
            let name = key_text(k).unwrap_or_default();
            let k_path = key(path, &name);
            match name.as_str() {
                "items" => cases = Some(self.type_cases(v, &k_path)?),
                "dimensions" => dimensions = self.dimensions(v, &k_path)?,
                other => {
                    return Err(self.error_at_key(&k_path, format!("field '{other}' is not valid on an !array specification")));
                }
            }
        }
        let Some(cases) = cases else {
            return Err(self.error_at_value(path, "items must be specified on an !array"));
        };
        Ok(Type::Generalized(GeneralizedType {
            cases,
            dimensionality: Some(Dimensionality::Array {
                dimensions,
                location: location.clone(),
            }),
            location,
        }))
    }

    fn dimensions(&self, value: &Value, path: &[Segment]) -> Result<Option<Vec<ArrayDimension>>, Diagnostic> {
        let dimension = |name: Option<String>, v: &Value, p: &[Segment], location: SourceLocation| -> Result<ArrayDimension, Diagnostic> {
            let length = match v {
                Value::Null => None,
                _ if is_number(v) => Some(self.length(v, p, "array dimension length")?),
                _ => return Err(self.error_at_value(p, "invalid dimension specification")),
            };
            Ok(ArrayDimension {
                name,
                length,
                comment: self.comment(p),
                location,
            })
        };

        match value {
            Value::Null => Ok(None),
            _ if is_number(value) => {
                let count = self.length(value, path, "array dimension count")?;
                let location = self.value_location(path);
                Ok(Some(
                    (0..count)
                        .map(|_| ArrayDimension {
                            name: None,
                            length: None,
                            comment: String::new(),
                            location: location.clone(),
                        })
                        .collect(),
                ))
            }
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let item_path = index(path, i);
                    dimension(None, item, &item_path, self.value_location(&item_path))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Value::Mapping(mapping) => mapping
                .iter()
                .map(|(k, v)| {
                    let name = key_text(k).unwrap_or_default();
                    let dim_path = key(path, &name);
                    dimension(Some(name), v, &dim_path, self.key_location(&dim_path))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            _ => Err(self.error_at_value(
                path,
                "dimensions must be specified as a list of dimension specifications or the number of dimensions",
            )),
        }
    }

    fn map(&self, value: &Value, path: &[Segment]) -> Result<Type, Diagnostic> {
        let mapping = self.container(value, path, "a !map must be specified with fields `keys` and `values`")?;
        let location = self.value_location(path);
        let mut keys = None;
        let mut values = None;
        for (k, v) in mapping {
            let name = key_text(k).unwrap_or_default();
            let k_path = key(path, &name);
            match name.as_str() {
                "keys" => match self.ty(v, &k_path)? {
                    Some(ty) => keys = Some(ty),
                    None => return Err(self.error_at_value(&k_path, "map keys cannot be null")),
                },
                "values" => values = Some(self.type_cases(v, &k_path)?),
                other => {
                    return Err(self.error_at_key(&k_path, format!("field '{other}' is not valid on a !map specification")));
                }
            }
        }
        let Some(key_type) = keys else {
            return Err(self.error_at_value(path, "`keys` must be specified on a !map"));
        };
        let Some(cases) = values else {
            return Err(self.error_at_value(path, "`values` must be specified on a !map"));
        };
        Ok(Type::Generalized(GeneralizedType {
            cases,
            dimensionality: Some(Dimensionality::Map {
                key_type: Box::new(key_type),
                location: location.clone(),
            }),
            location,
        }))
    }

    fn stream(&self, value: &Value, path: &[Segment]) -> Result<Type, Diagnostic> {
        let mapping = self.container(value, path, "a !stream must be specified with field `items`")?;
        let location = self.value_location(path);
        let mut cases = None;
        for (k, v) in mapping {
            let name = key_text(k).unwrap_or_default();
            let k_path = key(path, &name);
            match name.as_str() {
                "items" => cases = Some(self.type_cases(v, &k_path)?),
                other => {
                    return Err(self.error_at_key(&k_path, format!("field '{other}' is not valid on a !stream specification")));
                }
            }
        }
        let Some(cases) = cases else {
            return Err(self.error_at_value(path, "'items' must be specified on an !stream"));
        };
        Ok(Type::Generalized(GeneralizedType {
            cases,
            dimensionality: Some(Dimensionality::Stream {
                location: location.clone(),
            }),
            location,
        }))
    }

    fn union(&self, value: &Value, path: &[Segment]) -> Result<Type, Diagnostic> {
        let mapping = self.container(value, path, "a !union must be specified as a mapping from tag to type")?;
        let location = self.value_location(path);
        let mut cases = Vec::with_capacity(mapping.len());
        for (k, v) in mapping {
            let tag = key_text(k).unwrap_or_default();
            let case_path = key(path, &tag);
            match self.ty(v, &case_path)? {
                None => cases.push(TypeCase::new(None, self.key_location(&case_path))),
                Some(ty) => cases.push(TypeCase {
                    tag,
                    explicit_tag: true,
                    location: ty.location().clone(),
                    ty: Some(ty),
                }),
            }
        }
        Ok(Type::Generalized(GeneralizedType {
            cases,
            dimensionality: None,
            location,
        }))
    }

    fn generic(&self, value: &Value, path: &[Segment]) -> Result<Type, Diagnostic> {
        let mapping = self.container(value, path, "a !generic must be specified with fields `name` and `args`")?;
        let mut simple = SimpleType::new(String::new(), self.value_location(path));
        let mut args = None;
        for (k, v) in mapping {
            let name = key_text(k).unwrap_or_default();
            let k_path = key(path, &name);
            match name.as_str() {
                "name" => simple.name = key_text(v).unwrap_or_default(),
                "args" => {
                    let mut arguments = Vec::new();
                    let items: Vec<(&Value, Path)> = match v {
                        Value::Sequence(items) => {
                            items.iter().enumerate().map(|(i, item)| (item, index(&k_path, i))).collect()
                        }
                        single => vec![(single, k_path.clone())],
                    };
                    for (item, item_path) in items {
                        match self.ty(item, &item_path)? {
                            Some(ty) => arguments.push(ty),
                            None => return Err(self.error_at_value(&item_path, "a type argument cannot be null")),
                        }
                    }
                    args = Some(arguments);
                }
                other => {
                    return Err(self.error_at_key(
                        &k_path,
                        format!("field '{other}' is not valid on an !generic specification ('name' and 'args' are expected)"),
                    ));
                }
            }
        }
        if simple.name.is_empty() {
            return Err(self.error_at_value(path, "the 'name' property of a !generic type must be specified and non-empty"));
        }
        let Some(arguments) = args else {
            return Err(self.error_at_value(path, "the 'args' property of a !generic type must be specified"));
        };
        simple.type_arguments = arguments;
        Ok(Type::Simple(simple))
    }

    fn recursive(&self, value: &Value, path: &[Segment]) -> Result<Type, Diagnostic> {
        let not_a_reference = || self.error_at_value(path, "!recursive must be applied to a type name");
        let ty = match value {
            Value::String(_) => self.ty(value, path)?,
            Value::Tagged(tagged) if tags::from_str(&tagged.tag.to_string()) == Some(TagId::Generic) => {
                self.ty(value, path)?
            }
            _ => return Err(not_a_reference()),
        };
        match ty {
            Some(Type::Simple(mut simple)) => {
                simple.is_recursive = true;
                Ok(Type::Simple(simple))
            }
            _ => Err(not_a_reference()),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn expression(&self, value: &Value, path: &[Segment]) -> Result<Expression, Diagnostic> {
        if let Some(text) = wide_integer_text(value) {
            return parser::parse_expression(text, &self.value_location(path)).map_err(first);
        }
        match value {
            Value::Null => Err(self.error_at_key(path, "An expression cannot be null")),
            Value::String(text) => parser::parse_expression(text, &self.value_location(path)).map_err(first),
            Value::Number(n) => parser::parse_expression(&n.to_string(), &self.value_location(path)).map_err(first),
            Value::Mapping(mapping) => {
                let mut entries = mapping.iter();
                if let (Some((k, cases)), None) = (entries.next(), entries.next()) {
                    if let Some((Some(TagId::Switch), _, target)) = tag_of(k) {
                        return self.switch(target, cases, path);
                    }
                }
                Err(self.error_at_value(path, "expected a !switch expression"))
            }
            other => Err(self.error_at_value(path, format!("unsupported expression type: {}", kind_name(other)))),
        }
    }

    fn switch(&self, target: &Value, cases: &Value, path: &[Segment]) -> Result<Expression, Diagnostic> {
        let target_text = key_text(target).unwrap_or_default();
        let switch_path = key(path, &target_text);
        let location = self.key_location(&switch_path);
        let target = parser::parse_expression(&target_text, &location).map_err(first)?;

        let Value::Mapping(case_mapping) = cases else {
            return Err(self.error_at_key(&switch_path, "expected a mapping from <case>: <expression>"));
        };

        let mut switch_cases = Vec::with_capacity(case_mapping.len());
        for (pattern_value, expression_value) in case_mapping {
            let pattern_text = key_text(pattern_value).unwrap_or_default();
            let case_path = key(&switch_path, &pattern_text);
            let case_location = self.key_location(&case_path);
            let pattern = match pattern_value {
                Value::Null => Pattern::Type {
                    ty: None,
                    location: case_location.clone(),
                },
                Value::String(text) => parser::parse_pattern(text, &case_location).map_err(first)?,
                _ => return Err(Diagnostic::syntax("expected pattern to be a string", &case_location)),
            };
            switch_cases.push(SwitchCase {
                pattern,
                expression: self.expression(expression_value, &case_path)?,
                location: case_location,
            });
        }

        Ok(Expression::new(
            ExpressionKind::Switch {
                target: Box::new(target),
                cases: switch_cases,
            },
            location,
        ))
    }
}

fn first(mut diagnostics: Vec<Diagnostic>) -> Diagnostic {
    if diagnostics.is_empty() {
        Diagnostic::internal("parse failed without a diagnostic", None)
    } else {
        diagnostics.swap_remove(0)
    }
}
