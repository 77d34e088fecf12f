//! Protocol schema strings.
//!
//! A protocol schema is a compact JSON document describing a protocol and every type definition it reaches. Binary
//! serializers embed it as a header so a reader can tell whether a stream was written with a compatible model.
//!
//! ## Notes
//! - Output is deterministic: referenced definitions are sorted by qualified name and object keys follow a fixed
//!   order.
//! - Comments and computed fields are not part of the wire format and are left out.
//! - Generic definitions appear once, in their generic form. Use sites carry the type arguments.
//! - Type names are the resolved, qualified names (`Ns.Point`, `int32`).
//!
//! ## Examples
//!
//! ```ignore
//! let env = yarrow::frontend::validation::validate(model)?;
//! let header = env.protocol_schema("Demo.Stream").unwrap_or_default();
//! ```

use std::collections::HashSet;

use num_traits::ToPrimitive;
use serde::Serialize;

use crate::frontend::ast::*;
use crate::frontend::typefns;
use crate::frontend::walk::visitor::{self, Visitor};

/// Serialize the schema of the protocol at `protocol`.
///
/// ## Errors
/// Only if JSON serialization itself fails; the views below never produce non-string map keys.
pub fn protocol_schema(model: &Model, protocol: DefId) -> Result<String, serde_json::Error> {
    let TypeDefinition::Protocol(definition) = model.definition(protocol) else {
        return Ok(String::new());
    };

    let mut collector = ReferenceCollector::default();
    collector.visit_definition(model, protocol);
    let mut types = collector.found;
    types.sort_by_cached_key(|id| model.qualified_name(*id));

    let schema = ProtocolSchema {
        protocol: ProtocolJson {
            meta: MetaJson::new(model, &definition.meta),
            sequence: definition
                .sequence
                .iter()
                .map(|step| FieldJson {
                    name: &step.name,
                    ty: type_json(model, &step.ty),
                })
                .collect(),
        },
        types: types.iter().filter_map(|id| definition_json(model, *id)).collect(),
    };
    serde_json::to_string(&schema)
}

// ============================================================================
// REFERENCED DEFINITIONS
// ============================================================================

/// Collects the generic form of every named definition reachable from a protocol.
#[derive(Default)]
struct ReferenceCollector {
    seen: HashSet<DefId>,
    found: Vec<DefId>,
}

impl Visitor for ReferenceCollector {
    fn visit_simple_type(&mut self, model: &Model, ty: &SimpleType) {
        if let Some(id) = ty.resolved {
            let origin = typefns::generic_origin(model, id);
            let named = matches!(
                model.definition(origin),
                TypeDefinition::Alias(_) | TypeDefinition::Record(_) | TypeDefinition::Enum(_)
            );
            if named && self.seen.insert(origin) {
                self.found.push(origin);
                self.visit_definition(model, origin);
            }
        }
        visitor::walk_simple_type(self, model, ty);
    }

    fn visit_computed_field(&mut self, _model: &Model, _field: &ComputedField) {}
}

// ============================================================================
// JSON VIEWS
// ============================================================================

#[derive(Serialize)]
struct ProtocolSchema<'m> {
    protocol: ProtocolJson<'m>,
    types: Vec<DefinitionJson<'m>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetaJson<'m> {
    name: &'m str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    type_parameters: Vec<&'m str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    type_arguments: Vec<TypeJson<'m>>,
}

impl<'m> MetaJson<'m> {
    fn new(model: &'m Model, meta: &'m DefinitionMeta) -> Self {
        Self {
            name: &meta.name,
            type_parameters: meta.type_parameters.iter().map(|id| model.definition(*id).name()).collect(),
            type_arguments: meta.type_arguments.iter().map(|ty| type_json(model, ty)).collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum DefinitionJson<'m> {
    Enum(EnumJson<'m>),
    Flags(EnumJson<'m>),
    Record(RecordJson<'m>),
    Alias(AliasJson<'m>),
}

#[derive(Serialize)]
struct ProtocolJson<'m> {
    #[serde(flatten)]
    meta: MetaJson<'m>,
    sequence: Vec<FieldJson<'m>>,
}

#[derive(Serialize)]
struct RecordJson<'m> {
    #[serde(flatten)]
    meta: MetaJson<'m>,
    fields: Vec<FieldJson<'m>>,
}

#[derive(Serialize)]
struct EnumJson<'m> {
    #[serde(flatten)]
    meta: MetaJson<'m>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base: Option<TypeJson<'m>>,
    values: Vec<EnumValueJson<'m>>,
}

#[derive(Serialize)]
struct EnumValueJson<'m> {
    symbol: &'m str,
    value: Option<i128>,
}

#[derive(Serialize)]
struct AliasJson<'m> {
    #[serde(flatten)]
    meta: MetaJson<'m>,
    #[serde(rename = "type")]
    ty: TypeJson<'m>,
}

#[derive(Serialize)]
struct FieldJson<'m> {
    name: &'m str,
    #[serde(rename = "type")]
    ty: TypeJson<'m>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum TypeJson<'m> {
    Name(&'m str),
    Generic {
        name: &'m str,
        #[serde(rename = "typeArguments")]
        type_arguments: Vec<TypeJson<'m>>,
    },
    Cases(CasesJson<'m>),
    Vector {
        vector: VectorJson<'m>,
    },
    Array {
        array: ArrayJson<'m>,
    },
    Map {
        map: MapJson<'m>,
    },
    Stream {
        stream: StreamJson<'m>,
    },
}

/// A single case is written bare, several as a list.
#[derive(Serialize)]
#[serde(untagged)]
enum CasesJson<'m> {
    Single(Box<CaseJson<'m>>),
    Many(Vec<CaseJson<'m>>),
}

#[derive(Serialize)]
#[serde(untagged)]
enum CaseJson<'m> {
    Null(()),
    Plain(TypeJson<'m>),
    Labeled {
        label: &'m str,
        #[serde(rename = "type")]
        ty: TypeJson<'m>,
    },
}

#[derive(Serialize)]
struct VectorJson<'m> {
    items: CasesJson<'m>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<u64>,
}

#[derive(Serialize)]
struct ArrayJson<'m> {
    items: CasesJson<'m>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<DimensionsJson<'m>>,
}

/// Anonymous dimensions without lengths are written as a count.
#[derive(Serialize)]
#[serde(untagged)]
enum DimensionsJson<'m> {
    Count(usize),
    List(Vec<DimensionJson<'m>>),
}

#[derive(Serialize)]
struct DimensionJson<'m> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'m str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<u64>,
}

#[derive(Serialize)]
struct MapJson<'m> {
    keys: Box<TypeJson<'m>>,
    values: CasesJson<'m>,
}

#[derive(Serialize)]
struct StreamJson<'m> {
    items: CasesJson<'m>,
}

fn definition_json(model: &Model, id: DefId) -> Option<DefinitionJson<'_>> {
    let json = match model.definition(id) {
        TypeDefinition::Record(record) => DefinitionJson::Record(RecordJson {
            meta: MetaJson::new(model, &record.meta),
            fields: record
                .fields
                .iter()
                .map(|field| FieldJson {
                    name: &field.name,
                    ty: type_json(model, &field.ty),
                })
                .collect(),
        }),
        TypeDefinition::Enum(definition) => {
            let json = EnumJson {
                meta: MetaJson::new(model, &definition.meta),
                base: definition.base.as_ref().map(|base| type_json(model, base)),
                values: definition
                    .values
                    .iter()
                    .map(|value| EnumValueJson {
                        symbol: &value.symbol,
                        value: value.value.as_ref().and_then(ToPrimitive::to_i128),
                    })
                    .collect(),
            };
            if definition.is_flags {
                DefinitionJson::Flags(json)
            } else {
                DefinitionJson::Enum(json)
            }
        }
        TypeDefinition::Alias(alias) => DefinitionJson::Alias(AliasJson {
            meta: MetaJson::new(model, &alias.meta),
            ty: type_json(model, &alias.ty),
        }),
        TypeDefinition::Primitive(_) | TypeDefinition::Parameter(_) | TypeDefinition::Protocol(_) => return None,
    };
    Some(json)
}

fn type_json<'m>(model: &'m Model, ty: &'m Type) -> TypeJson<'m> {
    match ty {
        Type::Simple(simple) if simple.type_arguments.is_empty() => TypeJson::Name(&simple.name),
        Type::Simple(simple) => TypeJson::Generic {
            name: &simple.name,
            type_arguments: simple.type_arguments.iter().map(|arg| type_json(model, arg)).collect(),
        },
        Type::Generalized(generalized) => {
            let items = cases_json(model, &generalized.cases);
            match &generalized.dimensionality {
                None => TypeJson::Cases(items),
                Some(Dimensionality::Vector { length, .. }) => TypeJson::Vector {
                    vector: VectorJson { items, length: *length },
                },
                Some(Dimensionality::Array { dimensions, .. }) => TypeJson::Array {
                    array: ArrayJson {
                        items,
                        dimensions: dimensions.as_deref().map(dimensions_json),
                    },
                },
                Some(Dimensionality::Map { key_type, .. }) => TypeJson::Map {
                    map: MapJson {
                        keys: Box::new(type_json(model, key_type)),
                        values: items,
                    },
                },
                Some(Dimensionality::Stream { .. }) => TypeJson::Stream {
                    stream: StreamJson { items },
                },
            }
        }
    }
}

fn cases_json<'m>(model: &'m Model, cases: &'m [TypeCase]) -> CasesJson<'m> {
    let case_json = |case: &'m TypeCase| match &case.ty {
        None => CaseJson::Null(()),
        Some(ty) if case.explicit_tag => CaseJson::Labeled {
            label: &case.tag,
            ty: type_json(model, ty),
        },
        Some(ty) => CaseJson::Plain(type_json(model, ty)),
    };
    match cases {
        [single] => CasesJson::Single(Box::new(case_json(single))),
        _ => CasesJson::Many(cases.iter().map(case_json).collect()),
    }
}

fn dimensions_json(dimensions: &[ArrayDimension]) -> DimensionsJson<'_> {
    if dimensions.iter().all(|d| d.name.is_none() && d.length.is_none()) {
        return DimensionsJson::Count(dimensions.len());
    }
    DimensionsJson::List(
        dimensions
            .iter()
            .map(|d| DimensionJson {
                name: d.name.as_deref(),
                length: d.length,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{loader, validation};

    fn schema_of(source: &str, protocol: &str) -> String {
        let mut model = Model::new();
        loader::load_str(&mut model, "Test", "test.yml", source).expect("loads");
        let env = validation::validate(model).expect("valid");
        env.protocol_schema(protocol).expect("schema computed").to_string()
    }

    #[test]
    fn test_referenced_records_are_included() {
        let source = "P: !protocol\n  sequence:\n    header: Header\n    count: int\nHeader: !record\n  fields:\n    name: string\n    tags: string*\n";
        insta::assert_snapshot!(
            schema_of(source, "Test.P"),
            @r#"{"protocol":{"name":"P","sequence":[{"name":"header","type":"Test.Header"},{"name":"count","type":"int32"}]},"types":[{"record":{"name":"Header","fields":[{"name":"name","type":"string"},{"name":"tags","type":{"vector":{"items":"string"}}}]}}]}"#
        );
    }

    #[test]
    fn test_optional_and_stream_steps() {
        let source = "P: !protocol\n  sequence:\n    maybe: int?\n    items: !stream\n      items: float\n";
        insta::assert_snapshot!(
            schema_of(source, "Test.P"),
            @r#"{"protocol":{"name":"P","sequence":[{"name":"maybe","type":[null,"int32"]},{"name":"items","type":{"stream":{"items":"float32"}}}]},"types":[]}"#
        );
    }

    #[test]
    fn test_generic_definitions_are_written_once() {
        let source = "Box<T>: !record\n  fields:\n    value: T\nP: !protocol\n  sequence:\n    a: Box<int>\n    b: Box<string>\n";
        insta::assert_snapshot!(
            schema_of(source, "Test.P"),
            @r#"{"protocol":{"name":"P","sequence":[{"name":"a","type":{"name":"Test.Box","typeArguments":["int32"]}},{"name":"b","type":{"name":"Test.Box","typeArguments":["string"]}}]},"types":[{"record":{"name":"Box","typeParameters":["T"],"fields":[{"name":"value","type":"T"}]}}]}"#
        );
    }

    #[test]
    fn test_enum_values_and_comments() {
        let source = "# the color\nColor: !enum\n  values:\n    - red\n    - green\nP: !protocol\n  sequence:\n    c: Color\n";
        insta::assert_snapshot!(
            schema_of(source, "Test.P"),
            @r#"{"protocol":{"name":"P","sequence":[{"name":"c","type":"Test.Color"}]},"types":[{"enum":{"name":"Color","values":[{"symbol":"red","value":0},{"symbol":"green","value":1}]}}]}"#
        );
    }
}
