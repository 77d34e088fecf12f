//! Model tree for yarrow schemas.
//!
//! The loader produces this tree with names still unresolved; the semantic passes in the `yarrow` crate resolve,
//! instantiate and rewrite it in place.
//!
//! ## Notes
//! - Definitions live in an arena owned by [`Model`] and are referenced by [`DefId`]. Namespaces, the symbol table and
//!   every resolved [`SimpleType`] hold ids, so replacing a definition means writing one arena slot.
//! - Primitive definitions are seeded at fixed ids ([`DefId::primitive`]) when a model is created.
//! - Every node carries a [`SourceLocation`] so diagnostics can point at the YAML that produced it.

use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use yarrow_core::lang::primitives::{self, PrimitiveId};

// ============================================================================
// LOCATIONS
// ============================================================================

/// A position in a model source file (1-based line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<Arc<str>>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location for nodes synthesized without any source text (e.g. the seeded primitives).
    pub fn builtin() -> Self {
        Self::new("", 0, 0)
    }

    /// Shift the column by `offset` characters (used for sub-nodes of a parsed scalar).
    pub fn offset_columns(&self, offset: usize) -> Self {
        Self {
            file: self.file.clone(),
            line: self.line,
            column: self.column + offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ============================================================================
// MODEL & NAMESPACES
// ============================================================================

/// Largest number of definitions a [`Model`] can hold; ids are `u32` indices.
pub const MAX_DEFINITIONS: u64 = u32::MAX as u64 + 1;

/// Arena index of a [`TypeDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

impl DefId {
    /// The fixed id of a seeded primitive definition.
    pub fn primitive(primitive: PrimitiveId) -> Self {
        DefId(primitive as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The whole model: the definition arena plus the namespaces that order it.
#[derive(Debug, Clone)]
pub struct Model {
    definitions: Vec<TypeDefinition>,
    pub namespaces: Vec<Namespace>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create an empty model with every primitive seeded at its fixed id.
    pub fn new() -> Self {
        Self {
            definitions: primitives::ALL.iter().map(|p| TypeDefinition::Primitive(*p)).collect(),
            namespaces: Vec::new(),
        }
    }

    /// Append a definition to the arena and return its id.
    ///
    /// ## Panics
    /// When the arena already holds [`MAX_DEFINITIONS`] definitions, the same way `Vec::push` panics on capacity
    /// overflow.
    pub fn push(&mut self, definition: TypeDefinition) -> DefId {
        let id = u32::try_from(self.definitions.len())
            .map(DefId)
            .unwrap_or_else(|_| panic!("the model cannot hold more than {MAX_DEFINITIONS} definitions"));
        self.definitions.push(definition);
        id
    }

    pub fn definition(&self, id: DefId) -> &TypeDefinition {
        &self.definitions[id.index()]
    }

    pub fn definition_mut(&mut self, id: DefId) -> &mut TypeDefinition {
        &mut self.definitions[id.index()]
    }

    /// Overwrite the arena slot `id`, returning the previous definition.
    pub fn replace(&mut self, id: DefId, definition: TypeDefinition) -> TypeDefinition {
        std::mem::replace(&mut self.definitions[id.index()], definition)
    }

    /// Number of arena slots (primitives and instances included).
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    /// Find or create the namespace called `name`.
    pub fn namespace_mut(&mut self, name: &str) -> &mut Namespace {
        match self.namespaces.iter().position(|ns| ns.name == name) {
            Some(index) => &mut self.namespaces[index],
            None => {
                self.namespaces.push(Namespace::new(name));
                let last = self.namespaces.len() - 1;
                &mut self.namespaces[last]
            }
        }
    }

    /// Add a definition to the arena and register it in namespace `namespace`.
    ///
    /// Protocols land in the namespace's protocol list; everything else in its type list.
    pub fn add_definition(&mut self, namespace: &str, mut definition: TypeDefinition) -> DefId {
        if let Some(meta) = definition.meta_mut() {
            meta.namespace = namespace.to_string();
        }
        let is_protocol = matches!(definition, TypeDefinition::Protocol(_));
        let id = self.push(definition);
        let ns = self.namespace_mut(namespace);
        if is_protocol {
            ns.protocols.push(id);
        } else {
            ns.types.push(id);
        }
        id
    }

    /// Qualified name of the definition behind `id` (canonical name for primitives).
    pub fn qualified_name(&self, id: DefId) -> String {
        self.definition(id).qualified_name()
    }
}

/// A named container of type and protocol definitions.
#[derive(Debug, Clone)]
pub struct Namespace {
    pub name: String,
    /// Type definitions in declaration order (dependency order after validation).
    pub types: Vec<DefId>,
    pub protocols: Vec<DefId>,
    /// Names of namespaces this one imports.
    pub imports: Vec<String>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            protocols: Vec::new(),
            imports: Vec::new(),
        }
    }
}

// ============================================================================
// TYPE DEFINITIONS
// ============================================================================

/// Data shared by every non-primitive definition.
#[derive(Debug, Clone)]
pub struct DefinitionMeta {
    pub name: String,
    /// Owning namespace; empty for generic type parameters.
    pub namespace: String,
    /// Declared type parameters (each a [`TypeDefinition::Parameter`] arena entry).
    pub type_parameters: Vec<DefId>,
    /// Concrete arguments of an instantiated generic.
    pub type_arguments: Vec<Type>,
    /// The generic definition this instance was produced from.
    pub origin: Option<DefId>,
    pub comment: String,
    pub location: SourceLocation,
}

impl DefinitionMeta {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            type_parameters: Vec::new(),
            type_arguments: Vec::new(),
            origin: None,
            comment: String::new(),
            location,
        }
    }

    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }
}

/// A type or protocol definition.
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Primitive(PrimitiveId),
    Parameter(GenericParameter),
    Alias(NamedType),
    Record(RecordDefinition),
    Enum(EnumDefinition),
    Protocol(ProtocolDefinition),
}

impl TypeDefinition {
    pub fn meta(&self) -> Option<&DefinitionMeta> {
        match self {
            TypeDefinition::Primitive(_) => None,
            TypeDefinition::Parameter(p) => Some(&p.meta),
            TypeDefinition::Alias(a) => Some(&a.meta),
            TypeDefinition::Record(r) => Some(&r.meta),
            TypeDefinition::Enum(e) => Some(&e.meta),
            TypeDefinition::Protocol(p) => Some(&p.meta),
        }
    }

    pub fn meta_mut(&mut self) -> Option<&mut DefinitionMeta> {
        match self {
            TypeDefinition::Primitive(_) => None,
            TypeDefinition::Parameter(p) => Some(&mut p.meta),
            TypeDefinition::Alias(a) => Some(&mut a.meta),
            TypeDefinition::Record(r) => Some(&mut r.meta),
            TypeDefinition::Enum(e) => Some(&mut e.meta),
            TypeDefinition::Protocol(p) => Some(&mut p.meta),
        }
    }

    /// Unqualified name (canonical spelling for primitives).
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Primitive(p) => primitives::as_str(*p),
            _ => self.meta().map(|m| m.name.as_str()).unwrap_or_default(),
        }
    }

    pub fn qualified_name(&self) -> String {
        match self.meta() {
            Some(meta) => meta.qualified_name(),
            None => self.name().to_string(),
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.meta().map(|m| &m.location)
    }

    pub fn type_parameters(&self) -> &[DefId] {
        self.meta().map(|m| m.type_parameters.as_slice()).unwrap_or_default()
    }

    pub fn type_arguments(&self) -> &[Type] {
        self.meta().map(|m| m.type_arguments.as_slice()).unwrap_or_default()
    }

    pub fn as_primitive(&self) -> Option<PrimitiveId> {
        match self {
            TypeDefinition::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Human-readable kind, used in diagnostics ("Record", "Enum", ...).
    pub fn kind_label(&self) -> &'static str {
        match self {
            TypeDefinition::Primitive(_) => "Primitive",
            TypeDefinition::Parameter(_) => "Parameter",
            TypeDefinition::Alias(_) => "Alias",
            TypeDefinition::Record(_) => "Record",
            TypeDefinition::Enum(e) if e.is_flags => "Flags",
            TypeDefinition::Enum(_) => "Enum",
            TypeDefinition::Protocol(_) => "Protocol",
        }
    }
}

/// A generic type parameter, visible only inside its declaring definition.
#[derive(Debug, Clone)]
pub struct GenericParameter {
    pub meta: DefinitionMeta,
}

/// A type alias.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub meta: DefinitionMeta,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct RecordDefinition {
    pub meta: DefinitionMeta,
    pub fields: Vec<Field>,
    pub computed_fields: Vec<ComputedField>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub comment: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ComputedField {
    pub name: String,
    pub expression: Expression,
    pub comment: String,
    pub location: SourceLocation,
}

/// An enum or flags definition.
#[derive(Debug, Clone)]
pub struct EnumDefinition {
    pub meta: DefinitionMeta,
    /// Integer base type; `int32` when absent.
    pub base: Option<Type>,
    pub values: Vec<EnumValue>,
    pub is_flags: bool,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub symbol: String,
    /// `None` until the enum pass assigns an automatic value.
    pub value: Option<BigInt>,
    pub comment: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ProtocolDefinition {
    pub meta: DefinitionMeta,
    pub sequence: Vec<ProtocolStep>,
}

#[derive(Debug, Clone)]
pub struct ProtocolStep {
    pub name: String,
    pub ty: Type,
    pub comment: String,
    pub location: SourceLocation,
}

impl ProtocolStep {
    pub fn is_stream(&self) -> bool {
        matches!(
            &self.ty,
            Type::Generalized(GeneralizedType {
                dimensionality: Some(Dimensionality::Stream { .. }),
                ..
            })
        )
    }
}

// ============================================================================
// USE-SITE TYPES
// ============================================================================

/// A use-site type.
#[derive(Debug, Clone)]
pub enum Type {
    Simple(SimpleType),
    Generalized(GeneralizedType),
}

impl Type {
    /// An unresolved reference to `name`.
    pub fn named(name: impl Into<String>, location: SourceLocation) -> Self {
        Type::Simple(SimpleType::new(name, location))
    }

    /// A reference already resolved to a primitive.
    pub fn primitive(primitive: PrimitiveId, location: SourceLocation) -> Self {
        Type::Simple(SimpleType {
            name: primitives::as_str(primitive).to_string(),
            type_arguments: Vec::new(),
            resolved: Some(DefId::primitive(primitive)),
            is_recursive: false,
            location,
        })
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Type::Simple(t) => &t.location,
            Type::Generalized(t) => &t.location,
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleType> {
        match self {
            Type::Simple(t) => Some(t),
            Type::Generalized(_) => None,
        }
    }

    pub fn as_generalized(&self) -> Option<&GeneralizedType> {
        match self {
            Type::Generalized(t) => Some(t),
            Type::Simple(_) => None,
        }
    }
}

/// A reference to a definition by name, with optional type arguments.
#[derive(Debug, Clone)]
pub struct SimpleType {
    /// Name as written; the qualified name once resolved.
    pub name: String,
    pub type_arguments: Vec<Type>,
    pub resolved: Option<DefId>,
    /// Marks a sanctioned self-reference (`!recursive`).
    pub is_recursive: bool,
    pub location: SourceLocation,
}

impl SimpleType {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            type_arguments: Vec::new(),
            resolved: None,
            is_recursive: false,
            location,
        }
    }
}

/// One or more cases with an optional container shape.
#[derive(Debug, Clone)]
pub struct GeneralizedType {
    pub cases: Vec<TypeCase>,
    pub dimensionality: Option<Dimensionality>,
    pub location: SourceLocation,
}

impl GeneralizedType {
    /// Exactly one case.
    pub fn is_single(&self) -> bool {
        self.cases.len() == 1
    }

    /// A null case followed by exactly one other case.
    pub fn is_optional(&self) -> bool {
        self.cases.len() == 2 && self.cases[0].is_null()
    }

    /// More than one non-null case.
    pub fn is_union(&self) -> bool {
        self.cases.len() > 2 || (self.cases.len() == 2 && !self.cases[0].is_null())
    }

    pub fn has_null(&self) -> bool {
        self.cases.iter().any(TypeCase::is_null)
    }

    /// The element type: the same cases without the container shape.
    pub fn to_scalar(&self) -> Type {
        if self.cases.len() == 1 {
            if let Some(ty) = &self.cases[0].ty {
                return ty.clone();
            }
        }
        Type::Generalized(GeneralizedType {
            cases: self.cases.clone(),
            dimensionality: None,
            location: self.location.clone(),
        })
    }
}

/// One alternative of a [`GeneralizedType`]. A `None` type is the null case.
#[derive(Debug, Clone)]
pub struct TypeCase {
    pub tag: String,
    pub explicit_tag: bool,
    pub ty: Option<Type>,
    pub location: SourceLocation,
}

impl TypeCase {
    pub fn new(ty: Option<Type>, location: SourceLocation) -> Self {
        Self {
            tag: String::new(),
            explicit_tag: false,
            ty,
            location,
        }
    }

    pub fn is_null(&self) -> bool {
        self.ty.is_none()
    }
}

/// Container shape of a [`GeneralizedType`].
#[derive(Debug, Clone)]
pub enum Dimensionality {
    Vector {
        length: Option<u64>,
        location: SourceLocation,
    },
    Array {
        dimensions: Option<Vec<ArrayDimension>>,
        location: SourceLocation,
    },
    Map {
        key_type: Box<Type>,
        location: SourceLocation,
    },
    Stream {
        location: SourceLocation,
    },
}

impl Dimensionality {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Dimensionality::Vector { location, .. }
            | Dimensionality::Array { location, .. }
            | Dimensionality::Map { location, .. }
            | Dimensionality::Stream { location } => location,
        }
    }

    /// Container kind, used in diagnostics and cycle paths ("Vector", "Array", ...).
    pub fn kind_label(&self) -> &'static str {
        match self {
            Dimensionality::Vector { .. } => "Vector",
            Dimensionality::Array { .. } => "Array",
            Dimensionality::Map { .. } => "Map",
            Dimensionality::Stream { .. } => "Stream",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArrayDimension {
    pub name: Option<String>,
    pub length: Option<u64>,
    pub comment: String,
    pub location: SourceLocation,
}

/// Whether every dimension of an array has a known length (and the dimension count is known).
pub fn is_fixed_array(dimensions: &Option<Vec<ArrayDimension>>) -> bool {
    match dimensions {
        Some(dims) => dims.iter().all(|d| d.length.is_some()),
        None => false,
    }
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

/// A computed-field expression node.
#[derive(Debug, Clone)]
pub struct Expression {
    pub kind: ExpressionKind,
    /// Filled in by the computed-field resolver.
    pub resolved_type: Option<Type>,
    pub location: SourceLocation,
}

impl Expression {
    pub fn new(kind: ExpressionKind, location: SourceLocation) -> Self {
        Self {
            kind,
            resolved_type: None,
            location,
        }
    }

    pub fn integer(value: impl Into<BigInt>, location: SourceLocation) -> Self {
        Self::new(ExpressionKind::IntegerLiteral(value.into()), location)
    }

    /// A bare identifier (member access without a target).
    pub fn identifier(name: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(
            ExpressionKind::MemberAccess {
                target: None,
                member: name.into(),
                is_computed_field: false,
            },
            location,
        )
    }

    /// The identifier if this node is a target-less member access.
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::MemberAccess {
                target: None, member, ..
            } => Some(member),
            _ => None,
        }
    }

    pub fn as_integer_literal(&self) -> Option<&BigInt> {
        match &self.kind {
            ExpressionKind::IntegerLiteral(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::StringLiteral(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExpressionKind {
    IntegerLiteral(BigInt),
    /// Floating-point literal kept as written.
    FloatLiteral(String),
    StringLiteral(String),
    MemberAccess {
        target: Option<Box<Expression>>,
        member: String,
        is_computed_field: bool,
    },
    Index {
        target: Box<Expression>,
        arguments: Vec<IndexArgument>,
    },
    FunctionCall {
        function: String,
        arguments: Vec<Expression>,
    },
    TypeConversion {
        expression: Box<Expression>,
        ty: Type,
    },
    Switch {
        target: Box<Expression>,
        cases: Vec<SwitchCase>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
}

#[derive(Debug, Clone)]
pub struct IndexArgument {
    /// Dimension name for labeled array subscripts.
    pub label: Option<String>,
    pub value: Expression,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub pattern: Pattern,
    pub expression: Expression,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Negate => f.write_str("-"),
        }
    }
}

/// A switch-case pattern. A `None` type matches the null case.
#[derive(Debug, Clone)]
pub enum Pattern {
    Discard {
        location: SourceLocation,
    },
    Type {
        ty: Option<Type>,
        location: SourceLocation,
    },
    Declaration {
        ty: Option<Type>,
        identifier: String,
        location: SourceLocation,
    },
}

impl Pattern {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Pattern::Discard { location }
            | Pattern::Type { location, .. }
            | Pattern::Declaration { location, .. } => location,
        }
    }

    /// The matched type of a type or declaration pattern (`None` for the null case and for discards).
    pub fn ty(&self) -> Option<&Type> {
        match self {
            Pattern::Discard { .. } => None,
            Pattern::Type { ty, .. } | Pattern::Declaration { ty, .. } => ty.as_ref(),
        }
    }
}
