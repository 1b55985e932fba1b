//! Schema model.
//!
//! Schemas are trees of [`Schema`] nodes. Named types live in a [`TypeSet`]
//! arena and are referenced by [`NamedId`], so a named type's identity is its
//! index and not its structure. Self-referential types are built by declaring
//! the name first and defining its body afterwards.

use crate::error::TransformError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a named type inside a [`TypeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamedId(u32);

impl NamedId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Primitive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Boolean,
    Int,
    Int32,
    Int64,
    #[serde(rename = "uint")]
    UInt,
    #[serde(rename = "uint32")]
    UInt32,
    #[serde(rename = "uint64")]
    UInt64,
    Float32,
    Float64,
    String,
    Bytes,
    Any,
}

impl Primitive {
    /// Go spelling of the primitive.
    pub fn go_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "bool",
            Primitive::Int => "int",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::UInt => "uint",
            Primitive::UInt32 => "uint32",
            Primitive::UInt64 => "uint64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
            Primitive::String => "string",
            Primitive::Bytes => "[]byte",
            Primitive::Any => "any",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Primitive::Int
                | Primitive::Int32
                | Primitive::Int64
                | Primitive::UInt
                | Primitive::UInt32
                | Primitive::UInt64
                | Primitive::Float32
                | Primitive::Float64
        )
    }

    /// Bytes and any are reference-like in Go and never rendered behind a pointer.
    pub fn is_raw(self) -> bool {
        matches!(self, Primitive::Bytes | Primitive::Any)
    }

    /// Whether a value of `self` may be converted into `target`.
    pub fn converts_to(self, target: Primitive) -> bool {
        self == target
            || target == Primitive::Any
            || (self.is_numeric() && target.is_numeric())
            || matches!(
                (self, target),
                (Primitive::String, Primitive::Bytes) | (Primitive::Bytes, Primitive::String)
            )
    }
}

/// A schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Primitive(Primitive),
    Array(Box<Schema>),
    Map { key: Box<Schema>, elem: Box<Schema> },
    Object(Vec<Field>),
    Union(Vec<Variant>),
    Named(NamedId),
}

/// Structural kind of a schema once named references are looked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Primitive,
    Array,
    Map,
    Object,
    Union,
}

impl SchemaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Primitive => "primitive",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Object => "object",
            SchemaKind::Union => "union",
        }
    }
}

impl Schema {
    pub fn array(elem: Schema) -> Self {
        Schema::Array(Box::new(elem))
    }

    pub fn map(key: Schema, elem: Schema) -> Self {
        Schema::Map {
            key: Box::new(key),
            elem: Box::new(elem),
        }
    }

    pub fn string() -> Self {
        Schema::Primitive(Primitive::String)
    }

    /// Kind of this node, or `None` for a named reference.
    pub fn kind(&self) -> Option<SchemaKind> {
        match self {
            Schema::Primitive(_) => Some(SchemaKind::Primitive),
            Schema::Array(_) => Some(SchemaKind::Array),
            Schema::Map { .. } => Some(SchemaKind::Map),
            Schema::Object(_) => Some(SchemaKind::Object),
            Schema::Union(_) => Some(SchemaKind::Union),
            Schema::Named(_) => None,
        }
    }

    pub fn named_id(&self) -> Option<NamedId> {
        match self {
            Schema::Named(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<Primitive> for Schema {
    fn from(p: Primitive) -> Self {
        Schema::Primitive(p)
    }
}

/// A field of an object schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Logical name, used to match source and target fields.
    pub name: String,
    /// Name of the generated struct field.
    pub wire_name: String,
    pub schema: Schema,
    pub required: bool,
    pub default: Option<serde_json::Value>,
}

impl Field {
    pub fn required(name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        let name = name.into();
        Self {
            wire_name: name.clone(),
            name,
            schema: schema.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        Self {
            required: false,
            ..Self::required(name, schema)
        }
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_wire_name(mut self, wire_name: impl Into<String>) -> Self {
        self.wire_name = wire_name.into();
        self
    }
}

/// A named alternative of a union.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub name: String,
    pub schema: Schema,
}

impl Variant {
    pub fn new(name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct NamedDef {
    name: String,
    schema: Option<Schema>,
}

/// Arena of named type definitions.
#[derive(Debug, Clone, Default)]
pub struct TypeSet {
    defs: Vec<NamedDef>,
    by_name: HashMap<String, NamedId>,
}

impl TypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a name without a body. Declaring an existing name returns its id.
    pub fn declare(&mut self, name: impl Into<String>) -> NamedId {
        let name = name.into();
        if let Some(id) = self.by_name.get(&name) {
            return *id;
        }
        let id = NamedId(self.defs.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.defs.push(NamedDef { name, schema: None });
        id
    }

    /// Set the body of a declared name, replacing any previous body.
    pub fn define(&mut self, id: NamedId, schema: Schema) {
        if let Some(def) = self.defs.get_mut(id.index()) {
            def.schema = Some(schema);
        }
    }

    /// Declare and define in one step.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) -> NamedId {
        let id = self.declare(name);
        self.define(id, schema);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<NamedId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: NamedId) -> &str {
        self.defs
            .get(id.index())
            .map(|d| d.name.as_str())
            .unwrap_or_default()
    }

    /// Body of a named type, one level deep.
    pub fn get(&self, id: NamedId) -> Result<&Schema, TransformError> {
        self.defs
            .get(id.index())
            .and_then(|d| d.schema.as_ref())
            .ok_or_else(|| TransformError::Unbound {
                name: self.name(id).to_string(),
            })
    }

    /// Look through named references until a structural node is reached.
    pub fn resolve<'a>(&'a self, schema: &'a Schema) -> Result<&'a Schema, TransformError> {
        let mut current = schema;
        // A chain longer than the arena can only be an alias cycle.
        for _ in 0..=self.defs.len() {
            match current {
                Schema::Named(id) => current = self.get(*id)?,
                other => return Ok(other),
            }
        }
        Err(TransformError::Unbound {
            name: schema
                .named_id()
                .map(|id| self.name(id).to_string())
                .unwrap_or_default(),
        })
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_then_define_builds_recursive_type() {
        let mut types = TypeSet::new();
        let id = types.declare("Node");
        types.define(
            id,
            Schema::Object(vec![
                Field::required("name", Primitive::String),
                Field::optional("next", Schema::Named(id)),
            ]),
        );

        let Schema::Object(fields) = types.get(id).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(fields[1].schema, Schema::Named(id));
        assert_eq!(types.lookup("Node"), Some(id));
    }

    #[test]
    fn declaring_twice_returns_same_id() {
        let mut types = TypeSet::new();
        let a = types.declare("A");
        let b = types.declare("A");
        assert_eq!(a, b);
        assert_eq!(types.len(), 1);
    }

    #[test]
    fn resolve_follows_aliases() {
        let mut types = TypeSet::new();
        let inner = types.insert("Inner", Schema::string());
        let outer = types.insert("Outer", Schema::Named(inner));
        assert_eq!(
            types.resolve(&Schema::Named(outer)).unwrap(),
            &Schema::string()
        );
    }

    #[test]
    fn alias_cycle_is_unbound() {
        let mut types = TypeSet::new();
        let a = types.declare("A");
        let b = types.insert("B", Schema::Named(a));
        types.define(a, Schema::Named(b));
        assert!(matches!(
            types.resolve(&Schema::Named(a)),
            Err(TransformError::Unbound { .. })
        ));
    }

    #[test]
    fn undefined_name_is_unbound() {
        let mut types = TypeSet::new();
        let id = types.declare("Missing");
        let err = types.get(id).unwrap_err();
        assert_eq!(err.to_string(), "type Missing is declared but never defined");
    }

    #[test]
    fn numeric_primitives_convert() {
        assert!(Primitive::Int32.converts_to(Primitive::Int64));
        assert!(Primitive::String.converts_to(Primitive::Bytes));
        assert!(Primitive::Boolean.converts_to(Primitive::Any));
        assert!(!Primitive::String.converts_to(Primitive::Int));
        assert!(!Primitive::Any.converts_to(Primitive::String));
    }
}
