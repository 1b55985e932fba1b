//! Request documents.
//!
//! A document lists named types and the conversions to generate between
//! them:
//!
//! ```json
//! {
//!   "types": [
//!     { "name": "Simple", "schema": { "object": [
//!         { "name": "required_string", "schema": "string", "required": true },
//!         { "name": "default_bool", "schema": "boolean", "default": true }
//!     ] } }
//!   ],
//!   "transforms": [
//!     { "name": "convert_simple", "source": "Simple", "target": "Simple",
//!       "source_context": { "pointer_policy": "all_pointers" },
//!       "target_context": { "materialize_defaults": true } }
//!   ]
//! }
//! ```
//!
//! A schema is a primitive name, a type name, `{"ref": name}`, or one of
//! `{"array": S}`, `{"map": {"key": S, "elem": S}}`, `{"object": [fields]}`
//! and `{"union": [{"name": n, "schema": S}]}`.

use crate::context::AttributeContext;
use crate::engine::TransformRequest;
use crate::schema::{Field, Primitive, Schema, TypeSet, Variant};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("type {0} is defined more than once")]
    DuplicateType(String),

    #[error("unknown type {name} referenced from {context}")]
    UnknownType { name: String, context: String },

    #[error("empty name in {0}")]
    EmptyName(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub transforms: Vec<TransformDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub schema: SchemaDecl,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformDecl {
    pub name: String,
    pub source: SchemaDecl,
    pub target: SchemaDecl,
    #[serde(default)]
    pub source_context: AttributeContext,
    #[serde(default)]
    pub target_context: AttributeContext,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaDecl {
    Primitive(Primitive),
    Composite(CompositeDecl),
    /// Bare type name.
    Name(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeDecl {
    Array(Box<SchemaDecl>),
    Map {
        key: Box<SchemaDecl>,
        elem: Box<SchemaDecl>,
    },
    Object(Vec<FieldDecl>),
    Union(Vec<VariantDecl>),
    Ref(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    /// Struct field name when it differs from the logical name.
    #[serde(default)]
    pub wire_name: Option<String>,
    pub schema: SchemaDecl,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantDecl {
    pub name: String,
    pub schema: SchemaDecl,
}

/// A document with every name resolved.
#[derive(Debug, Clone)]
pub struct Bound {
    pub types: TypeSet,
    pub transforms: Vec<NamedTransform>,
}

/// A conversion to generate, converting `v` into `res`.
#[derive(Debug, Clone)]
pub struct NamedTransform {
    pub name: String,
    pub request: TransformRequest,
}

impl Document {
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        serde_json::from_str(json).map_err(|e| InputError::Parse(e.to_string()))
    }

    /// Resolve type names. All names are declared before any body is
    /// converted, so types may refer to themselves and to each other.
    pub fn bind(&self) -> Result<Bound, InputError> {
        let mut types = TypeSet::new();
        for decl in &self.types {
            if decl.name.is_empty() {
                return Err(InputError::EmptyName("types".to_string()));
            }
            if types.lookup(&decl.name).is_some() {
                return Err(InputError::DuplicateType(decl.name.clone()));
            }
            types.declare(decl.name.as_str());
        }
        for decl in &self.types {
            let schema = convert(&types, &decl.schema, &decl.name)?;
            if let Some(id) = types.lookup(&decl.name) {
                types.define(id, schema);
            }
        }

        let mut transforms = Vec::with_capacity(self.transforms.len());
        for decl in &self.transforms {
            if decl.name.is_empty() {
                return Err(InputError::EmptyName("transforms".to_string()));
            }
            let context = format!("transform {}", decl.name);
            let source = convert(&types, &decl.source, &context)?;
            let target = convert(&types, &decl.target, &context)?;
            let request = TransformRequest::new(source, target)
                .with_vars("v", "res")
                .with_contexts(decl.source_context.clone(), decl.target_context.clone());
            transforms.push(NamedTransform {
                name: decl.name.clone(),
                request,
            });
        }
        Ok(Bound { types, transforms })
    }
}

/// Parse and bind a JSON document.
pub fn parse(json: &str) -> Result<Bound, InputError> {
    Document::from_json(json)?.bind()
}

fn convert(types: &TypeSet, decl: &SchemaDecl, context: &str) -> Result<Schema, InputError> {
    let reference = |name: &str| {
        types
            .lookup(name)
            .map(Schema::Named)
            .ok_or_else(|| InputError::UnknownType {
                name: name.to_string(),
                context: context.to_string(),
            })
    };
    Ok(match decl {
        SchemaDecl::Primitive(p) => Schema::Primitive(*p),
        SchemaDecl::Name(name) => reference(name)?,
        SchemaDecl::Composite(CompositeDecl::Ref(name)) => reference(name)?,
        SchemaDecl::Composite(CompositeDecl::Array(elem)) => {
            Schema::array(convert(types, elem, context)?)
        }
        SchemaDecl::Composite(CompositeDecl::Map { key, elem }) => Schema::map(
            convert(types, key, context)?,
            convert(types, elem, context)?,
        ),
        SchemaDecl::Composite(CompositeDecl::Object(fields)) => {
            let mut out = Vec::with_capacity(fields.len());
            for f in fields {
                if f.name.is_empty() {
                    return Err(InputError::EmptyName(format!("fields of {context}")));
                }
                let mut field = Field::required(f.name.as_str(), convert(types, &f.schema, context)?);
                field.required = f.required;
                field.default = f.default.clone();
                if let Some(wire) = &f.wire_name {
                    field = field.with_wire_name(wire.as_str());
                }
                out.push(field);
            }
            Schema::Object(out)
        }
        SchemaDecl::Composite(CompositeDecl::Union(variants)) => {
            let mut out = Vec::with_capacity(variants.len());
            for v in variants {
                if v.name.is_empty() {
                    return Err(InputError::EmptyName(format!("variants of {context}")));
                }
                out.push(Variant::new(v.name.as_str(), convert(types, &v.schema, context)?));
            }
            Schema::Union(out)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PointerPolicy;

    #[test]
    fn binds_types_and_transforms() {
        let bound = parse(
            r#"{
                "types": [
                    { "name": "Node", "schema": { "object": [
                        { "name": "id", "schema": "int64", "required": true },
                        { "name": "next", "schema": "Node" },
                        { "name": "tags", "schema": { "map": { "key": "string", "elem": { "array": "string" } } } }
                    ] } }
                ],
                "transforms": [
                    { "name": "copy_node", "source": { "ref": "Node" }, "target": "Node",
                      "source_context": { "pointer_policy": "all_pointers" } }
                ]
            }"#,
        )
        .unwrap();

        let node = bound.types.lookup("Node").unwrap();
        let Schema::Object(fields) = bound.types.get(node).unwrap() else {
            panic!("Node should be an object");
        };
        assert_eq!(fields.len(), 3);
        assert!(fields[0].required);
        assert_eq!(fields[1].schema, Schema::Named(node));
        assert_eq!(
            fields[2].schema,
            Schema::map(Schema::string(), Schema::array(Schema::string()))
        );

        let transform = &bound.transforms[0];
        assert_eq!(transform.name, "copy_node");
        assert_eq!(transform.request.source_var, "v");
        assert_eq!(transform.request.target_var, "res");
        assert_eq!(
            transform.request.source_ctx.pointer_policy,
            PointerPolicy::AllPointers
        );
        assert!(!transform.request.target_ctx.materialize_defaults);
    }

    #[test]
    fn field_metadata() {
        let bound = parse(
            r#"{ "types": [ { "name": "T", "schema": { "object": [
                { "name": "user id", "wire_name": "UID", "schema": "string", "default": "x" }
            ] } } ] }"#,
        )
        .unwrap();
        let id = bound.types.lookup("T").unwrap();
        let Schema::Object(fields) = bound.types.get(id).unwrap() else {
            panic!("T should be an object");
        };
        assert_eq!(fields[0].name, "user id");
        assert_eq!(fields[0].wire_name, "UID");
        assert!(!fields[0].required);
        assert_eq!(fields[0].default, Some(serde_json::json!("x")));
    }

    #[test]
    fn unknown_reference() {
        let err = parse(r#"{ "types": [ { "name": "A", "schema": { "array": "B" } } ] }"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown type B referenced from A");
    }

    #[test]
    fn duplicate_type() {
        let err = parse(
            r#"{ "types": [ { "name": "A", "schema": "int" }, { "name": "A", "schema": "string" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, InputError::DuplicateType(name) if name == "A"));
    }

    #[test]
    fn empty_field_name() {
        let err = parse(
            r#"{ "types": [ { "name": "A", "schema": { "object": [ { "name": "", "schema": "int" } ] } } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, InputError::EmptyName(_)));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(parse("{"), Err(InputError::Parse(_))));
    }
}
