//! Attribute analysis: one schema position plus the policy that renders it.
//!
//! The engine never looks at a bare [`Schema`]; it wraps each position in an
//! [`Attr`] that knows whether the value is required, which default applies
//! and how its Go type is spelled under the active [`AttributeContext`].

use crate::context::{AttributeContext, PointerPolicy};
use crate::error::TransformError;
use crate::schema::{Field, Schema, TypeSet};
use crate::scope::goify;
use std::borrow::Cow;

#[derive(Debug, Clone)]
pub(crate) struct Attr<'a> {
    pub schema: &'a Schema,
    pub required: bool,
    pub default: Option<&'a serde_json::Value>,
    pub ctx: Cow<'a, AttributeContext>,
    /// Go type name for an anonymous composite that is generated as its own
    /// type, such as an inline union variant.
    pub alias: Option<String>,
}

impl<'a> Attr<'a> {
    pub fn root(schema: &'a Schema, ctx: &'a AttributeContext) -> Self {
        Self {
            schema,
            required: true,
            default: None,
            ctx: Cow::Borrowed(ctx),
            alias: None,
        }
    }

    pub fn of_field(field: &'a Field, ctx: Cow<'a, AttributeContext>) -> Self {
        Self {
            schema: &field.schema,
            required: field.required,
            default: field.default.as_ref(),
            ctx,
            alias: None,
        }
    }

    /// A field of this object. Fields are never interface sites.
    pub fn field(&self, field: &'a Field) -> Attr<'a> {
        Attr::of_field(field, self.ctx.clone()).with_interface_site(false)
    }

    /// A required, default-free position sharing this context (array
    /// elements, map keys and values, union variants).
    pub fn dup(&self, schema: &'a Schema) -> Attr<'a> {
        Attr {
            schema,
            required: true,
            default: None,
            ctx: self.ctx.clone(),
            alias: None,
        }
        .with_interface_site(false)
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn with_interface_site(mut self, is_interface_site: bool) -> Self {
        if self.ctx.is_interface_site != is_interface_site {
            self.ctx.to_mut().is_interface_site = is_interface_site;
        }
        self
    }

    /// Default value, only when this side materializes defaults.
    pub fn default_value(&self) -> Option<&'a serde_json::Value> {
        if self.ctx.materialize_defaults {
            self.default
        } else {
            None
        }
    }

    /// Whether the value may be nil. For primitives this is also whether the
    /// Go field is a pointer.
    pub fn is_pointer(&self, types: &TypeSet) -> Result<bool, TransformError> {
        if let Schema::Primitive(p) = types.resolve(self.schema)? {
            if p.is_raw() {
                return Ok(false);
            }
        }
        if self.ctx.pointer_policy == PointerPolicy::AllPointers {
            return Ok(true);
        }
        Ok(!self.required && self.default_value().is_none())
    }

    pub fn is_primitive(&self, types: &TypeSet) -> Result<bool, TransformError> {
        Ok(matches!(types.resolve(self.schema)?, Schema::Primitive(_)))
    }

    /// Go type of a value at this position.
    pub fn type_ref(&self, types: &TypeSet) -> Result<String, TransformError> {
        match &self.alias {
            Some(alias) if !matches!(self.schema, Schema::Named(_)) => {
                if matches!(self.schema, Schema::Object(_)) {
                    Ok(format!("*{alias}"))
                } else {
                    Ok(alias.clone())
                }
            }
            _ => type_ref(types, self.schema, &self.ctx),
        }
    }

    /// Go type name without the pointer of named objects, as used in
    /// composite literals and conversions.
    pub fn type_name(&self, types: &TypeSet) -> Result<String, TransformError> {
        match &self.alias {
            Some(alias) if !matches!(self.schema, Schema::Named(_)) => Ok(alias.clone()),
            _ => type_name(types, self.schema, &self.ctx),
        }
    }

    /// Name used to identify this type in helper names and error messages.
    pub fn display_name(&self, types: &TypeSet) -> String {
        match self.schema {
            Schema::Named(id) => self.ctx.qualify(&goify(types.name(*id), true)),
            other => match &self.alias {
                Some(alias) => alias.clone(),
                None => other.kind().map(|k| k.as_str()).unwrap_or("type").to_string(),
            },
        }
    }

    /// Literal prefix and type for constructing a struct value of this type.
    pub fn struct_literal(&self, types: &TypeSet) -> Result<String, TransformError> {
        Ok(format!("&{}", self.type_name(types)?))
    }
}

/// Go type reference of `schema` under `ctx`. Objects, named or inline, are
/// pointers.
pub(crate) fn type_ref(
    types: &TypeSet,
    schema: &Schema,
    ctx: &AttributeContext,
) -> Result<String, TransformError> {
    if let Schema::Named(id) = schema {
        let name = ctx.qualify(&goify(types.name(*id), true));
        return Ok(match types.resolve(schema)? {
            Schema::Object(_) => format!("*{name}"),
            _ => name,
        });
    }
    let name = type_name(types, schema, ctx)?;
    Ok(match schema {
        Schema::Object(_) => format!("*{name}"),
        _ => name,
    })
}

/// Go type name of `schema` under `ctx`, without a pointer for named objects.
pub(crate) fn type_name(
    types: &TypeSet,
    schema: &Schema,
    ctx: &AttributeContext,
) -> Result<String, TransformError> {
    Ok(match schema {
        Schema::Named(id) => {
            types.get(*id)?;
            ctx.qualify(&goify(types.name(*id), true))
        }
        Schema::Primitive(p) => p.go_name().to_string(),
        Schema::Array(elem) => format!("[]{}", type_ref(types, elem, ctx)?),
        Schema::Map { key, elem } => format!(
            "map[{}]{}",
            type_ref(types, key, ctx)?,
            type_ref(types, elem, ctx)?
        ),
        Schema::Object(fields) => struct_def(types, fields, ctx)?,
        Schema::Union(_) => "any".to_string(),
    })
}

fn struct_def(
    types: &TypeSet,
    fields: &[Field],
    ctx: &AttributeContext,
) -> Result<String, TransformError> {
    if fields.is_empty() {
        return Ok("struct{}".to_string());
    }
    let mut parts = Vec::with_capacity(fields.len());
    for field in fields {
        let attr = Attr::of_field(field, Cow::Borrowed(ctx));
        let ty = type_ref(types, &field.schema, ctx)?;
        let ptr = if attr.is_primitive(types)? && attr.is_pointer(types)? {
            "*"
        } else {
            ""
        };
        parts.push(format!("{} {ptr}{ty}", goify(&field.wire_name, true)));
    }
    Ok(format!("struct{{ {} }}", parts.join("; ")))
}
