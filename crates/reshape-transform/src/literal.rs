//! Go literals for default values.
//!
//! Defaults arrive as JSON values and are printed against the schema of the
//! field they initialize, so `["foo", "bar"]` on a `[]string` field becomes
//! `[]string{"foo", "bar"}` and `{"foo": 1}` on a `map[string]int` field
//! becomes `map[string]int{"foo": 1}`.

use crate::attr::{Attr, type_name};
use crate::context::AttributeContext;
use crate::error::TransformError;
use crate::schema::{Primitive, Schema, TypeSet};
use crate::scope::goify;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::Write;

/// Render `value` as a Go expression of the type described by `schema`.
pub fn render(
    types: &TypeSet,
    value: &Value,
    schema: &Schema,
    ctx: &AttributeContext,
    path: &str,
) -> Result<String, TransformError> {
    let invalid = |reason: String| TransformError::InvalidDefault {
        path: path.to_string(),
        reason,
    };
    if value.is_null() {
        return Ok("nil".to_string());
    }

    match types.resolve(schema)? {
        Schema::Primitive(p) => primitive(*p, value)
            .ok_or_else(|| invalid(format!("{value} is not a valid {}", p.go_name()))),
        Schema::Array(elem) => {
            let Value::Array(items) = value else {
                return Err(invalid(format!("expected an array, got {value}")));
            };
            let mut out = type_name(types, schema, ctx)?;
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&render(types, item, elem, ctx, &format!("{path}[{i}]"))?);
            }
            out.push('}');
            Ok(out)
        }
        Schema::Map { key, elem } => {
            let Value::Object(entries) = value else {
                return Err(invalid(format!("expected an object, got {value}")));
            };
            let key_kind = match types.resolve(key)? {
                Schema::Primitive(p) => *p,
                _ => return Err(invalid("map keys must be primitives".to_string())),
            };
            let mut out = type_name(types, schema, ctx)?;
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let key_literal = map_key(key_kind, k)
                    .ok_or_else(|| invalid(format!("{k:?} is not a valid {} key", key_kind.go_name())))?;
                let _ = write!(
                    out,
                    "{key_literal}: {}",
                    render(types, v, elem, ctx, &format!("{path}[{k:?}]"))?
                );
            }
            out.push('}');
            Ok(out)
        }
        Schema::Object(fields) => {
            let Value::Object(entries) = value else {
                return Err(invalid(format!("expected an object, got {value}")));
            };
            if let Some(unknown) = entries
                .keys()
                .find(|k| !fields.iter().any(|f| &f.name == *k || &f.wire_name == *k))
            {
                return Err(invalid(format!("unknown field {unknown:?}")));
            }
            let owner = Attr::root(schema, ctx);
            let mut out = owner.struct_literal(types)?;
            out.push('{');
            let mut first = true;
            for field in fields {
                let Some(v) = entries.get(&field.name).or_else(|| entries.get(&field.wire_name))
                else {
                    continue;
                };
                let attr = Attr::of_field(field, Cow::Borrowed(ctx));
                if attr.is_primitive(types)? && attr.is_pointer(types)? {
                    return Err(invalid(format!(
                        "field {} is a pointer and cannot be set from a literal",
                        field.name
                    )));
                }
                if !first {
                    out.push_str(", ");
                }
                first = false;
                let _ = write!(
                    out,
                    "{}: {}",
                    goify(&field.wire_name, true),
                    render(types, v, &field.schema, ctx, &format!("{path}.{}", field.name))?
                );
            }
            out.push('}');
            Ok(out)
        }
        Schema::Union(_) => Err(invalid("union values have no literal form".to_string())),
        Schema::Named(_) => Err(invalid("unresolved type".to_string())),
    }
}

fn primitive(kind: Primitive, value: &Value) -> Option<String> {
    match kind {
        Primitive::Boolean => value.as_bool().map(|b| b.to_string()),
        Primitive::String => value.as_str().map(go_quote),
        Primitive::Bytes => value.as_str().map(|s| format!("[]byte({})", go_quote(s))),
        Primitive::UInt | Primitive::UInt32 | Primitive::UInt64 => {
            value.as_u64().map(|n| n.to_string())
        }
        Primitive::Int | Primitive::Int32 | Primitive::Int64 => {
            value.as_i64().map(|n| n.to_string())
        }
        Primitive::Float32 | Primitive::Float64 => value.as_number().map(|n| n.to_string()),
        Primitive::Any => Some(any(value)),
    }
}

/// A value of Go's `any`, typed by its JSON shape.
fn any(value: &Value) -> String {
    match value {
        Value::Null => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => go_quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(any).collect();
            format!("[]any{{{}}}", items.join(", "))
        }
        Value::Object(entries) => {
            let entries: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", go_quote(k), any(v)))
                .collect();
            format!("map[string]any{{{}}}", entries.join(", "))
        }
    }
}

fn map_key(kind: Primitive, key: &str) -> Option<String> {
    match kind {
        Primitive::String | Primitive::Any => Some(go_quote(key)),
        Primitive::Bytes => None,
        Primitive::Boolean => key.parse::<bool>().ok().map(|b| b.to_string()),
        _ => {
            let parsed: Value = serde_json::from_str(key).ok()?;
            primitive(kind, &parsed)
        }
    }
}

/// Quote a string as a Go interpreted string literal.
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use serde_json::json;

    fn lit(value: Value, schema: &Schema) -> String {
        render(
            &TypeSet::new(),
            &value,
            schema,
            &AttributeContext::use_default(),
            "f",
        )
        .unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(lit(json!(true), &Primitive::Boolean.into()), "true");
        assert_eq!(lit(json!(100), &Primitive::Int.into()), "100");
        assert_eq!(lit(json!(1.5), &Primitive::Float64.into()), "1.5");
        assert_eq!(lit(json!("foo"), &Schema::string()), "\"foo\"");
        assert_eq!(lit(json!(null), &Schema::string()), "nil");
    }

    #[test]
    fn collections() {
        assert_eq!(
            lit(json!(["foo", "bar"]), &Schema::array(Schema::string())),
            r#"[]string{"foo", "bar"}"#
        );
        assert_eq!(
            lit(
                json!({"foo": 1}),
                &Schema::map(Schema::string(), Primitive::Int.into())
            ),
            r#"map[string]int{"foo": 1}"#
        );
        assert_eq!(
            lit(
                json!({"1": [true]}),
                &Schema::map(
                    Primitive::Int.into(),
                    Schema::array(Primitive::Boolean.into())
                )
            ),
            "map[int][]bool{1: []bool{true}}"
        );
    }

    #[test]
    fn named_object() {
        let mut types = TypeSet::new();
        let id = types.insert(
            "Point",
            Schema::Object(vec![
                Field::required("x", Primitive::Int),
                Field::required("y", Primitive::Int),
            ]),
        );
        let out = render(
            &types,
            &json!({"y": 2, "x": 1}),
            &Schema::Named(id),
            &AttributeContext::use_default().with_namespace("geo"),
            "f",
        )
        .unwrap();
        assert_eq!(out, "&geo.Point{X: 1, Y: 2}");
    }

    #[test]
    fn mismatched_default_is_rejected() {
        let err = render(
            &TypeSet::new(),
            &json!("nope"),
            &Primitive::Int.into(),
            &AttributeContext::use_default(),
            "target.Count",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid default value for target.Count: \"nope\" is not a valid int"
        );
        assert!(
            render(
                &TypeSet::new(),
                &json!(-1),
                &Primitive::UInt.into(),
                &AttributeContext::use_default(),
                "f",
            )
            .is_err()
        );
    }

    #[test]
    fn quoting() {
        assert_eq!(go_quote("a\"b\\c\n"), r#""a\"b\\c\n""#);
        assert_eq!(go_quote("\u{1}"), r#""\x01""#);
        assert_eq!(go_quote("héllo"), "\"héllo\"");
    }
}
