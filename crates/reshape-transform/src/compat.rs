//! Compatibility checking between a source and a target schema.
//!
//! The check is shallow for objects: two objects are always compatible and
//! field pairs are checked when the engine reaches them. Arrays, maps and
//! unions are checked recursively. The checker holds no state between calls.

use crate::error::TransformError;
use crate::schema::{Field, Primitive, Schema, TypeSet};
use crate::scope::goify;
use std::collections::HashSet;

/// Verify that `source` can be converted into `target`.
///
/// The paths are the expressions used in error messages, e.g. `source.Items`.
pub fn check(
    types: &TypeSet,
    source: &Schema,
    target: &Schema,
    source_path: &str,
    target_path: &str,
) -> Result<(), TransformError> {
    let mut checker = Checker {
        types,
        visited: HashSet::new(),
    };
    checker
        .check(source, target, source_path, target_path)
        .inspect_err(|e| tracing::debug!(error = %e, "compatibility check failed"))
}

/// Position of the `type` and `value` fields of a discriminated pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PairFields {
    pub type_field: usize,
    pub value_field: usize,
}

/// Recognize an object that encodes a union as a `type` tag plus an
/// opaque `value`.
pub(crate) fn discriminated_pair(
    types: &TypeSet,
    fields: &[Field],
) -> Result<Option<PairFields>, TransformError> {
    let mut type_field = None;
    let mut value_field = None;
    for (i, field) in fields.iter().enumerate() {
        let Schema::Primitive(p) = types.resolve(&field.schema)? else {
            continue;
        };
        if field.name.eq_ignore_ascii_case("type") && *p == Primitive::String {
            type_field = Some(i);
        } else if field.name.eq_ignore_ascii_case("value")
            && matches!(p, Primitive::String | Primitive::Bytes)
        {
            value_field = Some(i);
        }
    }
    Ok(type_field.zip(value_field).map(|(type_field, value_field)| PairFields {
        type_field,
        value_field,
    }))
}

struct Checker<'a> {
    types: &'a TypeSet,
    /// Node pairs already entered through a named reference. Arena nodes do
    /// not move during a check, so addresses identify positions.
    visited: HashSet<(*const Schema, *const Schema)>,
}

impl Checker<'_> {
    fn check(
        &mut self,
        source: &Schema,
        target: &Schema,
        source_path: &str,
        target_path: &str,
    ) -> Result<(), TransformError> {
        let named = matches!(source, Schema::Named(_)) || matches!(target, Schema::Named(_));
        if named && !self.visited.insert((source as *const Schema, target as *const Schema)) {
            return Ok(());
        }

        let types = self.types;
        let s = types.resolve(source)?;
        let t = types.resolve(target)?;
        let mismatch = || {
            TransformError::incompatible(
                source_path,
                &kind_label(s),
                target_path,
                &type_label(types, target, t),
            )
        };

        match (s, t) {
            (Schema::Primitive(a), Schema::Primitive(b)) => {
                if a.converts_to(*b) {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            (Schema::Array(a), Schema::Array(b)) => self.check(
                a,
                b,
                &format!("{source_path}[*]"),
                &format!("{target_path}[*]"),
            ),
            (
                Schema::Map {
                    key: sk,
                    elem: se,
                },
                Schema::Map {
                    key: tk,
                    elem: te,
                },
            ) => {
                self.check(
                    sk,
                    tk,
                    &format!("{source_path}.key"),
                    &format!("{target_path}.key"),
                )?;
                self.check(
                    se,
                    te,
                    &format!("{source_path}[*]"),
                    &format!("{target_path}[*]"),
                )
            }
            (Schema::Object(_), Schema::Object(_)) => Ok(()),
            (Schema::Union(sv), Schema::Union(tv)) => {
                let source_type = type_label(types, source, s);
                let target_type = type_label(types, target, t);
                if sv.len() != tv.len() {
                    return Err(TransformError::UnionArityMismatch {
                        source_type,
                        target_type,
                        source_count: sv.len(),
                        target_count: tv.len(),
                    });
                }
                for (index, (a, b)) in sv.iter().zip(tv).enumerate() {
                    self.check(
                        &a.schema,
                        &b.schema,
                        &format!("{source_path}.({})", a.name),
                        &format!("{target_path}.({})", b.name),
                    )
                    .map_err(|reason| TransformError::UnionBranchIncompatible {
                        source_type: source_type.clone(),
                        target_type: target_type.clone(),
                        index,
                        reason: Box::new(reason),
                    })?;
                }
                Ok(())
            }
            (Schema::Union(_), Schema::Object(fields))
            | (Schema::Object(fields), Schema::Union(_)) => {
                if discriminated_pair(types, fields)?.is_some() {
                    Ok(())
                } else {
                    Err(mismatch())
                }
            }
            _ => Err(mismatch()),
        }
    }
}

pub(crate) fn kind_label(resolved: &Schema) -> String {
    match resolved {
        Schema::Primitive(p) => p.go_name().to_string(),
        other => other
            .kind()
            .map(|k| k.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

fn type_label(types: &TypeSet, schema: &Schema, resolved: &Schema) -> String {
    match schema {
        Schema::Named(id) => goify(types.name(*id), true),
        _ => kind_label(resolved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Variant;

    fn prim(p: Primitive) -> Schema {
        Schema::Primitive(p)
    }

    #[test]
    fn numeric_widths_are_compatible() {
        let types = TypeSet::new();
        assert!(check(&types, &prim(Primitive::Int32), &prim(Primitive::Float64), "a", "b").is_ok());
    }

    #[test]
    fn array_element_mismatch_reports_path() {
        let types = TypeSet::new();
        let err = check(
            &types,
            &Schema::array(prim(Primitive::String)),
            &Schema::array(Schema::array(prim(Primitive::String))),
            "source.array",
            "target.array",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "source.array[*] is a string but target.array[*] type is array"
        );
    }

    #[test]
    fn map_key_mismatch_reports_path() {
        let types = TypeSet::new();
        let err = check(
            &types,
            &Schema::map(prim(Primitive::Boolean), prim(Primitive::Int)),
            &Schema::map(prim(Primitive::String), prim(Primitive::Int)),
            "body",
            "res",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "body.key is a bool but res.key type is string");
    }

    #[test]
    fn objects_are_always_compatible() {
        let types = TypeSet::new();
        let a = Schema::Object(vec![Field::required("x", Primitive::String)]);
        let b = Schema::Object(vec![Field::required("x", Schema::array(Schema::string()))]);
        assert!(check(&types, &a, &b, "a", "b").is_ok());
    }

    #[test]
    fn kind_mismatch_names_target_type() {
        let mut types = TypeSet::new();
        let user = types.insert("user", Schema::Object(vec![]));
        let err = check(
            &types,
            &Schema::array(Schema::string()),
            &Schema::Named(user),
            "source",
            "target",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "source is an array but target type is User");
    }

    #[test]
    fn union_arity_mismatch() {
        let mut types = TypeSet::new();
        let a = types.insert(
            "A",
            Schema::Union(vec![
                Variant::new("s", Primitive::String),
                Variant::new("i", Primitive::Int),
            ]),
        );
        let b = types.insert(
            "B",
            Schema::Union(vec![
                Variant::new("s", Primitive::String),
                Variant::new("i", Primitive::Int),
                Variant::new("f", Primitive::Float64),
            ]),
        );
        let err = check(&types, &Schema::Named(a), &Schema::Named(b), "v", "res").unwrap_err();
        assert_eq!(
            err,
            TransformError::UnionArityMismatch {
                source_type: "A".into(),
                target_type: "B".into(),
                source_count: 2,
                target_count: 3,
            }
        );
        assert!(err.to_string().contains("source has 2 variants but target has 3"));
    }

    #[test]
    fn union_branch_mismatch_names_index() {
        let mut types = TypeSet::new();
        let a = types.insert(
            "A",
            Schema::Union(vec![
                Variant::new("s", Primitive::String),
                Variant::new("l", Schema::array(Schema::string())),
            ]),
        );
        let b = types.insert(
            "B",
            Schema::Union(vec![
                Variant::new("s", Primitive::String),
                Variant::new("l", Schema::map(Schema::string(), Schema::string())),
            ]),
        );
        let err = check(&types, &Schema::Named(a), &Schema::Named(b), "v", "res").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot transform union A to B: type at index 1: v.(l) is an array but res.(l) type is map"
        );
    }

    #[test]
    fn union_to_discriminated_pair() {
        let mut types = TypeSet::new();
        let union = types.insert(
            "Value",
            Schema::Union(vec![Variant::new("s", Primitive::String)]),
        );
        let pair = types.insert(
            "ValueBody",
            Schema::Object(vec![
                Field::required("Type", Primitive::String),
                Field::required("Value", Primitive::String),
            ]),
        );
        let plain = types.insert(
            "Plain",
            Schema::Object(vec![Field::required("name", Primitive::String)]),
        );
        assert!(check(&types, &Schema::Named(union), &Schema::Named(pair), "a", "b").is_ok());
        assert!(check(&types, &Schema::Named(pair), &Schema::Named(union), "a", "b").is_ok());
        assert!(check(&types, &Schema::Named(union), &Schema::Named(plain), "a", "b").is_err());
    }

    #[test]
    fn recursive_arrays_terminate() {
        let mut types = TypeSet::new();
        let a = types.declare("A");
        types.define(a, Schema::array(Schema::Named(a)));
        let b = types.declare("B");
        types.define(b, Schema::array(Schema::array(Schema::Named(b))));
        assert!(check(&types, &Schema::Named(a), &Schema::Named(b), "s", "t").is_ok());
    }
}
