//! Transform engine.
//!
//! Given a source and a target schema plus the variables holding them, the
//! engine emits Go statements that build the target from the source. Nested
//! conversions between two named composite types are not inlined: they call
//! a helper function, and the helper's descriptor is returned next to the
//! code. Helpers are memoized per (source type, target type, contexts), and
//! the memo entry is written before the helper body is generated, so a type
//! that refers to itself produces a helper that calls itself.
//!
//! All mutable state lives in an [`Engine`] built for one call. A
//! [`Transformer`] is immutable and can serve many threads at once.

use crate::attr::{self, Attr};
use crate::compat::{self, PairFields, discriminated_pair};
use crate::context::{AttributeContext, ContextSignature};
use crate::error::TransformError;
use crate::literal;
use crate::schema::{Field, NamedId, Schema, TypeSet, Variant};
use crate::scope::{DEFAULT_HELPER_PREFIX, NameScope, goify};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// A generated helper function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelperDescriptor {
    pub name: String,
    /// Go type of the helper's single parameter `v`.
    pub param_type_ref: String,
    /// Go type of the helper's result `res`.
    pub result_type_ref: String,
    /// Statements of the body, without the signature and final `return res`.
    pub body: String,
}

/// Output of one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub code: String,
    /// Helpers referenced by `code` or by other helpers, in creation order.
    pub helpers: Vec<HelperDescriptor>,
}

/// One conversion to synthesize.
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub source: Schema,
    pub target: Schema,
    pub source_var: String,
    pub target_var: String,
    pub source_ctx: AttributeContext,
    pub target_ctx: AttributeContext,
    /// Declare the target variable (`:=`) instead of assigning it.
    pub new_var: bool,
}

impl TransformRequest {
    pub fn new(source: Schema, target: Schema) -> Self {
        Self {
            source,
            target,
            source_var: "source".to_string(),
            target_var: "target".to_string(),
            source_ctx: AttributeContext::default(),
            target_ctx: AttributeContext::default(),
            new_var: true,
        }
    }

    pub fn with_vars(mut self, source_var: impl Into<String>, target_var: impl Into<String>) -> Self {
        self.source_var = source_var.into();
        self.target_var = target_var.into();
        self
    }

    pub fn with_contexts(mut self, source_ctx: AttributeContext, target_ctx: AttributeContext) -> Self {
        self.source_ctx = source_ctx;
        self.target_ctx = target_ctx;
        self
    }

    pub fn with_new_var(mut self, new_var: bool) -> Self {
        self.new_var = new_var;
        self
    }

    /// Go types of the source and target values.
    pub fn type_refs(&self, types: &TypeSet) -> Result<(String, String), TransformError> {
        Ok((
            attr::type_ref(types, &self.source, &self.source_ctx)?,
            attr::type_ref(types, &self.target, &self.target_ctx)?,
        ))
    }
}

/// Entry point bound to a set of named types.
#[derive(Debug, Clone)]
pub struct Transformer<'a> {
    types: &'a TypeSet,
    helper_prefix: String,
}

impl<'a> Transformer<'a> {
    pub fn new(types: &'a TypeSet) -> Self {
        Self {
            types,
            helper_prefix: DEFAULT_HELPER_PREFIX.to_string(),
        }
    }

    pub fn with_helper_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.helper_prefix = prefix.into();
        self
    }

    pub fn helper_prefix(&self) -> &str {
        &self.helper_prefix
    }

    /// Generate the code converting `request.source_var` into
    /// `request.target_var`, plus the helpers that code depends on.
    pub fn transform(&self, request: &TransformRequest) -> Result<TransformResult, TransformError> {
        let mut engine = Engine::new(self.types, &self.helper_prefix);
        engine.scope.reserve(&request.source_var);
        engine.scope.reserve(&request.target_var);

        let source = Attr::root(&request.source, &request.source_ctx);
        let target = Attr::root(&request.target, &request.target_ctx);
        let code = engine.transform_attr(
            &source,
            &target,
            &request.source_var,
            &request.target_var,
            request.new_var,
        )?;
        tracing::debug!(
            source = %source.display_name(self.types),
            target = %target.display_name(self.types),
            helpers = engine.helpers.len(),
            "transform generated"
        );
        Ok(TransformResult {
            code: code.trim_end_matches('\n').to_string(),
            helpers: engine.helpers,
        })
    }

    /// Helpers required to convert `source` into `target`, without the
    /// top-level code. Same descriptors as [`Transformer::transform`] returns
    /// for the pair.
    pub fn collect_helpers(
        &self,
        source: &Schema,
        target: &Schema,
        source_ctx: &AttributeContext,
        target_ctx: &AttributeContext,
    ) -> Result<Vec<HelperDescriptor>, TransformError> {
        let request = TransformRequest::new(source.clone(), target.clone())
            .with_contexts(source_ctx.clone(), target_ctx.clone());
        Ok(self.transform(&request)?.helpers)
    }
}

/// Convert `source_var` of schema `source` into `target_var` of schema
/// `target` using the default helper prefix.
#[allow(clippy::too_many_arguments)]
pub fn transform(
    types: &TypeSet,
    source: &Schema,
    target: &Schema,
    source_var: &str,
    target_var: &str,
    source_ctx: &AttributeContext,
    target_ctx: &AttributeContext,
    new_var: bool,
) -> Result<TransformResult, TransformError> {
    let request = TransformRequest {
        source: source.clone(),
        target: target.clone(),
        source_var: source_var.to_string(),
        target_var: target_var.to_string(),
        source_ctx: source_ctx.clone(),
        target_ctx: target_ctx.clone(),
        new_var,
    };
    Transformer::new(types).transform(&request)
}

/// Append the helpers of `new` whose names are not in `existing` yet.
pub fn append_helpers(
    existing: &mut Vec<HelperDescriptor>,
    new: impl IntoIterator<Item = HelperDescriptor>,
) {
    for helper in new {
        if !existing.iter().any(|h| h.name == helper.name) {
            existing.push(helper);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    source: NamedId,
    target: NamedId,
    source_ctx: ContextSignature,
    target_ctx: ContextSignature,
}

/// State of one synthesis call.
struct Engine<'a> {
    types: &'a TypeSet,
    prefix: &'a str,
    scope: NameScope,
    memo: HashMap<MemoKey, String>,
    helpers: Vec<HelperDescriptor>,
    /// Number of array loops enclosing the code being generated.
    array_depth: usize,
}

impl<'a> Engine<'a> {
    fn new(types: &'a TypeSet, prefix: &'a str) -> Self {
        Self {
            types,
            prefix,
            scope: NameScope::new(),
            memo: HashMap::new(),
            helpers: Vec::new(),
            array_depth: 0,
        }
    }

    /// Inline conversion of `sv` into `tv`.
    fn transform_attr(
        &mut self,
        src: &Attr<'_>,
        tgt: &Attr<'_>,
        sv: &str,
        tv: &str,
        new_var: bool,
    ) -> Result<String, TransformError> {
        compat::check(self.types, src.schema, tgt.schema, sv, tv)?;

        if tgt.ctx.is_interface_site && !new_var {
            return self.through_temporary(src, tgt, sv, tv);
        }

        let types = self.types;
        let s = types.resolve(src.schema)?;
        let t = types.resolve(tgt.schema)?;
        tracing::trace!(source = sv, target = tv, "transform");

        match (s, t) {
            (Schema::Primitive(_), Schema::Primitive(_)) => {
                let value = self.convert(src, tgt, sv)?;
                Ok(format!("{tv} {} {value}\n", assign(new_var)))
            }
            (Schema::Array(se), Schema::Array(te)) => {
                self.transform_array(&src.dup(se), &tgt.dup(te), sv, tv, new_var)
            }
            (
                Schema::Map {
                    key: sk,
                    elem: se,
                },
                Schema::Map {
                    key: tk,
                    elem: te,
                },
            ) => self.transform_map(
                (&src.dup(sk), &src.dup(se)),
                (&tgt.dup(tk), &tgt.dup(te)),
                sv,
                tv,
                new_var,
            ),
            (Schema::Object(sf), Schema::Object(tf)) => {
                self.transform_object(src, tgt, sf, tf, sv, tv, new_var)
            }
            (Schema::Union(su), Schema::Union(tu)) => {
                self.transform_union(src, tgt, su, tu, sv, tv, new_var)
            }
            (Schema::Union(su), Schema::Object(tf)) => match discriminated_pair(types, tf)? {
                Some(pair) => self.union_to_pair(src, tgt, su, tf, pair, sv, tv, new_var),
                None => Err(mismatch(src, tgt, sv, tv, types)),
            },
            (Schema::Object(sf), Schema::Union(tu)) => match discriminated_pair(types, sf)? {
                Some(pair) => self.pair_to_union(src, tgt, sf, pair, tu, sv, tv, new_var),
                None => Err(mismatch(src, tgt, sv, tv, types)),
            },
            _ => Err(mismatch(src, tgt, sv, tv, types)),
        }
    }

    /// Conversion at a nested position. Named composites go through a helper.
    fn nested(
        &mut self,
        src: &Attr<'_>,
        tgt: &Attr<'_>,
        sv: &str,
        tv: &str,
        new_var: bool,
    ) -> Result<String, TransformError> {
        if let (Schema::Named(_), Schema::Named(_)) = (src.schema, tgt.schema) {
            if !src.is_primitive(self.types)? {
                compat::check(self.types, src.schema, tgt.schema, sv, tv)?;
                let name = self.helper(src, tgt)?;
                return Ok(format!("{tv} {} {name}({sv})\n", assign(new_var)));
            }
        }
        self.transform_attr(src, tgt, sv, tv, new_var)
    }

    /// Build the value in a fresh variable of the concrete type, then store
    /// it in the interface slot.
    fn through_temporary(
        &mut self,
        src: &Attr<'_>,
        tgt: &Attr<'_>,
        sv: &str,
        tv: &str,
    ) -> Result<String, TransformError> {
        let tmp = self.scope.unique_name("variant");
        let concrete = tgt.clone().with_interface_site(false);
        let mut code = self.transform_attr(src, &concrete, sv, &tmp, true)?;
        // make builds the structural slice or map; the variant needs its own type
        let value = match (&concrete.alias, self.types.resolve(concrete.schema)?) {
            (Some(alias), Schema::Array(_) | Schema::Map { .. }) => format!("{alias}({tmp})"),
            _ => tmp,
        };
        let _ = writeln!(code, "{tv} = {value}");
        Ok(code)
    }

    /// `expr` converted to the target's Go type when the types differ.
    fn convert(&self, src: &Attr<'_>, tgt: &Attr<'_>, expr: &str) -> Result<String, TransformError> {
        Ok(match self.cast(src, tgt)? {
            Some(ty) => format!("{ty}({expr})"),
            None => expr.to_string(),
        })
    }

    fn cast(&self, src: &Attr<'_>, tgt: &Attr<'_>) -> Result<Option<String>, TransformError> {
        let from = src.type_name(self.types)?;
        let to = tgt.type_name(self.types)?;
        Ok((from != to && to != "any").then_some(to))
    }

    fn transform_array(
        &mut self,
        src_elem: &Attr<'_>,
        tgt_elem: &Attr<'_>,
        sv: &str,
        tv: &str,
        new_var: bool,
    ) -> Result<String, TransformError> {
        let elem_ref = tgt_elem.type_ref(self.types)?;
        let index = self.scope.array_loop_var(self.array_depth);
        let val = self.scope.local("val");

        self.array_depth += 1;
        let body = self.nested(src_elem, tgt_elem, &val, &format!("{tv}[{index}]"), false);
        self.array_depth -= 1;

        let mut out = String::new();
        let _ = writeln!(out, "{tv} {} make([]{elem_ref}, len({sv}))", assign(new_var));
        let _ = writeln!(out, "for {index}, {val} := range {sv} {{");
        out.push_str(&indent(&body?));
        out.push_str("}\n");
        Ok(out)
    }

    fn transform_map(
        &mut self,
        (src_key, src_elem): (&Attr<'_>, &Attr<'_>),
        (tgt_key, tgt_elem): (&Attr<'_>, &Attr<'_>),
        sv: &str,
        tv: &str,
        new_var: bool,
    ) -> Result<String, TransformError> {
        let key_ref = tgt_key.type_ref(self.types)?;
        let elem_ref = tgt_elem.type_ref(self.types)?;
        let depth = map_depth(self.types, tgt_elem.schema, &mut HashSet::new())?;
        let key = self.scope.local("key");
        let val = self.scope.local("val");
        let tk = self.scope.local("tk");
        let tvn = self.scope.map_value_var(depth);

        let mut body = self.nested(src_key, tgt_key, &key, &tk, true)?;
        body.push_str(&self.nested(src_elem, tgt_elem, &val, &tvn, true)?);
        let _ = writeln!(body, "{tv}[{tk}] = {tvn}");

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{tv} {} make(map[{key_ref}]{elem_ref}, len({sv}))",
            assign(new_var)
        );
        let _ = writeln!(out, "for {key}, {val} := range {sv} {{");
        out.push_str(&indent(&body));
        out.push_str("}\n");
        Ok(out)
    }

    /// Two passes over the fields matched by logical name. The first builds
    /// one composite literal from the primitive fields that can be assigned
    /// directly. The second converts nested composites and fills defaults.
    #[allow(clippy::too_many_arguments)]
    fn transform_object(
        &mut self,
        src: &Attr<'_>,
        tgt: &Attr<'_>,
        src_fields: &[Field],
        tgt_fields: &[Field],
        sv: &str,
        tv: &str,
        new_var: bool,
    ) -> Result<String, TransformError> {
        let types = self.types;
        let matched: Vec<(&Field, &Field)> = src_fields
            .iter()
            .filter_map(|sf| {
                tgt_fields
                    .iter()
                    .find(|tf| tf.name == sf.name)
                    .map(|tf| (sf, tf))
            })
            .collect();

        let mut init = String::new();
        let mut post = String::new();
        for (sf, tf) in &matched {
            let sa = src.field(sf);
            let ta = tgt.field(tf);
            let src_expr = format!("{sv}.{}", goify(&sf.wire_name, true));
            let tgt_name = goify(&tf.wire_name, true);
            let tgt_expr = format!("{tv}.{tgt_name}");
            compat::check(types, &sf.schema, &tf.schema, &src_expr, &tgt_expr)?;
            if !sa.is_primitive(types)? {
                continue;
            }

            let src_ptr = sa.is_pointer(types)?;
            let tgt_ptr = ta.is_pointer(types)?;
            let cast = self.cast(&sa, &ta)?;
            let deref = if src_ptr { "*" } else { "" };
            match (src_ptr, tgt_ptr, cast) {
                (true, false, _) if !sf.required => {
                    let value = self.convert(&sa, &ta, &format!("*{src_expr}"))?;
                    let _ = write!(
                        post,
                        "if {src_expr} != nil {{\n\t{tgt_expr} = {value}\n}}\n"
                    );
                }
                (_, true, Some(ty)) => {
                    let tmp = self
                        .scope
                        .unique_name(&format!("{}ptr", goify(&tf.wire_name, false)));
                    let stmt = format!("{tmp} := {ty}({deref}{src_expr})\n{tgt_expr} = &{tmp}\n");
                    if src_ptr && !sf.required {
                        let _ = write!(post, "if {src_expr} != nil {{\n{}}}\n", indent(&stmt));
                    } else {
                        post.push_str(&stmt);
                    }
                }
                (false, true, None) => {
                    let _ = write!(init, "\n\t{tgt_name}: &{src_expr},");
                }
                (true, true, None) => {
                    let _ = write!(init, "\n\t{tgt_name}: {src_expr},");
                }
                (_, false, _) => {
                    let value = self.convert(&sa, &ta, &format!("{deref}{src_expr}"))?;
                    let _ = write!(init, "\n\t{tgt_name}: {value},");
                }
            }
        }
        if !init.is_empty() {
            init.push('\n');
        }

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{tv} {} {}{{{init}}}",
            assign(new_var),
            tgt.struct_literal(types)?
        );
        out.push_str(&post);

        for (sf, tf) in &matched {
            let sa = src.field(sf);
            let ta = tgt.field(tf);
            let src_expr = format!("{sv}.{}", goify(&sf.wire_name, true));
            let tgt_expr = format!("{tv}.{}", goify(&tf.wire_name, true));
            let src_ptr = sa.is_pointer(types)?;

            let mut code = if sa.is_primitive(types)? {
                String::new()
            } else {
                self.nested(&sa, &ta, &src_expr, &tgt_expr, false)?
            };
            if !code.is_empty() && src_ptr {
                code = format!("if {src_expr} != nil {{\n{}}}\n", indent(&code));
            }

            if let Some(default) = ta.default_value() {
                if src_ptr {
                    let lit = literal::render(types, default, &tf.schema, &ta.ctx, &tgt_expr)?;
                    if ta.is_primitive(types)? && ta.is_pointer(types)? {
                        let tmp = self.scope.unique_name("tmp");
                        let ty = ta.type_name(types)?;
                        let _ = write!(
                            code,
                            "if {src_expr} == nil {{\n\tvar {tmp} {ty} = {lit}\n\t{tgt_expr} = &{tmp}\n}}\n"
                        );
                    } else {
                        let _ = write!(code, "if {src_expr} == nil {{\n\t{tgt_expr} = {lit}\n}}\n");
                    }
                }
            }
            out.push_str(&code);
        }
        Ok(out)
    }

    /// A type switch over the variant held by the source, one case per
    /// variant pair in declaration order.
    #[allow(clippy::too_many_arguments)]
    fn transform_union(
        &mut self,
        src: &Attr<'_>,
        tgt: &Attr<'_>,
        src_variants: &[Variant],
        tgt_variants: &[Variant],
        sv: &str,
        tv: &str,
        new_var: bool,
    ) -> Result<String, TransformError> {
        let types = self.types;
        let mut out = String::new();
        if new_var {
            let _ = writeln!(out, "var {tv} {}", tgt.type_ref(types)?);
        }
        let actual = self.scope.local("actual");
        let _ = writeln!(out, "switch {actual} := {sv}.(type) {{");
        for (sv_variant, tv_variant) in src_variants.iter().zip(tgt_variants) {
            let sa = variant_attr(types, src, sv_variant);
            let ta = variant_attr(types, tgt, tv_variant).with_interface_site(true);
            let _ = writeln!(out, "case {}:", sa.type_ref(types)?);
            let body = if sa.is_primitive(types)? {
                format!("{tv} = {}({actual})\n", ta.type_name(types)?)
            } else {
                self.nested(&sa, &ta, &actual, tv, false)?
            };
            out.push_str(&indent(&body));
        }
        out.push_str("}\n");
        Ok(out)
    }

    /// Encode a union as a discriminated pair: the variant name in the type
    /// field and the JSON encoding of the value in the value field.
    #[allow(clippy::too_many_arguments)]
    fn union_to_pair(
        &mut self,
        src: &Attr<'_>,
        tgt: &Attr<'_>,
        variants: &[Variant],
        tgt_fields: &[Field],
        pair: PairFields,
        sv: &str,
        tv: &str,
        new_var: bool,
    ) -> Result<String, TransformError> {
        let types = self.types;
        let js = self.scope.unique_name("js");
        let name = self.scope.unique_name("name");

        let mut out = String::new();
        let _ = writeln!(out, "{js}, _ := json.Marshal({sv})");
        let _ = writeln!(out, "var {name} string");
        let _ = writeln!(out, "switch {sv}.(type) {{");
        for variant in variants {
            let va = variant_attr(types, src, variant);
            let _ = writeln!(out, "case {}:", va.type_ref(types)?);
            let _ = writeln!(out, "\t{name} = {}", literal::go_quote(&variant.name));
        }
        out.push_str("}\n");

        let type_field = &tgt_fields[pair.type_field];
        let value_field = &tgt_fields[pair.value_field];
        let type_attr = tgt.field(type_field);
        let value_attr = tgt.field(value_field);

        let type_expr = if type_attr.is_pointer(types)? {
            format!("&{name}")
        } else {
            name.clone()
        };
        let value_expr = match types.resolve(&value_field.schema)? {
            Schema::Primitive(p) if p.is_raw() => js.clone(),
            _ if value_attr.is_pointer(types)? => {
                let tmp = self.scope.unique_name("value");
                let _ = writeln!(out, "{tmp} := string({js})");
                format!("&{tmp}")
            }
            _ => format!("string({js})"),
        };

        let _ = writeln!(
            out,
            "{tv} {} {}{{\n\t{}: {type_expr},\n\t{}: {value_expr},\n}}",
            assign(new_var),
            tgt.struct_literal(types)?,
            goify(&type_field.wire_name, true),
            goify(&value_field.wire_name, true),
        );
        Ok(out)
    }

    /// Decode a discriminated pair: switch on the type field's value and
    /// unmarshal the value field into the matching variant.
    #[allow(clippy::too_many_arguments)]
    fn pair_to_union(
        &mut self,
        src: &Attr<'_>,
        tgt: &Attr<'_>,
        src_fields: &[Field],
        pair: PairFields,
        variants: &[Variant],
        sv: &str,
        tv: &str,
        new_var: bool,
    ) -> Result<String, TransformError> {
        let types = self.types;
        let type_field = &src_fields[pair.type_field];
        let value_field = &src_fields[pair.value_field];
        let type_attr = src.field(type_field);
        let value_attr = src.field(value_field);
        let type_expr = format!("{sv}.{}", goify(&type_field.wire_name, true));
        let value_expr = format!("{sv}.{}", goify(&value_field.wire_name, true));
        let type_ptr = type_attr.is_pointer(types)?;
        let value_ptr = value_attr.is_pointer(types)?;

        let discriminator = if type_ptr {
            format!("*{type_expr}")
        } else {
            type_expr.clone()
        };
        let raw = match types.resolve(&value_field.schema)? {
            Schema::Primitive(p) if p.is_raw() => value_expr.clone(),
            _ if value_ptr => format!("[]byte(*{value_expr})"),
            _ => format!("[]byte({value_expr})"),
        };

        let val = self.scope.local("val");
        let mut switch = String::new();
        let _ = writeln!(switch, "switch {discriminator} {{");
        for variant in variants {
            let va = variant_attr(types, tgt, variant);
            let _ = writeln!(switch, "case {}:", literal::go_quote(&variant.name));
            let _ = writeln!(switch, "\tvar {val} {}", va.type_ref(types)?);
            let _ = writeln!(switch, "\tjson.Unmarshal({raw}, &{val})");
            let _ = writeln!(switch, "\t{tv} = {val}");
        }
        switch.push_str("}\n");

        let mut out = String::new();
        if new_var {
            let _ = writeln!(out, "var {tv} {}", tgt.type_ref(types)?);
        }
        let mut guards = Vec::new();
        if type_ptr {
            guards.push(format!("{type_expr} != nil"));
        }
        if value_ptr {
            guards.push(format!("{value_expr} != nil"));
        }
        if guards.is_empty() {
            out.push_str(&switch);
        } else {
            let _ = write!(out, "if {} {{\n{}}}\n", guards.join(" && "), indent(&switch));
        }
        Ok(out)
    }

    /// Name of the helper converting the named `src` into the named `tgt`,
    /// generating it on first use.
    fn helper(&mut self, src: &Attr<'_>, tgt: &Attr<'_>) -> Result<String, TransformError> {
        let types = self.types;
        let (Schema::Named(sid), Schema::Named(tid)) = (src.schema, tgt.schema) else {
            return Err(mismatch(src, tgt, "v", "res", types));
        };
        let key = MemoKey {
            source: *sid,
            target: *tid,
            source_ctx: src.ctx.signature(),
            target_ctx: tgt.ctx.signature(),
        };
        if let Some(name) = self.memo.get(&key) {
            return Ok(name.clone());
        }

        let base = NameScope::helper_name(
            self.prefix,
            &src.display_name(types),
            &tgt.display_name(types),
        );
        let name = self.scope.unique_name(&base);
        self.memo.insert(key, name.clone());
        let slot = self.helpers.len();
        self.helpers.push(HelperDescriptor {
            name: name.clone(),
            param_type_ref: src.type_ref(types)?,
            result_type_ref: tgt.type_ref(types)?,
            body: String::new(),
        });
        tracing::debug!(helper = %name, "reserved transform helper");

        let root_src = Attr {
            required: true,
            default: None,
            alias: None,
            ..src.clone()
        };
        let root_tgt = Attr {
            required: true,
            default: None,
            alias: None,
            ..tgt.clone()
        }
        .with_interface_site(false);
        let saved_depth = std::mem::take(&mut self.array_depth);
        let body = self.transform_attr(&root_src, &root_tgt, "v", "res", true);
        self.array_depth = saved_depth;

        let mut body = body?;
        if !src.required {
            body.insert_str(0, "if v == nil {\n\treturn nil\n}\n");
        }
        self.helpers[slot].body = body;
        tracing::debug!(helper = %name, "generated transform helper");
        Ok(name)
    }
}

fn assign(new_var: bool) -> &'static str {
    if new_var { ":=" } else { "=" }
}

/// Indent every non-empty line by one tab.
fn indent(code: &str) -> String {
    let mut out = String::with_capacity(code.len() + 8);
    for line in code.lines() {
        if !line.is_empty() {
            out.push('\t');
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn mismatch(src: &Attr<'_>, tgt: &Attr<'_>, sv: &str, tv: &str, types: &TypeSet) -> TransformError {
    let kind = types
        .resolve(src.schema)
        .map(compat::kind_label)
        .unwrap_or_else(|_| "type".to_string());
    TransformError::incompatible(sv, &kind, tv, &tgt.display_name(types))
}

/// A variant position of a union. Inline composite variants are generated
/// as their own Go types, named after the union and the variant.
fn variant_attr<'a>(types: &TypeSet, union: &Attr<'a>, variant: &'a Variant) -> Attr<'a> {
    let alias = match variant.schema {
        Schema::Named(_) => None,
        _ => {
            let base = match union.schema {
                Schema::Named(id) => goify(types.name(*id), true),
                _ => String::new(),
            };
            Some(
                union
                    .ctx
                    .qualify(&format!("{base}{}", goify(&variant.name, true))),
            )
        }
    };
    union.dup(&variant.schema).with_alias(alias)
}

/// Number of maps nested under `schema`, looking through arrays, objects
/// and named types.
fn map_depth(
    types: &TypeSet,
    schema: &Schema,
    seen: &mut HashSet<NamedId>,
) -> Result<usize, TransformError> {
    Ok(match schema {
        Schema::Named(id) => {
            if !seen.insert(*id) {
                return Ok(0);
            }
            map_depth(types, types.get(*id)?, seen)?
        }
        Schema::Map { elem, .. } => 1 + map_depth(types, elem, seen)?,
        Schema::Array(elem) => map_depth(types, elem, seen)?,
        Schema::Object(fields) => {
            let mut deepest = 0;
            for field in fields {
                deepest = deepest.max(map_depth(types, &field.schema, seen)?);
            }
            deepest
        }
        Schema::Primitive(_) | Schema::Union(_) => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Primitive;

    #[test]
    fn indent_skips_blank_lines() {
        assert_eq!(indent("a\n\nb\n"), "\ta\n\n\tb\n");
    }

    #[test]
    fn map_depth_counts_nested_maps() {
        let types = TypeSet::new();
        let inner = Schema::map(Primitive::Float64.into(), Primitive::UInt64.into());
        let middle = Schema::map(Primitive::Int.into(), inner.clone());
        assert_eq!(map_depth(&types, &inner, &mut HashSet::new()).unwrap(), 1);
        assert_eq!(map_depth(&types, &middle, &mut HashSet::new()).unwrap(), 2);
        assert_eq!(
            map_depth(&types, &Primitive::Int.into(), &mut HashSet::new()).unwrap(),
            0
        );
    }

    #[test]
    fn map_depth_terminates_on_recursive_types() {
        let mut types = TypeSet::new();
        let id = types.declare("Tree");
        types.define(
            id,
            Schema::Object(vec![Field::optional(
                "children",
                Schema::map(Schema::string(), Schema::Named(id)),
            )]),
        );
        assert_eq!(
            map_depth(&types, &Schema::Named(id), &mut HashSet::new()).unwrap(),
            1
        );
    }

    #[test]
    fn append_helpers_dedups_by_name() {
        let helper = |name: &str| HelperDescriptor {
            name: name.to_string(),
            param_type_ref: "*A".into(),
            result_type_ref: "*B".into(),
            body: String::new(),
        };
        let mut all = vec![helper("a")];
        append_helpers(&mut all, vec![helper("a"), helper("b"), helper("b")]);
        let names: Vec<_> = all.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
