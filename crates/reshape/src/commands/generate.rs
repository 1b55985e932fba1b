//! Generate command - Go conversion functions from a request document.

use crate::config::ReshapeConfig;
use anyhow::{Context, bail};
use clap::Args;
use rayon::prelude::*;
use reshape_transform::input::{Bound, NamedTransform};
use reshape_transform::{GoFunction, HelperDescriptor, Transformer, goify, render_file};
use std::path::PathBuf;

/// Generate command arguments
#[derive(Args)]
pub struct GenerateArgs {
    /// Request document (JSON)
    pub input: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Go package clause of the generated file
    #[arg(long)]
    pub package: Option<String>,

    /// Prefix of generated helper function names
    #[arg(long)]
    pub helper_prefix: Option<String>,
}

/// Top-level functions and the helpers they share.
#[derive(Debug)]
pub struct Synthesis {
    pub functions: Vec<GoFunction>,
    pub helpers: Vec<HelperDescriptor>,
}

/// Run the generate command
pub fn run(args: GenerateArgs, config: &ReshapeConfig) -> i32 {
    match generate(&args, config) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e:#}");
            1
        }
    }
}

fn generate(args: &GenerateArgs, config: &ReshapeConfig) -> anyhow::Result<()> {
    let bound = super::load_document(&args.input)?;
    let prefix = args
        .helper_prefix
        .as_deref()
        .unwrap_or_else(|| config.transform.helper_prefix());
    let package = args
        .package
        .as_deref()
        .unwrap_or_else(|| config.output.package());

    let synthesis = synthesize(&bound, prefix)?;
    let file = render_file(package, &synthesis.functions, &synthesis.helpers);

    match &args.output {
        Some(path) => {
            std::fs::write(path, &file)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                path = %path.display(),
                functions = synthesis.functions.len(),
                helpers = synthesis.helpers.len(),
                "wrote generated file"
            );
        }
        None => print!("{file}"),
    }
    Ok(())
}

/// Synthesize every transform of `bound`. Requests run in parallel; the
/// result keeps document order.
///
/// Helpers are shared across requests by name. A request whose helpers
/// clash with an earlier request's (same name, different body, as happens
/// for the same types under another pointer policy) is synthesized again
/// with its function name folded into the helper prefix.
pub fn synthesize(bound: &Bound, helper_prefix: &str) -> anyhow::Result<Synthesis> {
    let results = bound
        .transforms
        .par_iter()
        .map(|t| synthesize_one(bound, t, helper_prefix))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut functions = Vec::with_capacity(results.len());
    let mut helpers: Vec<HelperDescriptor> = Vec::new();
    for (t, (function, new_helpers)) in bound.transforms.iter().zip(results) {
        if functions.iter().any(|f: &GoFunction| f.name == function.name) {
            bail!("function {} is generated more than once", function.name);
        }
        let (function, new_helpers) = if clashes(&helpers, &new_helpers) {
            let scoped = format!("{helper_prefix}{}", function.name);
            tracing::debug!(transform = %t.name, prefix = %scoped, "helper names clash, renaming");
            synthesize_one(bound, t, &scoped)?
        } else {
            (function, new_helpers)
        };
        if clashes(&helpers, &new_helpers) {
            bail!("transform {}: helper names clash with an earlier transform", t.name);
        }
        for helper in new_helpers {
            if !helpers.contains(&helper) {
                helpers.push(helper);
            }
        }
        functions.push(function);
    }
    Ok(Synthesis { functions, helpers })
}

fn synthesize_one(
    bound: &Bound,
    t: &NamedTransform,
    helper_prefix: &str,
) -> anyhow::Result<(GoFunction, Vec<HelperDescriptor>)> {
    let result = Transformer::new(&bound.types)
        .with_helper_prefix(helper_prefix)
        .transform(&t.request)
        .with_context(|| format!("transform {}", t.name))?;
    let (param_type, result_type) = t
        .request
        .type_refs(&bound.types)
        .with_context(|| format!("transform {}", t.name))?;
    let function = GoFunction {
        name: goify(&t.name, true),
        param_type,
        result_type,
        code: result.code,
    };
    Ok((function, result.helpers))
}

/// Whether any of `new` reuses a name in `existing` with a different body.
fn clashes(existing: &[HelperDescriptor], new: &[HelperDescriptor]) -> bool {
    new.iter()
        .any(|h| existing.iter().any(|e| e.name == h.name && e != h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reshape_transform::input;

    const ORDERS: &str = r#"{
        "types": [
            { "name": "Item", "schema": { "object": [
                { "name": "sku", "schema": "string", "required": true },
                { "name": "qty", "schema": "int32" }
            ] } },
            { "name": "Order", "schema": { "object": [
                { "name": "items", "schema": { "array": "Item" }, "required": true },
                { "name": "first", "schema": "Item" }
            ] } }
        ],
        "transforms": [
            { "name": "copy_order", "source": "Order", "target": "Order" },
            { "name": "copy_item", "source": "Item", "target": "Item" },
            { "name": "copy_items", "source": { "array": "Item" }, "target": { "array": "Item" } }
        ]
    }"#;

    #[test]
    fn helpers_are_shared_across_transforms() {
        let bound = input::parse(ORDERS).unwrap();
        let synthesis = synthesize(&bound, "transform").unwrap();
        let names: Vec<_> = synthesis.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["CopyOrder", "CopyItem", "CopyItems"]);
        assert_eq!(synthesis.functions[2].param_type, "[]*Item");
        let helpers: Vec<_> = synthesis.helpers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(helpers, ["transformItemToItem"]);
    }

    #[test]
    fn clashing_helpers_are_scoped_to_their_transform() {
        let doc = ORDERS.replace(
            r#"{ "name": "copy_item", "source": "Item", "target": "Item" },"#,
            r#"{ "name": "copy_order_ptr", "source": "Order", "target": "Order",
                 "source_context": { "pointer_policy": "all_pointers" } },"#,
        );
        let bound = input::parse(&doc).unwrap();
        let synthesis = synthesize(&bound, "transform").unwrap();
        let helpers: Vec<_> = synthesis.helpers.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(
            helpers,
            ["transformItemToItem", "transformCopyOrderPtrItemToItem"]
        );
        assert!(synthesis.helpers[1].body.contains("Sku: *v.Sku,"));
        assert!(
            synthesis.functions[1]
                .code
                .contains("= transformCopyOrderPtrItemToItem(val)")
        );
        // the array transform reuses the unscoped helper
        assert!(synthesis.functions[2].code.contains("= transformItemToItem(val)"));
    }

    #[test]
    fn synthesis_is_deterministic() {
        let bound = input::parse(ORDERS).unwrap();
        let a = render_file("p", &synthesize(&bound, "x").unwrap().functions, &[]);
        let b = render_file("p", &synthesize(&bound, "x").unwrap().functions, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn failing_transform_is_named() {
        let bound = input::parse(
            r#"{ "transforms": [ { "name": "bad", "source": "string", "target": { "array": "string" } } ] }"#,
        )
        .unwrap();
        let err = synthesize(&bound, "transform").unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "transform bad: v is a string but res type is array"
        );
    }

    #[test]
    fn generate_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("orders.json");
        let output = dir.path().join("orders.go");
        std::fs::write(&input, ORDERS).unwrap();
        let args = GenerateArgs {
            input,
            output: Some(output.clone()),
            package: Some("orders".into()),
            helper_prefix: None,
        };
        assert_eq!(run(args, &ReshapeConfig::default()), 0);
        let file = std::fs::read_to_string(output).unwrap();
        assert!(file.starts_with("package orders\n"));
        assert!(file.contains("func CopyOrder(v *Order) *Order {"));
        assert_eq!(file.matches("func transformItemToItem(").count(), 1);
    }
}
