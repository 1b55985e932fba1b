//! Go writer for generated transforms.
//!
//! Wraps engine output into complete functions and assembles a file from
//! top-level transforms and their helpers.

use crate::engine::HelperDescriptor;
use std::collections::HashSet;
use std::fmt::Write;

/// A top-level transform ready to be written as a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoFunction {
    pub name: String,
    pub param_type: String,
    pub result_type: String,
    /// Body converting `v` into `res`, as returned by the engine.
    pub code: String,
}

/// Emits Go source.
pub struct GoWriter {
    output: String,
    indent: usize,
}

impl Default for GoWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl GoWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    /// Emit a file holding `functions` followed by `helpers`. Helpers that
    /// share a name are written once.
    pub fn emit_file(
        package: &str,
        functions: &[GoFunction],
        helpers: &[HelperDescriptor],
    ) -> String {
        let mut writer = Self::new();
        let _ = writeln!(writer.output, "package {package}");
        for function in functions {
            writer.output.push('\n');
            writer.write_function(
                &function.name,
                &function.param_type,
                &function.result_type,
                &function.code,
            );
        }
        let mut seen = HashSet::new();
        for helper in helpers {
            if !seen.insert(helper.name.as_str()) {
                continue;
            }
            writer.output.push('\n');
            writer.write_helper(helper);
        }
        writer.output
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push('\t');
        }
    }

    fn write_function(&mut self, name: &str, param: &str, result: &str, body: &str) {
        let _ = writeln!(self.output, "func {name}(v {param}) {result} {{");
        self.indent += 1;
        self.write_block(body);
        self.write_indent();
        self.output.push_str("return res\n");
        self.indent -= 1;
        self.output.push_str("}\n");
    }

    fn write_helper(&mut self, helper: &HelperDescriptor) {
        let _ = writeln!(
            self.output,
            "// {} builds a value of type {} from a value of type {}.",
            helper.name, helper.result_type_ref, helper.param_type_ref
        );
        self.write_function(
            &helper.name,
            &helper.param_type_ref,
            &helper.result_type_ref,
            &helper.body,
        );
    }

    fn write_block(&mut self, code: &str) {
        for line in code.lines() {
            if !line.is_empty() {
                self.write_indent();
            }
            self.output.push_str(line);
            self.output.push('\n');
        }
    }
}

/// A single function converting `v` into `res`.
pub fn render_function(name: &str, param_type: &str, result_type: &str, code: &str) -> String {
    let mut writer = GoWriter::new();
    writer.write_function(name, param_type, result_type, code);
    writer.output
}

/// A helper function with its doc comment.
pub fn render_helper(helper: &HelperDescriptor) -> String {
    let mut writer = GoWriter::new();
    writer.write_helper(helper);
    writer.output
}

/// A complete Go file.
pub fn render_file(package: &str, functions: &[GoFunction], helpers: &[HelperDescriptor]) -> String {
    GoWriter::emit_file(package, functions, helpers)
}
