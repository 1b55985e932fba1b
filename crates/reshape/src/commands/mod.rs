//! Subcommands.

pub mod check;
pub mod generate;

use anyhow::Context;
use reshape_transform::input::{self, Bound};
use std::path::Path;

/// Read and bind a request document.
pub(crate) fn load_document(path: &Path) -> anyhow::Result<Bound> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    input::parse(&json).with_context(|| format!("invalid request document {}", path.display()))
}
