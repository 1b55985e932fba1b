//! Check command - synthesize every request and report failures.

use crate::config::ReshapeConfig;
use clap::Args;
use rayon::prelude::*;
use reshape_transform::Transformer;
use reshape_transform::input::Bound;
use serde::Serialize;
use std::path::PathBuf;

/// Check command arguments
#[derive(Args)]
pub struct CheckArgs {
    /// Request document (JSON)
    pub input: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome of one request.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub helpers: usize,
}

/// Run the check command
pub fn run(args: CheckArgs, config: &ReshapeConfig) -> i32 {
    let bound = match super::load_document(&args.input) {
        Ok(bound) => bound,
        Err(e) => {
            eprintln!("error: {e:#}");
            return 1;
        }
    };
    let reports = check(&bound, config.transform.helper_prefix());

    if args.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                return 1;
            }
        }
    } else {
        for report in &reports {
            match &report.error {
                None => println!("ok    {} ({} helpers)", report.name, report.helpers),
                Some(error) => println!("FAIL  {}: {error}", report.name),
            }
        }
    }

    if reports.iter().all(|r| r.ok) { 0 } else { 1 }
}

/// Synthesize each request independently and collect the outcomes in
/// document order.
pub fn check(bound: &Bound, helper_prefix: &str) -> Vec<CheckReport> {
    let transformer = Transformer::new(&bound.types).with_helper_prefix(helper_prefix);
    bound
        .transforms
        .par_iter()
        .map(|t| match transformer.transform(&t.request) {
            Ok(result) => CheckReport {
                name: t.name.clone(),
                ok: true,
                error: None,
                helpers: result.helpers.len(),
            },
            Err(e) => {
                tracing::debug!(transform = %t.name, error = %e, "check failed");
                CheckReport {
                    name: t.name.clone(),
                    ok: false,
                    error: Some(e.to_string()),
                    helpers: 0,
                }
            }
        })
        .collect()
}
