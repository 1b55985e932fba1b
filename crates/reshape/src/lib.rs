//! Command-line front end for `reshape-transform`.
//!
//! Reads a JSON request document, synthesizes every requested conversion in
//! parallel and writes one Go file.

pub mod commands;
pub mod config;
