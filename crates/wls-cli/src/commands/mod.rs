//! CLI subcommand implementations.

pub mod clear;
pub mod import;
