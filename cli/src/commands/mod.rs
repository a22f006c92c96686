//! Subcommand implementations.

pub mod config;
pub mod printers;
pub mod run;
