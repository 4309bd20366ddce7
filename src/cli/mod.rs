//! Command line interface module
//!
//! Argument parsing, configuration assembly and the runner behind the `archive-retag`
//! binary.

pub mod args;
pub mod config;
pub mod runner;

pub use args::{Args, Command};
pub use config::RetagConfig;
pub use runner::Runner;
