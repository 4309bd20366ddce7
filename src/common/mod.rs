//! Common module - shared traits and utilities
//!
//! Repository editors live here so that both the library entry points and the CLI
//! can share them.

pub mod traits;
pub mod utils;

pub use traits::*;
pub use utils::*;
