//! Utilities for schema_codegen
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

// Re-export key utility functions
pub use logging::init_logging;
pub use naming::{apply_naming_convention, sanitize_identifier, table_name_from_file, Casing};
