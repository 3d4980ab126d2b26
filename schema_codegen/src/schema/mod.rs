//! Schema module for schema_codegen
//!
//! This module holds the table model and the readers that build it from DDL
//! scripts and CSV samples.

pub mod csv;
pub mod ddl;
pub mod parser;
pub mod types;

// Re-export key types
pub use parser::{parse, parse_into, InputKind, ParseOptions};
pub use types::{CanonicalType, Column, Schema, Table, TypeKind};
