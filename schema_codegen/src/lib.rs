//! schema_codegen: generates model source code from DDL scripts and CSV samples
//!
//! A request carries a schema description, a target language and a target
//! RDBMS dialect. The schema is parsed into tables, every column type is
//! resolved to a canonical type, one source unit is emitted per table and the
//! units are packaged as a single file or a zip archive.

pub mod config;
pub mod diagnostics;
pub mod dialect;
pub mod emit;
pub mod error;
pub mod package;
pub mod pipeline;
pub mod response;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location, Severity};
pub use dialect::Dialect;
pub use emit::{CodeEmitter, ColumnAnnotation, EmissionUnit, Language};
pub use error::{Error, Result};
pub use package::{Artifact, ArtifactKind, ArtifactStore, DirectoryStore, MemoryStore, Packager};
pub use pipeline::{GenerationRequest, GenerationResult, Generator};
pub use response::{respond, Endpoint, GenerateResponse, ResponseBody};
pub use schema::{CanonicalType, Column, InputKind, Schema, Table};

use std::sync::Arc;

/// Create a generator from a configuration file
pub fn init(config_path: &str) -> Result<Generator> {
    let config = config::load_from_file(config_path)?;
    utils::logging::init_logging(&config.logging)?;
    Generator::new(Arc::new(config))
}
