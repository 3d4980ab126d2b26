//! Error types for schema_codegen

use thiserror::Error;

/// Result type for schema_codegen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_codegen
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Type resolution error: {0}")]
    TypeResolutionError(String),

    #[error("Unsupported target: {0}")]
    UnsupportedTargetError(String),

    #[error("Emission invariant violated: {0}")]
    EmissionInvariantError(String),

    #[error("Limit exceeded: {0}")]
    LimitExceededError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Convert Serde JSON errors to schema_codegen errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert TOML deserialization errors to schema_codegen errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

/// Convert YAML deserialization errors to schema_codegen errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
