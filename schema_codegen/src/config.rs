//! Configuration handling for schema_codegen

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Load configuration from a TOML or YAML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let is_yaml = Path::new(path)
        .extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml");

    let config: Config = if is_yaml {
        serde_yaml::from_str(&config_str)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?
    } else {
        toml::from_str(&config_str)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?
    };

    config.validate()?;
    Ok(config)
}

/// Represents the complete schema_codegen configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub limits: LimitsConfig,
    pub csv: CsvConfig,
    pub output: OutputConfig,
    pub emit: EmitConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Reject settings that would make every request fail
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_input_bytes == 0 {
            return Err(Error::ConfigError("limits.max_input_bytes must be greater than 0".to_string()));
        }
        if self.csv.sample_rows == 0 {
            return Err(Error::ConfigError("csv.sample_rows must be greater than 0".to_string()));
        }
        if !self.csv.delimiter.is_ascii() {
            return Err(Error::ConfigError("csv.delimiter must be an ASCII character".to_string()));
        }
        if self.output.archive_prefix.trim().is_empty() {
            return Err(Error::ConfigError("output.archive_prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Request size limits
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_input_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 5 * 1024 * 1024,
        }
    }
}

/// CSV type inference settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CsvConfig {
    /// Maximum number of data rows inspected per column
    pub sample_rows: usize,
    pub delimiter: char,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            sample_rows: 1000,
            delimiter: ',',
        }
    }
}

/// Artifact output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    pub archive_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            archive_prefix: "codegen".to_string(),
        }
    }
}

/// Code emission behavior configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct EmitConfig {
    /// Add a per-language index file next to the table units
    pub support_files: bool,
    /// Emit tables on blocking worker threads
    pub parallel: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            support_files: false,
            parallel: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_apply_to_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [csv]
            sample_rows = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.csv.sample_rows, 10);
        assert_eq!(config.csv.delimiter, ',');
        assert_eq!(config.limits.max_input_bytes, 5 * 1024 * 1024);
        assert_eq!(config.output.directory, "output");
        assert!(config.emit.parallel);
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_load_yaml_config() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "limits:\n  max_input_bytes: 2048\noutput:\n  archive_prefix: models").unwrap();

        let config = load_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.limits.max_input_bytes, 2048);
        assert_eq!(config.output.archive_prefix, "models");
        assert_eq!(config.output.directory, "output");
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[limits]\nmax_input_bytes = 0").unwrap();

        let result = load_from_file(file.path().to_str().unwrap());
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
