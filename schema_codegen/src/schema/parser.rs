//! Schema parser entry point
//!
//! Dispatches raw request input to the DDL or CSV reader.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::CsvConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location};
use crate::dialect::Dialect;
use crate::error::Error;
use crate::schema::csv::{parse_csv, CsvOptions};
use crate::schema::ddl::parse_ddl;
use crate::schema::types::Schema;

/// Kind of schema description carried by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Ddl,
    Csv,
}

impl InputKind {
    /// Guess the input kind from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "sql" | "ddl" => Some(InputKind::Ddl),
            "csv" => Some(InputKind::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Ddl => write!(f, "ddl"),
            InputKind::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for InputKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ddl" | "sql" => Ok(InputKind::Ddl),
            "csv" => Ok(InputKind::Csv),
            _ => Err(Error::ParseError(format!("Unknown input kind: {}", s))),
        }
    }
}

/// Reader settings shared by every request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub csv: CsvOptions,
}

impl From<&CsvConfig> for ParseOptions {
    fn from(config: &CsvConfig) -> Self {
        // Config validation guarantees an ASCII delimiter
        let delimiter = u8::try_from(config.delimiter).unwrap_or(b',');
        Self {
            csv: CsvOptions {
                sample_rows: config.sample_rows,
                delimiter,
            },
        }
    }
}

/// Parse raw input into a schema, reporting problems into `diagnostics`.
///
/// The returned schema only holds tables that were read without errors; the
/// caller decides whether to continue by checking the collector.
pub fn parse_into(
    raw: &[u8],
    kind: InputKind,
    dialect: Dialect,
    options: &ParseOptions,
    source_name: &str,
    diagnostics: &mut Diagnostics,
) -> Schema {
    match kind {
        InputKind::Ddl => {
            let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
            match std::str::from_utf8(raw) {
                Ok(script) => parse_ddl(script, dialect, diagnostics),
                Err(e) => {
                    diagnostics.error(
                        DiagnosticKind::Parse,
                        format!("DDL input is not valid UTF-8: {}", e),
                        Location::default(),
                    );
                    Schema::new()
                }
            }
        }
        InputKind::Csv => parse_csv(raw, source_name, &options.csv, diagnostics),
    }
}

/// Parse raw input into a schema or the ordered list of errors
pub fn parse(
    raw: &[u8],
    kind: InputKind,
    dialect: Dialect,
    options: &ParseOptions,
    source_name: &str,
) -> std::result::Result<Schema, Vec<Diagnostic>> {
    let mut diagnostics = Diagnostics::new();
    let schema = parse_into(raw, kind, dialect, options, source_name, &mut diagnostics);
    diagnostics.log_warnings();

    if diagnostics.has_errors() {
        Err(diagnostics.into_errors())
    } else {
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dispatches_on_kind() {
        let options = ParseOptions::default();

        let ddl = parse(b"CREATE TABLE a (x INT);", InputKind::Ddl, Dialect::MySql, &options, "x.sql").unwrap();
        assert_eq!(ddl.table_names(), vec!["a"]);

        let csv = parse(b"x,y\n1,2\n", InputKind::Csv, Dialect::MySql, &options, "points.csv").unwrap();
        assert_eq!(csv.table_names(), vec!["points"]);
    }

    #[test]
    fn test_invalid_utf8_ddl_is_error() {
        let errors = parse(
            b"CREATE TABLE \xff (x INT);",
            InputKind::Ddl,
            Dialect::MySql,
            &ParseOptions::default(),
            "x.sql",
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, DiagnosticKind::Parse);
    }

    #[test]
    fn test_input_kind_from_path() {
        assert_eq!(InputKind::from_path(Path::new("schema/users.SQL")), Some(InputKind::Ddl));
        assert_eq!(InputKind::from_path(Path::new("data.csv")), Some(InputKind::Csv));
        assert_eq!(InputKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_options_from_config() {
        let config = CsvConfig {
            sample_rows: 5,
            delimiter: ';',
        };
        let options = ParseOptions::from(&config);
        assert_eq!(options.csv.sample_rows, 5);
        assert_eq!(options.csv.delimiter, b';');
    }
}
