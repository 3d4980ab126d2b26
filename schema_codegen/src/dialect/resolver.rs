//! Dialect type resolver
//!
//! Maps a source type token such as `VARCHAR(50)` or `INT UNSIGNED` to a
//! [`CanonicalType`]. Resolution depends only on the token and the dialect;
//! table and column names are carried solely for diagnostics.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::dialect::Dialect;
use crate::schema::types::{CanonicalType, Schema};

static ARGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)").expect("valid regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Outcome of resolving one type token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub canonical: CanonicalType,
    /// Set when the mapping loses information (e.g. TIME stored as text)
    pub note: Option<String>,
}

impl Resolution {
    fn exact(canonical: CanonicalType) -> Self {
        Self { canonical, note: None }
    }

    fn lossy(canonical: CanonicalType, note: impl Into<String>) -> Self {
        Self {
            canonical,
            note: Some(note.into()),
        }
    }

    fn unknown() -> Self {
        Self::exact(CanonicalType::Unknown)
    }
}

/// Normalised view of a type token
#[derive(Debug, Clone, PartialEq, Eq)]
struct TypeToken {
    /// Upper-cased name without arguments or sign modifiers, e.g. `TIMESTAMP WITH TIME ZONE`
    base: String,
    /// Raw arguments of the first parenthesised list
    args: Vec<String>,
    unsigned: bool,
}

impl TypeToken {
    fn parse(source: &str) -> Self {
        let upper = source.trim().to_uppercase();
        let args = ARGS_RE
            .captures(&upper)
            .and_then(|caps| caps.get(1))
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let without_args = ARGS_RE.replace(&upper, " ");
        let mut unsigned = false;
        let words: Vec<&str> = SPACES_RE
            .split(without_args.trim())
            .filter(|w| !w.is_empty())
            .filter(|w| match *w {
                "UNSIGNED" => {
                    unsigned = true;
                    false
                }
                "SIGNED" | "ZEROFILL" => false,
                _ => true,
            })
            .collect();

        Self {
            base: words.join(" "),
            args,
            unsigned,
        }
    }

    /// Numeric argument at `index`, if present and numeric
    fn number(&self, index: usize) -> Option<u64> {
        self.args.get(index).and_then(|a| a.parse::<u64>().ok())
    }

    fn has_non_numeric_args(&self) -> bool {
        self.args.iter().any(|a| a.parse::<u64>().is_err())
    }
}

/// Defaults applied when a token carries no arguments
struct DialectDefaults {
    decimal: (u16, u16),
    char_length: u64,
    varchar_length: Option<u64>,
    binary_length: u64,
}

fn defaults(dialect: Dialect) -> DialectDefaults {
    match dialect {
        Dialect::MySql => DialectDefaults {
            decimal: (10, 0),
            char_length: 1,
            varchar_length: Some(255),
            binary_length: 1,
        },
        Dialect::Postgres => DialectDefaults {
            decimal: (38, 10),
            char_length: 1,
            varchar_length: None,
            binary_length: 1,
        },
        Dialect::Sqlite => DialectDefaults {
            decimal: (18, 6),
            char_length: 1,
            varchar_length: None,
            binary_length: 1,
        },
    }
}

/// Resolve a source type token for the given dialect
pub fn resolve(source_type: &str, dialect: Dialect) -> Resolution {
    let token = TypeToken::parse(source_type);
    if token.base.is_empty() {
        return Resolution::unknown();
    }

    let resolved = match dialect {
        Dialect::MySql => resolve_mysql(&token),
        Dialect::Postgres => resolve_postgres(&token),
        Dialect::Sqlite => resolve_sqlite(&token),
    };
    resolved
        .map(|resolution| flag_clamped_decimal(resolution, &token))
        .unwrap_or_else(Resolution::unknown)
}

/// Decimal arguments beyond `u16` are clamped; say so
fn flag_clamped_decimal(resolution: Resolution, token: &TypeToken) -> Resolution {
    let clamped = matches!(resolution.canonical, CanonicalType::Decimal { .. })
        && (0..2).any(|i| token.number(i).map_or(false, |n| n > u64::from(u16::MAX)));
    if clamped && resolution.note.is_none() {
        let note = format!("{} arguments are out of range and clamped to {}", token.base, resolution.canonical);
        Resolution::lossy(resolution.canonical, note)
    } else {
        resolution
    }
}

/// Resolve every column of the schema, collecting diagnostics in table/column order.
///
/// Columns that already carry a canonical type (inferred from CSV) are kept.
pub fn resolve_schema(schema: &mut Schema, dialect: Dialect, diagnostics: &mut Diagnostics) {
    for table in schema.tables_mut() {
        let line = table.line;
        for column in &mut table.columns {
            if column.canonical_type.is_some() {
                continue;
            }
            let resolution = resolve(&column.source_type, dialect);
            let location = Location::column(&table.name, &column.name).at_line(line);

            if resolution.canonical.is_unknown() {
                column.canonical_type = None;
                diagnostics.error(
                    DiagnosticKind::TypeResolution,
                    format!(
                        "Unsupported {} type '{}' for column '{}' in table '{}'",
                        dialect, column.source_type, column.name, table.name
                    ),
                    location,
                );
                continue;
            }

            if let Some(note) = resolution.note {
                diagnostics.warning(DiagnosticKind::TypeResolution, note, location);
            }
            tracing::trace!(
                table = %table.name,
                column = %column.name,
                source_type = %column.source_type,
                canonical = %resolution.canonical,
                "Resolved column type"
            );
            column.canonical_type = Some(resolution.canonical);
        }
    }
}

fn decimal(token: &TypeToken, fallback: (u16, u16)) -> CanonicalType {
    let narrow = |n: u64| u16::try_from(n).unwrap_or(u16::MAX);
    let precision = token.number(0).map(narrow).unwrap_or(fallback.0);
    let scale = match token.number(0) {
        Some(_) => token.number(1).map(narrow).unwrap_or(0),
        None => fallback.1,
    };
    CanonicalType::Decimal { precision, scale }
}

fn text(token: &TypeToken, fallback: Option<u64>) -> CanonicalType {
    CanonicalType::Text(token.number(0).or(fallback))
}

fn binary(token: &TypeToken, fallback: Option<u64>) -> CanonicalType {
    CanonicalType::Binary(token.number(0).or(fallback))
}

/// Widen an integer one step when it is unsigned
fn integer(width: u8, unsigned: bool) -> CanonicalType {
    if unsigned && width < 64 {
        CanonicalType::Integer(width * 2)
    } else {
        CanonicalType::Integer(width)
    }
}

fn lossy_text(token: &TypeToken, length: Option<u64>) -> Resolution {
    Resolution::lossy(
        CanonicalType::Text(length),
        format!("{} is represented as text", token.base),
    )
}

fn resolve_mysql(token: &TypeToken) -> Option<Resolution> {
    let d = defaults(Dialect::MySql);
    let unsigned = token.unsigned;

    let canonical = match token.base.as_str() {
        "TINYINT" if token.number(0) == Some(1) && !unsigned => CanonicalType::Boolean,
        "BOOL" | "BOOLEAN" => CanonicalType::Boolean,
        "TINYINT" => integer(8, unsigned),
        "SMALLINT" => integer(16, unsigned),
        "MEDIUMINT" => integer(32, false),
        "INT" | "INTEGER" => integer(32, unsigned),
        "BIGINT" => CanonicalType::Integer(64),
        "YEAR" => CanonicalType::Integer(16),
        "BIT" => match token.number(0) {
            None | Some(1) => CanonicalType::Boolean,
            Some(bits) => CanonicalType::Binary(Some(bits.div_ceil(8))),
        },
        "DECIMAL" | "NUMERIC" | "DEC" | "FIXED" => decimal(token, d.decimal),
        "FLOAT" => match token.number(0) {
            Some(p) if p > 24 => CanonicalType::Float(64),
            _ => CanonicalType::Float(32),
        },
        "DOUBLE" | "DOUBLE PRECISION" | "REAL" => CanonicalType::Float(64),
        "CHAR" | "CHARACTER" | "NCHAR" => text(token, Some(d.char_length)),
        "VARCHAR" | "CHARACTER VARYING" | "NVARCHAR" => text(token, d.varchar_length),
        "TINYTEXT" => CanonicalType::Text(Some(255)),
        "TEXT" => text(token, Some(65_535)),
        "MEDIUMTEXT" => CanonicalType::Text(Some(16_777_215)),
        "LONGTEXT" => CanonicalType::Text(Some(4_294_967_295)),
        "BINARY" => binary(token, Some(d.binary_length)),
        "VARBINARY" => binary(token, Some(255)),
        "TINYBLOB" => CanonicalType::Binary(Some(255)),
        "BLOB" => binary(token, Some(65_535)),
        "MEDIUMBLOB" => CanonicalType::Binary(Some(16_777_215)),
        "LONGBLOB" => CanonicalType::Binary(Some(4_294_967_295)),
        "DATE" => CanonicalType::Date,
        "DATETIME" | "TIMESTAMP" => CanonicalType::DateTime,
        "TIME" => return Some(lossy_text(token, Some(16))),
        "JSON" => return Some(lossy_text(token, None)),
        "ENUM" | "SET" => return Some(lossy_text(token, None)),
        _ => return None,
    };
    Some(Resolution::exact(canonical))
}

fn resolve_postgres(token: &TypeToken) -> Option<Resolution> {
    let d = defaults(Dialect::Postgres);

    let canonical = match token.base.as_str() {
        "SMALLINT" | "INT2" | "SMALLSERIAL" | "SERIAL2" => CanonicalType::Integer(16),
        "INTEGER" | "INT" | "INT4" | "SERIAL" | "SERIAL4" => CanonicalType::Integer(32),
        "BIGINT" | "INT8" | "BIGSERIAL" | "SERIAL8" => CanonicalType::Integer(64),
        "REAL" | "FLOAT4" => CanonicalType::Float(32),
        "DOUBLE PRECISION" | "FLOAT8" | "DOUBLE" => CanonicalType::Float(64),
        "FLOAT" => match token.number(0) {
            Some(p) if p <= 24 => CanonicalType::Float(32),
            _ => CanonicalType::Float(64),
        },
        "NUMERIC" | "DECIMAL" => decimal(token, d.decimal),
        "MONEY" => CanonicalType::Decimal { precision: 19, scale: 2 },
        "BOOLEAN" | "BOOL" => CanonicalType::Boolean,
        "CHAR" | "CHARACTER" | "BPCHAR" => text(token, Some(d.char_length)),
        "VARCHAR" | "CHARACTER VARYING" => text(token, d.varchar_length),
        "TEXT" | "CITEXT" => CanonicalType::Text(None),
        "BYTEA" => CanonicalType::Binary(None),
        "DATE" => CanonicalType::Date,
        "TIMESTAMP"
        | "TIMESTAMPTZ"
        | "TIMESTAMP WITH TIME ZONE"
        | "TIMESTAMP WITHOUT TIME ZONE" => CanonicalType::DateTime,
        "TIME" | "TIMETZ" | "TIME WITH TIME ZONE" | "TIME WITHOUT TIME ZONE" => {
            return Some(lossy_text(token, Some(16)))
        }
        "UUID" => return Some(lossy_text(token, Some(36))),
        "JSON" | "JSONB" | "XML" | "INET" | "CIDR" | "MACADDR" => {
            return Some(lossy_text(token, None))
        }
        _ => return None,
    };
    Some(Resolution::exact(canonical))
}

fn resolve_sqlite(token: &TypeToken) -> Option<Resolution> {
    let d = defaults(Dialect::Sqlite);

    let canonical = match token.base.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "INT8" | "UNSIGNED BIG INT" => CanonicalType::Integer(64),
        "TINYINT" => CanonicalType::Integer(8),
        "SMALLINT" | "INT2" => CanonicalType::Integer(16),
        "MEDIUMINT" => CanonicalType::Integer(32),
        "REAL" | "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" => CanonicalType::Float(64),
        "NUMERIC" | "DECIMAL" => decimal(token, d.decimal),
        "BOOLEAN" | "BOOL" => CanonicalType::Boolean,
        "CHAR" | "CHARACTER" | "NCHAR" | "NATIVE CHARACTER" => text(token, Some(d.char_length)),
        "VARCHAR" | "VARYING CHARACTER" | "NVARCHAR" | "CHARACTER VARYING" => {
            text(token, d.varchar_length)
        }
        "TEXT" | "CLOB" => CanonicalType::Text(None),
        "BLOB" => CanonicalType::Binary(None),
        "DATE" => CanonicalType::Date,
        "DATETIME" | "TIMESTAMP" => CanonicalType::DateTime,
        "TIME" => return Some(lossy_text(token, Some(16))),
        "JSON" => return Some(lossy_text(token, None)),
        _ => return resolve_sqlite_affinity(token),
    };
    Some(Resolution::exact(canonical))
}

/// SQLite column affinity rules, minus the NUMERIC catch-all
fn resolve_sqlite_affinity(token: &TypeToken) -> Option<Resolution> {
    let base = token.base.as_str();
    if token.has_non_numeric_args() {
        return None;
    }
    let canonical = if base.contains("INT") {
        CanonicalType::Integer(64)
    } else if base.contains("CHAR") || base.contains("CLOB") || base.contains("TEXT") {
        CanonicalType::Text(token.number(0))
    } else if base.contains("BLOB") {
        CanonicalType::Binary(None)
    } else if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") {
        CanonicalType::Float(64)
    } else {
        return None;
    };
    Some(Resolution::lossy(
        canonical,
        format!("{} resolved by SQLite type affinity as {}", token.base, canonical),
    ))
}
