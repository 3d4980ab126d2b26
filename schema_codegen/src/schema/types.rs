//! Type definitions for schema objects

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Represents a complete parsed schema
///
/// Tables keep their declaration order and are keyed by lower-cased name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the schema.
    ///
    /// A table with the same name (case-insensitive) is replaced and the
    /// replaced definition is returned. The new definition takes the
    /// position of the later declaration.
    pub fn add_table(&mut self, table: Table) -> Option<Table> {
        let key = table.name.to_lowercase();
        let previous = self.tables.shift_remove(&key);
        self.tables.insert(key, table);
        previous
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.values_mut()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.values().map(|t| t.name.as_str()).collect()
    }
}

/// Represents a database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    /// Source line of the defining statement, for DDL input
    pub line: Option<usize>,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            line: None,
        }
    }

    /// Add a column to the table
    pub fn add_column(&mut self, column: Column) {
        self.columns.push(column);
    }

    /// Find a column by name, ignoring case
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Columns that make up the primary key, in declaration order
    pub fn primary_key(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_primary_key).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.is_primary_key)
    }

    /// Mark a column as part of the primary key; key columns are never nullable
    pub fn mark_primary_key(&mut self, name: &str) -> bool {
        match self.column_mut(name) {
            Some(column) => {
                column.is_primary_key = true;
                column.nullable = false;
                true
            }
            None => false,
        }
    }
}

/// Represents a table column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Type token as written in the input
    pub source_type: String,
    /// Resolved type, unset until resolution succeeds
    pub canonical_type: Option<CanonicalType>,
    pub nullable: bool,
    pub is_primary_key: bool,
    pub auto_increment: bool,
    pub default: Option<String>,
}

impl Column {
    /// Create a new nullable column with the given name and source type
    pub fn new(name: &str, source_type: &str) -> Self {
        Self {
            name: name.to_string(),
            source_type: source_type.to_string(),
            canonical_type: None,
            nullable: true,
            is_primary_key: false,
            auto_increment: false,
            default: None,
        }
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Mark the column as a primary key column
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    /// Set the resolved type
    pub fn with_type(mut self, canonical: CanonicalType) -> Self {
        self.canonical_type = Some(canonical);
        self
    }
}

/// Dialect- and language-neutral column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalType {
    /// Signed integer of the given bit width (8, 16, 32 or 64)
    Integer(u8),
    /// Approximate numeric of the given bit width (32 or 64)
    Float(u8),
    Decimal { precision: u16, scale: u16 },
    /// Character data; `None` is unbounded
    Text(Option<u64>),
    Boolean,
    Date,
    DateTime,
    /// Byte data; `None` is unbounded
    Binary(Option<u64>),
    Unknown,
}

/// Variant-level classification used to key the per-language type tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeKind {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Text,
    Boolean,
    Date,
    DateTime,
    Binary,
}

impl TypeKind {
    pub const ALL: [TypeKind; 12] = [
        TypeKind::Int8,
        TypeKind::Int16,
        TypeKind::Int32,
        TypeKind::Int64,
        TypeKind::Float32,
        TypeKind::Float64,
        TypeKind::Decimal,
        TypeKind::Text,
        TypeKind::Boolean,
        TypeKind::Date,
        TypeKind::DateTime,
        TypeKind::Binary,
    ];
}

impl CanonicalType {
    /// Table key for this type; `Unknown` has none
    pub fn kind(&self) -> Option<TypeKind> {
        match self {
            CanonicalType::Integer(w) if *w <= 8 => Some(TypeKind::Int8),
            CanonicalType::Integer(w) if *w <= 16 => Some(TypeKind::Int16),
            CanonicalType::Integer(w) if *w <= 32 => Some(TypeKind::Int32),
            CanonicalType::Integer(_) => Some(TypeKind::Int64),
            CanonicalType::Float(w) if *w <= 32 => Some(TypeKind::Float32),
            CanonicalType::Float(_) => Some(TypeKind::Float64),
            CanonicalType::Decimal { .. } => Some(TypeKind::Decimal),
            CanonicalType::Text(_) => Some(TypeKind::Text),
            CanonicalType::Boolean => Some(TypeKind::Boolean),
            CanonicalType::Date => Some(TypeKind::Date),
            CanonicalType::DateTime => Some(TypeKind::DateTime),
            CanonicalType::Binary(_) => Some(TypeKind::Binary),
            CanonicalType::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CanonicalType::Unknown)
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalType::Integer(width) => write!(f, "integer({})", width),
            CanonicalType::Float(width) => write!(f, "float({})", width),
            CanonicalType::Decimal { precision, scale } => {
                write!(f, "decimal({},{})", precision, scale)
            }
            CanonicalType::Text(Some(len)) => write!(f, "text({})", len),
            CanonicalType::Text(None) => write!(f, "text"),
            CanonicalType::Boolean => write!(f, "boolean"),
            CanonicalType::Date => write!(f, "date"),
            CanonicalType::DateTime => write!(f, "datetime"),
            CanonicalType::Binary(Some(len)) => write!(f, "binary({})", len),
            CanonicalType::Binary(None) => write!(f, "binary"),
            CanonicalType::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for CanonicalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::ParseError(format!("Invalid canonical type: {}", s));
        let s = s.trim();
        let (name, args) = match s.find('(') {
            Some(open) if s.ends_with(')') => (&s[..open], Some(&s[open + 1..s.len() - 1])),
            Some(_) => return Err(invalid()),
            None => (s, None),
        };
        let numbers = |args: &str| -> Result<Vec<u64>, Error> {
            args.split(',')
                .map(|a| a.trim().parse::<u64>().map_err(|_| invalid()))
                .collect()
        };
        let narrow = |n: u64| u8::try_from(n).map_err(|_| invalid());
        let narrow_wide = |n: u64| u16::try_from(n).map_err(|_| invalid());

        match (name, args) {
            ("integer", Some(a)) => match numbers(a)?.as_slice() {
                [w] => Ok(CanonicalType::Integer(narrow(*w)?)),
                _ => Err(invalid()),
            },
            ("float", Some(a)) => match numbers(a)?.as_slice() {
                [w] => Ok(CanonicalType::Float(narrow(*w)?)),
                _ => Err(invalid()),
            },
            ("decimal", Some(a)) => match numbers(a)?.as_slice() {
                [p, s] => Ok(CanonicalType::Decimal {
                    precision: narrow_wide(*p)?,
                    scale: narrow_wide(*s)?,
                }),
                _ => Err(invalid()),
            },
            ("text", None) => Ok(CanonicalType::Text(None)),
            ("text", Some(a)) => match numbers(a)?.as_slice() {
                [len] => Ok(CanonicalType::Text(Some(*len))),
                _ => Err(invalid()),
            },
            ("binary", None) => Ok(CanonicalType::Binary(None)),
            ("binary", Some(a)) => match numbers(a)?.as_slice() {
                [len] => Ok(CanonicalType::Binary(Some(*len))),
                _ => Err(invalid()),
            },
            ("boolean", None) => Ok(CanonicalType::Boolean),
            ("date", None) => Ok(CanonicalType::Date),
            ("datetime", None) => Ok(CanonicalType::DateTime),
            ("unknown", None) => Ok(CanonicalType::Unknown),
            _ => Err(invalid()),
        }
    }
}
