//! Supported RDBMS dialects
//!
//! Each dialect carries its DDL grammar (via `sqlparser`), its identifier
//! quoting and bind-variable style, and the type table used by the
//! [`resolver`].

pub mod resolver;

use serde::Serialize;
use sqlparser::dialect::{Dialect as SqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub use resolver::{resolve, resolve_schema, Resolution};

/// Target relational database dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite];

    /// Canonical identifier accepted in requests
    pub fn id(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgresql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Every identifier accepted for this dialect
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Dialect::MySql => &["mysql"],
            Dialect::Postgres => &["postgresql", "postgres", "pg"],
            Dialect::Sqlite => &["sqlite", "sqlite3", "sqlite>=3.35.0"],
        }
    }

    /// DDL grammar used to parse `CREATE TABLE` statements
    pub fn sql_dialect(&self) -> Box<dyn SqlDialect> {
        match self {
            Dialect::MySql => Box::new(MySqlDialect {}),
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    /// Quote an identifier for use in generated SQL
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Placeholder for the n-th (1-based) bind variable
    pub fn bind_variable(&self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Dialect::ALL
            .into_iter()
            .find(|d| d.aliases().contains(&needle.as_str()))
            .ok_or_else(|| Error::UnsupportedTargetError(format!("Unsupported RDBMS: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_aliases() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("sqlite>=3.35.0".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert!(matches!(
            "oracle".parse::<Dialect>(),
            Err(Error::UnsupportedTargetError(_))
        ));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::MySql.quote_identifier("from"), "`from`");
        assert_eq!(Dialect::Postgres.quote_identifier("user"), "\"user\"");
        assert_eq!(Dialect::Sqlite.quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_bind_variable() {
        assert_eq!(Dialect::Postgres.bind_variable(3), "$3");
        assert_eq!(Dialect::MySql.bind_variable(3), "?");
    }
}
