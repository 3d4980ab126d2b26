//! SQL statements embedded in generated units
//!
//! Identifiers are quoted for the target dialect and values are bound
//! through the dialect's placeholder style.

use crate::dialect::Dialect;
use crate::schema::types::{Column, Table};

/// Statements for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatements {
    pub select_all: String,
    pub insert: String,
    pub select_by_key: Option<String>,
    pub update_by_key: Option<String>,
    pub delete_by_key: Option<String>,
}

impl SqlStatements {
    /// Statements as (name, sql) pairs in a fixed order
    pub fn named(&self) -> Vec<(&'static str, &str)> {
        let mut named = vec![("select_all", self.select_all.as_str()), ("insert", self.insert.as_str())];
        if let Some(sql) = &self.select_by_key {
            named.push(("select_by_key", sql.as_str()));
        }
        if let Some(sql) = &self.update_by_key {
            named.push(("update_by_key", sql.as_str()));
        }
        if let Some(sql) = &self.delete_by_key {
            named.push(("delete_by_key", sql.as_str()));
        }
        named
    }
}

/// Build the statements for a table
pub fn build(table: &Table, dialect: Dialect) -> SqlStatements {
    let quote = |name: &str| dialect.quote_identifier(name);
    let table_name = quote(&table.name);
    let all_columns = join_columns(table.columns.iter(), dialect);

    let select_all = format!("SELECT {} FROM {}", all_columns, table_name);
    let insert = build_insert(table, dialect);

    let keys = table.primary_key();
    if keys.is_empty() {
        return SqlStatements {
            select_all,
            insert,
            select_by_key: None,
            update_by_key: None,
            delete_by_key: None,
        };
    }

    let key_filter = |first: usize| {
        keys.iter()
            .enumerate()
            .map(|(i, column)| format!("{} = {}", quote(&column.name), dialect.bind_variable(first + i)))
            .collect::<Vec<_>>()
            .join(" AND ")
    };

    let select_by_key = format!("{} WHERE {}", select_all, key_filter(1));
    let delete_by_key = format!("DELETE FROM {} WHERE {}", table_name, key_filter(1));

    let assignments: Vec<&Column> = table.columns.iter().filter(|c| !c.is_primary_key).collect();
    let update_by_key = if assignments.is_empty() {
        None
    } else {
        let set = assignments
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = {}", quote(&column.name), dialect.bind_variable(i + 1)))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "UPDATE {} SET {} WHERE {}",
            table_name,
            set,
            key_filter(assignments.len() + 1)
        ))
    };

    SqlStatements {
        select_all,
        insert,
        select_by_key: Some(select_by_key),
        update_by_key,
        delete_by_key: Some(delete_by_key),
    }
}

fn join_columns<'a>(columns: impl Iterator<Item = &'a Column>, dialect: Dialect) -> String {
    columns
        .map(|c| dialect.quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// INSERT leaving auto-increment columns to the database
fn build_insert(table: &Table, dialect: Dialect) -> String {
    let table_name = dialect.quote_identifier(&table.name);
    let columns: Vec<&Column> = table.columns.iter().filter(|c| !c.auto_increment).collect();

    if columns.is_empty() {
        return match dialect {
            Dialect::MySql => format!("INSERT INTO {} () VALUES ()", table_name),
            Dialect::Postgres | Dialect::Sqlite => format!("INSERT INTO {} DEFAULT VALUES", table_name),
        };
    }

    let placeholders = (1..=columns.len())
        .map(|n| dialect.bind_variable(n))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table_name,
        join_columns(columns.into_iter(), dialect),
        placeholders
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn users() -> Table {
        let mut table = Table::new("users");
        let mut id = Column::new("id", "INT").primary_key();
        id.auto_increment = true;
        table.add_column(id);
        table.add_column(Column::new("name", "VARCHAR(50)").nullable(false));
        table.add_column(Column::new("email", "TEXT"));
        table
    }

    #[test]
    fn test_postgres_statements() {
        let statements = build(&users(), Dialect::Postgres);

        assert_eq!(statements.select_all, r#"SELECT "id", "name", "email" FROM "users""#);
        assert_eq!(statements.insert, r#"INSERT INTO "users" ("name", "email") VALUES ($1, $2)"#);
        assert_eq!(
            statements.update_by_key.as_deref(),
            Some(r#"UPDATE "users" SET "name" = $1, "email" = $2 WHERE "id" = $3"#)
        );
        assert_eq!(
            statements.delete_by_key.as_deref(),
            Some(r#"DELETE FROM "users" WHERE "id" = $1"#)
        );
    }

    #[test]
    fn test_mysql_statements() {
        let statements = build(&users(), Dialect::MySql);

        assert_eq!(
            statements.select_by_key.as_deref(),
            Some("SELECT `id`, `name`, `email` FROM `users` WHERE `id` = ?")
        );
        assert_eq!(statements.insert, "INSERT INTO `users` (`name`, `email`) VALUES (?, ?)");
    }

    #[test]
    fn test_keyless_table_has_no_key_statements() {
        let mut table = Table::new("log");
        table.add_column(Column::new("line", "TEXT"));
        let statements = build(&table, Dialect::Sqlite);

        assert!(statements.select_by_key.is_none());
        assert!(statements.update_by_key.is_none());
        assert_eq!(statements.named().len(), 2);
    }

    #[test]
    fn test_only_auto_increment_columns() {
        let mut table = Table::new("counter");
        let mut id = Column::new("id", "INTEGER").primary_key();
        id.auto_increment = true;
        table.add_column(id);

        let statements = build(&table, Dialect::Sqlite);
        assert_eq!(statements.insert, r#"INSERT INTO "counter" DEFAULT VALUES"#);
        assert!(statements.update_by_key.is_none());
    }
}
