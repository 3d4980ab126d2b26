//! DDL script parsing
//!
//! Scripts are split into statements first so that one bad statement only
//! costs a warning. Each statement is then handed to `sqlparser` with the
//! grammar of the declared dialect.

use sqlparser::ast::{ColumnDef, ColumnOption, CreateTable, Statement, TableConstraint};
use sqlparser::parser::{Parser, ParserOptions};

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::dialect::Dialect;
use crate::schema::types::{Column, Schema, Table};

/// One statement of a script together with its first source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub text: String,
    pub line: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    Quoted(char),
    LineComment,
    BlockComment,
}

/// Split a script on `;`, ignoring separators inside quotes and comments.
///
/// Statements that contain only whitespace and comments are dropped. A final
/// statement without a terminating `;` is kept. `#` starts a comment only in
/// MySQL.
pub fn split_statements(script: &str, dialect: Dialect) -> Vec<SqlStatement> {
    let hash_comments = dialect == Dialect::MySql;
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut start_line: Option<usize> = None;
    let mut line = 1;
    let mut state = ScanState::Normal;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            ScanState::Normal => match c {
                ';' => {
                    if let Some(first) = start_line.take() {
                        statements.push(SqlStatement {
                            text: current.trim().to_string(),
                            line: first,
                        });
                    }
                    current.clear();
                    continue;
                }
                '-' if chars.peek() == Some(&'-') => state = ScanState::LineComment,
                '#' if hash_comments => state = ScanState::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    current.push(c);
                    if let Some(star) = chars.next() {
                        current.push(star);
                    }
                    state = ScanState::BlockComment;
                    continue;
                }
                '\'' | '"' | '`' => {
                    start_line.get_or_insert(line);
                    state = ScanState::Quoted(c);
                }
                c if !c.is_whitespace() => {
                    start_line.get_or_insert(line);
                }
                _ => {}
            },
            ScanState::Quoted(quote) => {
                if c == quote {
                    // A doubled quote stays inside the literal
                    if chars.peek() == Some(&quote) {
                        current.push(c);
                        if let Some(next) = chars.next() {
                            current.push(next);
                        }
                        continue;
                    }
                    state = ScanState::Normal;
                } else if c == '\\' && quote == '\'' {
                    current.push(c);
                    if let Some(escaped) = chars.next() {
                        if escaped == '\n' {
                            line += 1;
                        }
                        current.push(escaped);
                    }
                    continue;
                }
            }
            ScanState::LineComment => {
                if c == '\n' {
                    state = ScanState::Normal;
                }
            }
            ScanState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    current.push(c);
                    if let Some(slash) = chars.next() {
                        current.push(slash);
                    }
                    state = ScanState::Normal;
                    continue;
                }
            }
        }

        if c == '\n' {
            line += 1;
        }
        if state != ScanState::LineComment || c == '\n' {
            current.push(c);
        }
    }

    if let Some(first) = start_line {
        statements.push(SqlStatement {
            text: current.trim().to_string(),
            line: first,
        });
    }

    statements
}

/// Parse every `CREATE TABLE` statement of a script into a schema
pub fn parse_ddl(script: &str, dialect: Dialect, diagnostics: &mut Diagnostics) -> Schema {
    let mut schema = Schema::new();
    let sql_dialect = dialect.sql_dialect();
    let mut skipped = 0;

    for statement in split_statements(script, dialect) {
        let parsed = Parser::new(&*sql_dialect)
            .with_options(ParserOptions::new().with_trailing_commas(true))
            .try_with_sql(&statement.text)
            .and_then(|mut parser| parser.parse_statements());

        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                skipped += 1;
                diagnostics.warning(
                    DiagnosticKind::Parse,
                    format!("Skipping statement that could not be parsed: {}", e),
                    Location::line(statement.line),
                );
                continue;
            }
        };

        for parsed_statement in parsed {
            match parsed_statement {
                Statement::CreateTable(create)
                    if create.like.is_some() || create.clone.is_some() || create.query.is_some() =>
                {
                    skipped += 1;
                    diagnostics.warning(
                        DiagnosticKind::Parse,
                        format!(
                            "Skipping CREATE TABLE {} without column definitions; only explicit columns are used",
                            create.name
                        ),
                        Location::line(statement.line),
                    );
                }
                Statement::CreateTable(create) => {
                    if let Some(table) = build_table(&create, statement.line, diagnostics) {
                        let name = table.name.clone();
                        if schema.add_table(table).is_some() {
                            diagnostics.warning(
                                DiagnosticKind::Parse,
                                format!("Table '{}' is defined more than once; the last definition is used", name),
                                Location::table(&name).at_line(Some(statement.line)),
                            );
                        }
                    }
                }
                other => {
                    skipped += 1;
                    let keyword = other.to_string().split_whitespace().next().unwrap_or("").to_uppercase();
                    diagnostics.warning(
                        DiagnosticKind::Parse,
                        format!("Skipping {} statement; only CREATE TABLE is used", keyword),
                        Location::line(statement.line),
                    );
                }
            }
        }
    }

    if schema.is_empty() && !diagnostics.has_errors() {
        let message = if skipped > 0 {
            format!("No CREATE TABLE statement could be read ({} statement(s) skipped)", skipped)
        } else {
            "No CREATE TABLE statement found".to_string()
        };
        diagnostics.error(DiagnosticKind::Parse, message, Location::default());
    }

    tracing::debug!(tables = schema.len(), skipped, "Parsed DDL script");
    schema
}

/// Build a table from a parsed statement, reporting structural errors
fn build_table(create: &CreateTable, line: usize, diagnostics: &mut Diagnostics) -> Option<Table> {
    // Qualified names keep only the table part
    let name = create
        .name
        .0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default();
    if name.trim().is_empty() {
        diagnostics.error(DiagnosticKind::Parse, "Table name is empty", Location::line(line));
        return None;
    }

    let mut table = Table::new(&name);
    table.line = Some(line);
    let errors_before = diagnostics.error_count();

    if create.columns.is_empty() {
        diagnostics.error(
            DiagnosticKind::Parse,
            format!("Table '{}' has no columns", name),
            Location::table(&name).at_line(Some(line)),
        );
        return None;
    }

    for def in &create.columns {
        let column = build_column(def);
        if column.name.trim().is_empty() {
            diagnostics.error(
                DiagnosticKind::Parse,
                format!("Table '{}' has a column with an empty name", name),
                Location::table(&name).at_line(Some(line)),
            );
            continue;
        }
        if table.column(&column.name).is_some() {
            diagnostics.error(
                DiagnosticKind::Parse,
                format!("Duplicate column '{}' in table '{}'", column.name, name),
                Location::column(&name, &column.name).at_line(Some(line)),
            );
            continue;
        }
        table.add_column(column);
    }

    for constraint in &create.constraints {
        if let TableConstraint::PrimaryKey { columns, .. } = constraint {
            for key in columns {
                if !table.mark_primary_key(&key.value) {
                    diagnostics.error(
                        DiagnosticKind::Parse,
                        format!("Primary key of table '{}' names unknown column '{}'", name, key.value),
                        Location::column(&name, &key.value).at_line(Some(line)),
                    );
                }
            }
        }
    }

    if diagnostics.error_count() > errors_before {
        return None;
    }
    Some(table)
}

fn build_column(def: &ColumnDef) -> Column {
    let source_type = def.data_type.to_string();
    let mut column = Column::new(&def.name.value, &source_type);

    let base = source_type.to_uppercase();
    if matches!(base.as_str(), "SERIAL" | "BIGSERIAL" | "SMALLSERIAL" | "SERIAL2" | "SERIAL4" | "SERIAL8") {
        column.auto_increment = true;
        column.nullable = false;
    }

    for option in &def.options {
        match &option.option {
            ColumnOption::NotNull => column.nullable = false,
            ColumnOption::Null => column.nullable = true,
            ColumnOption::Default(expr) => column.default = Some(expr.to_string()),
            ColumnOption::Unique { is_primary: true, .. } => {
                column.is_primary_key = true;
                column.nullable = false;
            }
            ColumnOption::DialectSpecific(tokens) => {
                let is_auto = tokens.iter().any(|token| {
                    let word = token.to_string().to_uppercase();
                    word == "AUTO_INCREMENT" || word == "AUTOINCREMENT"
                });
                if is_auto {
                    column.auto_increment = true;
                }
            }
            ColumnOption::Generated { generation_expr: None, .. } => {
                // GENERATED ... AS IDENTITY
                column.auto_increment = true;
                column.nullable = false;
            }
            _ => {}
        }
    }
    if column.is_primary_key {
        column.nullable = false;
    }

    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_respects_quotes_and_comments() {
        let script = "-- leading; comment\nCREATE TABLE a (x TEXT DEFAULT 'a;b');\n/* c; */\nCREATE TABLE b (y INT)";
        let statements = split_statements(script, Dialect::MySql);

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].line, 2);
        assert!(statements[0].text.contains("'a;b'"));
        assert_eq!(statements[1].line, 4);
        assert_eq!(statements[1].text, "/* c; */\nCREATE TABLE b (y INT)");
    }

    #[test]
    fn test_split_drops_comment_only_statements() {
        let statements = split_statements("-- nothing here;\n ; /* still nothing */ ;", Dialect::Sqlite);
        assert!(statements.is_empty());
    }

    #[test]
    fn test_parse_users_table() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl(
            "CREATE TABLE users (id INT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(50) NOT NULL, bio TEXT DEFAULT 'none');",
            Dialect::MySql,
            &mut diagnostics,
        );

        assert!(diagnostics.is_empty());
        let users = schema.table("users").unwrap();
        assert_eq!(users.columns.len(), 3);
        assert!(users.columns[0].is_primary_key);
        assert!(users.columns[0].auto_increment);
        assert!(!users.columns[0].nullable);
        assert_eq!(users.columns[1].source_type, "VARCHAR(50)");
        assert!(!users.columns[1].nullable);
        assert!(users.columns[2].nullable);
        assert_eq!(users.columns[2].default.as_deref(), Some("'none'"));
    }

    #[test]
    fn test_table_level_primary_key() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl(
            "CREATE TABLE memberships (user_id INTEGER, group_id INTEGER, PRIMARY KEY (user_id, group_id));",
            Dialect::Postgres,
            &mut diagnostics,
        );

        let table = schema.table("memberships").unwrap();
        let keys: Vec<_> = table.primary_key().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(keys, vec!["user_id", "group_id"]);
    }

    #[test]
    fn test_postgres_serial_and_identity_are_auto_increment() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl(
            "CREATE TABLE a (id SERIAL PRIMARY KEY);\nCREATE TABLE b (id BIGINT GENERATED ALWAYS AS IDENTITY, note TEXT);",
            Dialect::Postgres,
            &mut diagnostics,
        );

        assert!(schema.table("a").unwrap().columns[0].auto_increment);
        assert!(schema.table("b").unwrap().columns[0].auto_increment);
        assert!(!schema.table("b").unwrap().columns[1].auto_increment);
    }

    #[test]
    fn test_unknown_primary_key_column_is_error() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl(
            "CREATE TABLE t (a INT, PRIMARY KEY (b));",
            Dialect::Sqlite,
            &mut diagnostics,
        );

        assert!(schema.is_empty());
        let errors = diagnostics.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("unknown column 'b'"));
    }

    #[test]
    fn test_duplicate_columns_are_error() {
        let mut diagnostics = Diagnostics::new();
        parse_ddl("CREATE TABLE t (a INT, A TEXT);", Dialect::MySql, &mut diagnostics);

        let errors = diagnostics.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Duplicate column 'A'"));
    }

    #[test]
    fn test_redefinition_is_last_write_wins() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl(
            "CREATE TABLE a (x INT);\nCREATE TABLE b (y INT);\nCREATE TABLE A (z TEXT);",
            Dialect::MySql,
            &mut diagnostics,
        );

        assert_eq!(schema.table_names(), vec!["b", "A"]);
        assert_eq!(schema.table("a").unwrap().columns[0].name, "z");
        let warnings: Vec<_> = diagnostics.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].location.line, Some(3));
    }

    #[test]
    fn test_bad_statements_are_skipped_with_warning() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl(
            "CREATE TABLE a (x INT);\nTHIS IS NOT SQL;\nINSERT INTO a VALUES (1);",
            Dialect::MySql,
            &mut diagnostics,
        );

        assert_eq!(schema.len(), 1);
        assert!(!diagnostics.has_errors());
        let lines: Vec<_> = diagnostics.iter().map(|d| (d.severity, d.location.line)).collect();
        assert_eq!(
            lines,
            vec![(Severity::Warning, Some(2)), (Severity::Warning, Some(3))]
        );
    }

    #[test]
    fn test_hash_is_a_comment_only_in_mysql() {
        let script = "CREATE TABLE a (x INT); # note; here\nCREATE TABLE b (y INT);";

        assert_eq!(split_statements(script, Dialect::MySql).len(), 2);
        let postgres = split_statements(script, Dialect::Postgres);
        assert_eq!(postgres.len(), 3);
        assert_eq!(postgres[1].text, "# note");
    }

    #[test]
    fn test_trailing_comma_in_column_list() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl("CREATE TABLE t (a INT, b INT,);", Dialect::MySql, &mut diagnostics);

        assert!(!diagnostics.has_errors());
        let names: Vec<_> = schema.table("t").unwrap().columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_create_like_and_as_select_are_skipped() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl(
            "CREATE TABLE a (x INT);\nCREATE TABLE b LIKE a;",
            Dialect::MySql,
            &mut diagnostics,
        );
        assert_eq!(schema.table_names(), vec!["a"]);
        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.warnings().count(), 1);

        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl(
            "CREATE TABLE a (x INTEGER);\nCREATE TABLE c AS SELECT * FROM a;",
            Dialect::Postgres,
            &mut diagnostics,
        );
        assert_eq!(schema.table_names(), vec!["a"]);
        assert!(!diagnostics.has_errors());
        let warnings: Vec<_> = diagnostics.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].location.line, Some(2));
    }

    #[test]
    fn test_explicit_null_does_not_relax_primary_key() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl("CREATE TABLE t (id INT PRIMARY KEY NULL);", Dialect::MySql, &mut diagnostics);

        let id = &schema.table("t").unwrap().columns[0];
        assert!(id.is_primary_key);
        assert!(!id.nullable);
    }

    #[test]
    fn test_no_tables_is_error() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_ddl("garbage here", Dialect::Postgres, &mut diagnostics);

        assert!(schema.is_empty());
        assert_eq!(diagnostics.error_count(), 1);
    }
}
