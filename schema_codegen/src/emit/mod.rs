//! Code emitter
//!
//! Turns each table of a resolved [`Schema`] into one source unit for the
//! requested language. Naming, keyword escaping and type lookup are shared;
//! the per-language modules only lay out text.

pub mod go;
pub mod php;
pub mod python;
pub mod rust;
pub mod statements;
pub mod typemap;
pub mod typescript;

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Location};
use crate::dialect::Dialect;
use crate::error::Error;
use crate::schema::types::{CanonicalType, Column, Schema, Table};
use crate::utils::naming::{apply_naming_convention, check_identifier_conflicts, sanitize_identifier, Casing};

pub use statements::SqlStatements;

static ANNOTATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"column "((?:[^"\\]|\\.)*)" ([a-z]+(?:\([0-9,]+\))?)((?: [a-z_]+)*)"#).expect("valid regex")
});

/// Target programming language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Rust,
    TypeScript,
    Python,
    Php,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Go,
        Language::Rust,
        Language::TypeScript,
        Language::Python,
        Language::Php,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Php => "php",
        }
    }

    /// Every identifier accepted for this language
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Language::Go => &["go", "golang"],
            Language::Rust => &["rust", "rs"],
            Language::TypeScript => &["typescript", "ts"],
            Language::Python => &["python", "py"],
            Language::Php => &["php"],
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Rust => "rs",
            Language::TypeScript => "ts",
            Language::Python => "py",
            Language::Php => "php",
        }
    }

    /// Fixed casing conventions of the language
    pub fn casing(&self) -> CasingRule {
        match self {
            Language::Go => CasingRule {
                type_name: Casing::Pascal,
                field_name: Casing::Pascal,
                file_name: Casing::Snake,
            },
            Language::Rust => CasingRule {
                type_name: Casing::Pascal,
                field_name: Casing::Snake,
                file_name: Casing::Snake,
            },
            Language::TypeScript => CasingRule {
                type_name: Casing::Pascal,
                field_name: Casing::Camel,
                file_name: Casing::Kebab,
            },
            Language::Python => CasingRule {
                type_name: Casing::Pascal,
                field_name: Casing::Snake,
                file_name: Casing::Snake,
            },
            Language::Php => CasingRule {
                type_name: Casing::Pascal,
                field_name: Casing::Camel,
                file_name: Casing::Pascal,
            },
        }
    }

    /// Reserved words that cannot be used as identifiers
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Language::Go => &[
                "break", "case", "chan", "const", "continue", "default", "defer", "else",
                "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
                "package", "range", "return", "select", "struct", "switch", "type", "var",
            ],
            Language::Rust => &[
                "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else",
                "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match",
                "mod", "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct",
                "super", "trait", "true", "type", "unsafe", "use", "where", "while", "abstract",
                "become", "box", "do", "final", "macro", "override", "priv", "typeof", "unsized",
                "virtual", "yield", "try", "gen",
            ],
            Language::TypeScript => &[
                "break", "case", "catch", "class", "const", "continue", "debugger", "default",
                "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for",
                "function", "if", "import", "in", "instanceof", "new", "null", "return", "super",
                "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with",
            ],
            Language::Python => &[
                "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
                "continue", "def", "del", "elif", "else", "except", "finally", "for", "from",
                "global", "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass",
                "raise", "return", "try", "while", "with", "yield",
            ],
            Language::Php => &[
                "abstract", "and", "array", "as", "break", "callable", "case", "catch", "class",
                "clone", "const", "continue", "declare", "default", "do", "echo", "else",
                "elseif", "empty", "enddeclare", "endfor", "endforeach", "endif", "endswitch",
                "endwhile", "enum", "eval", "exit", "extends", "final", "finally", "fn", "for",
                "foreach", "function", "global", "goto", "if", "implements", "include",
                "instanceof", "insteadof", "interface", "isset", "list", "match", "namespace",
                "new", "or", "print", "private", "protected", "public", "readonly", "require",
                "return", "static", "switch", "throw", "trait", "try", "unset", "use", "var",
                "while", "xor", "yield", "int", "float", "bool", "string", "true", "false",
                "null", "void", "iterable", "object", "mixed", "never",
            ],
        }
    }

    fn is_keyword(&self, name: &str) -> bool {
        match self {
            // PHP keywords are case-insensitive
            Language::Php => self.keywords().iter().any(|k| k.eq_ignore_ascii_case(name)),
            _ => self.keywords().contains(&name),
        }
    }

    /// Escape a reserved word so it can be used as an identifier
    pub fn escape_keyword(&self, name: &str) -> String {
        if !self.is_keyword(name) {
            return name.to_string();
        }
        match self {
            Language::Rust if !matches!(name, "self" | "Self" | "super" | "crate") => {
                format!("r#{}", name)
            }
            _ => format!("{}_", name),
        }
    }

    /// Render `value` as a string literal
    pub fn string_literal(&self, value: &str) -> String {
        match self {
            Language::Php => format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'")),
            _ => format!("\"{}\"", escape_quoted(value)),
        }
    }

    /// Name of the optional index file listing the generated units
    pub fn support_file_name(&self) -> &'static str {
        match self {
            Language::Go => "doc.go",
            Language::Rust => "mod.rs",
            Language::TypeScript => "index.ts",
            Language::Python => "__init__.py",
            Language::Php => "bootstrap.php",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.aliases().contains(&needle.as_str()))
            .ok_or_else(|| Error::UnsupportedTargetError(format!("Unsupported language: {}", s)))
    }
}

/// Casing applied to each kind of generated name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CasingRule {
    pub type_name: Casing,
    pub field_name: Casing,
    pub file_name: Casing,
}

/// One generated source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionUnit {
    pub file_name: String,
    pub content: String,
}

/// Per-field marker recording the source column.
///
/// Rendered as `column "<name>" <canonical>[ primary_key][ not_null][ auto_increment]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAnnotation {
    pub column: String,
    pub canonical: CanonicalType,
    pub primary_key: bool,
    pub not_null: bool,
    pub auto_increment: bool,
}

impl ColumnAnnotation {
    pub fn for_column(column: &Column, canonical: CanonicalType) -> Self {
        Self {
            column: column.name.clone(),
            canonical,
            primary_key: column.is_primary_key,
            not_null: !column.nullable,
            auto_increment: column.auto_increment,
        }
    }

    /// Find the first annotation in a line of generated code
    pub fn find(line: &str) -> Option<Self> {
        let caps = ANNOTATION_RE.captures(line)?;
        let column = unescape_text(caps.get(1)?.as_str());
        let canonical = caps.get(2)?.as_str().parse().ok()?;
        let flags: Vec<&str> = caps.get(3).map_or("", |m| m.as_str()).split_whitespace().collect();

        Some(Self {
            column,
            canonical,
            primary_key: flags.contains(&"primary_key"),
            not_null: flags.contains(&"not_null"),
            auto_increment: flags.contains(&"auto_increment"),
        })
    }
}

impl fmt::Display for ColumnAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column \"{}\" {}", comment_text(&self.column), self.canonical)?;
        if self.primary_key {
            write!(f, " primary_key")?;
        }
        if self.not_null {
            write!(f, " not_null")?;
        }
        if self.auto_increment {
            write!(f, " auto_increment")?;
        }
        Ok(())
    }
}

/// Names may not start with a digit in any target language
fn prefix_leading_digit(name: String, casing: Casing) -> String {
    if !name.starts_with(|c: char| c.is_ascii_digit()) {
        return name;
    }
    match casing {
        Casing::Pascal => format!("N{}", name),
        Casing::Camel => format!("n{}", name),
        Casing::Kebab => format!("n-{}", name),
        Casing::Snake | Casing::ScreamingSnake => format!("n_{}", name),
    }
}

/// Backslash-escape quotes and line breaks for a double-quoted literal
pub fn escape_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Text safe to place inside a line or block comment.
///
/// Line breaks are escaped and `*/` becomes `*\/`; [`unescape_text`] reverses it.
pub fn comment_text(value: &str) -> String {
    escape_quoted(value).replace("*/", "*\\/")
}

/// Reverse [`comment_text`]
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// A column ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldModel {
    /// Identifier in the target language
    pub name: String,
    pub column: String,
    pub type_token: &'static str,
    pub nullable: bool,
    pub annotation: ColumnAnnotation,
}

/// A table ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableModel {
    pub table: String,
    pub type_name: String,
    pub file_name: String,
    pub fields: Vec<FieldModel>,
    /// Columns of the primary key, in declaration order
    pub primary_key: Vec<String>,
    pub statements: SqlStatements,
}

/// Emits source units for one language and dialect
#[derive(Debug, Clone, Copy)]
pub struct CodeEmitter {
    language: Language,
    dialect: Dialect,
    support_files: bool,
}

impl CodeEmitter {
    pub fn new(language: Language, dialect: Dialect) -> Self {
        Self {
            language,
            dialect,
            support_files: false,
        }
    }

    /// Also emit the language's index file
    pub fn with_support_files(mut self, support_files: bool) -> Self {
        self.support_files = support_files;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Apply casing and keyword escaping to a raw name
    fn identifier(&self, raw: &str, casing: Casing) -> String {
        let cased = apply_naming_convention(&sanitize_identifier(raw), casing);
        let cased = if cased.is_empty() { apply_naming_convention("field", casing) } else { cased };
        self.language.escape_keyword(&prefix_leading_digit(cased, casing))
    }

    pub fn type_name(&self, table: &Table) -> String {
        self.identifier(&table.name, self.language.casing().type_name)
    }

    pub fn file_name(&self, table: &Table) -> String {
        let casing = self.language.casing().file_name;
        let stem = apply_naming_convention(&sanitize_identifier(&table.name), casing);
        let stem = if stem.is_empty() { "table".to_string() } else { stem };
        // Python and Rust name modules after the stem
        let stem = prefix_leading_digit(stem, casing);
        // Python imports modules by file stem
        let stem = match self.language {
            Language::Python => self.language.escape_keyword(&stem),
            _ => stem,
        };
        format!("{}.{}", stem, self.language.extension())
    }

    /// Build the render model of a table
    pub fn prepare(&self, table: &Table) -> Result<TableModel, Vec<Diagnostic>> {
        let mut errors = Vec::new();
        let mut fields = Vec::with_capacity(table.columns.len());

        for column in &table.columns {
            let location = Location::column(&table.name, &column.name).at_line(table.line);
            let canonical = match column.canonical_type {
                Some(canonical) => canonical,
                None => {
                    errors.push(Diagnostic::error(
                        DiagnosticKind::EmissionInvariant,
                        format!("Column '{}' reached emission without a resolved type", column.name),
                        location,
                    ));
                    continue;
                }
            };
            let tokens = match typemap::lookup(self.language, canonical) {
                Ok(tokens) => tokens,
                Err(e) => {
                    errors.push(Diagnostic::from(&e).with_location(location));
                    continue;
                }
            };

            fields.push(FieldModel {
                name: self.identifier(&column.name, self.language.casing().field_name),
                column: column.name.clone(),
                type_token: tokens.select(column.nullable),
                nullable: column.nullable,
                annotation: ColumnAnnotation::for_column(column, canonical),
            });
        }

        let names: Vec<String> = fields.iter().map(|f| f.name.clone()).collect();
        if let Some((first, second)) = check_identifier_conflicts(&names, false) {
            let columns: Vec<String> = fields
                .iter()
                .filter(|f| f.name == first)
                .map(|f| format!("'{}'", f.column))
                .collect();
            errors.push(Diagnostic::error(
                DiagnosticKind::Parse,
                format!(
                    "Columns {} of table '{}' map to the same {} field name '{}'",
                    columns.join(" and "),
                    table.name,
                    self.language,
                    second
                ),
                Location::table(&table.name).at_line(table.line),
            ));
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TableModel {
            table: table.name.clone(),
            type_name: self.type_name(table),
            file_name: self.file_name(table),
            fields,
            primary_key: table.primary_key().iter().map(|c| c.name.clone()).collect(),
            statements: statements::build(table, self.dialect),
        })
    }

    /// Render a prepared table
    pub fn render(&self, model: &TableModel) -> EmissionUnit {
        let content = match self.language {
            Language::Go => go::render_unit(model),
            Language::Rust => rust::render_unit(model),
            Language::TypeScript => typescript::render_unit(model),
            Language::Python => python::render_unit(model),
            Language::Php => php::render_unit(model),
        };
        EmissionUnit {
            file_name: model.file_name.clone(),
            content,
        }
    }

    /// Prepare and render one table
    pub fn emit_table(&self, table: &Table) -> Result<EmissionUnit, Vec<Diagnostic>> {
        let model = self.prepare(table)?;
        tracing::trace!(table = %table.name, file = %model.file_name, "Emitting table");
        Ok(self.render(&model))
    }

    /// Index file listing the generated units, if enabled
    pub fn support_unit(&self, schema: &Schema) -> Option<EmissionUnit> {
        if !self.support_files {
            return None;
        }
        let entries: Vec<(String, String)> = schema
            .tables()
            .map(|t| (self.type_name(t), self.file_name(t)))
            .collect();
        let content = match self.language {
            Language::Go => go::render_support(&entries),
            Language::Rust => rust::render_support(&entries),
            Language::TypeScript => typescript::render_support(&entries),
            Language::Python => python::render_support(&entries),
            Language::Php => php::render_support(&entries),
        };
        Some(EmissionUnit {
            file_name: self.language.support_file_name().to_string(),
            content,
        })
    }

    /// Names a unit declares in the package or module scope it shares with the others
    fn declared_names(&self, table: &Table) -> Vec<String> {
        let type_name = self.type_name(table);
        let suffixes: Vec<String> = match self.language {
            Language::Go => {
                let mut suffixes = vec!["Table".to_string(), "PrimaryKey".to_string()];
                suffixes.extend(
                    statements::build(table, self.dialect)
                        .named()
                        .into_iter()
                        .map(|(key, _)| apply_naming_convention(key, Casing::Pascal)),
                );
                suffixes
            }
            // index.ts re-exports every unit into one namespace
            Language::TypeScript => vec!["Table".to_string(), "PrimaryKey".to_string(), "Sql".to_string()],
            Language::Rust | Language::Python | Language::Php => Vec::new(),
        };

        let mut names = vec![type_name.clone()];
        names.extend(suffixes.iter().map(|suffix| format!("{}{}", type_name, suffix)));
        names
    }

    /// Report tables whose generated declarations or file names clash
    fn check_unit_names(&self, schema: &Schema) -> Vec<Diagnostic> {
        let mut errors = Vec::new();
        let tables: Vec<&Table> = schema.tables().collect();

        let declared: Vec<String> = tables.iter().flat_map(|t| self.declared_names(t)).collect();
        if let Some((_, clash)) = check_identifier_conflicts(&declared, false) {
            errors.push(Diagnostic::error(
                DiagnosticKind::Parse,
                format!("More than one table declares the {} name '{}'", self.language, clash),
                Location::default(),
            ));
        }

        let mut file_names: Vec<String> = tables.iter().map(|t| self.file_name(t)).collect();
        if self.support_files {
            file_names.push(self.language.support_file_name().to_string());
        }
        if let Some((_, clash)) = check_identifier_conflicts(&file_names, true) {
            errors.push(Diagnostic::error(
                DiagnosticKind::Parse,
                format!("More than one generated file would be named '{}'", clash),
                Location::default(),
            ));
        }

        errors
    }

    /// Emit every table in schema order
    pub fn emit(&self, schema: &Schema) -> Result<Vec<EmissionUnit>, Vec<Diagnostic>> {
        let results = schema.tables().map(|table| self.emit_table(table)).collect();
        self.collect(schema, results)
    }

    /// Emit every table on blocking worker threads, keeping schema order
    pub async fn emit_parallel(&self, schema: &Schema) -> Result<Vec<EmissionUnit>, Vec<Diagnostic>> {
        let tasks = schema.tables().map(|table| {
            let emitter = *self;
            let table = table.clone();
            tokio::task::spawn_blocking(move || emitter.emit_table(&table))
        });

        let results = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(vec![Diagnostic::error(
                        DiagnosticKind::EmissionInvariant,
                        format!("Emission task failed: {}", e),
                        Location::default(),
                    )])
                })
            })
            .collect();
        self.collect(schema, results)
    }

    fn collect(
        &self,
        schema: &Schema,
        results: Vec<Result<EmissionUnit, Vec<Diagnostic>>>,
    ) -> Result<Vec<EmissionUnit>, Vec<Diagnostic>> {
        let mut units = Vec::with_capacity(results.len() + 1);
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(unit) => units.push(unit),
                Err(diagnostics) => errors.extend(diagnostics),
            }
        }
        errors.extend(self.check_unit_names(schema));

        if !errors.is_empty() {
            return Err(errors);
        }
        units.extend(self.support_unit(schema));
        Ok(units)
    }
}
