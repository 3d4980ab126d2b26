//! Generated units must carry enough information to recover the columns they came from

use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::*;

use schema_codegen::diagnostics::Diagnostics;
use schema_codegen::dialect::resolve_schema;
use schema_codegen::schema::{parse_into, ParseOptions};
use schema_codegen::{
    CanonicalType, ColumnAnnotation, Config, Dialect, EmissionUnit, GenerationRequest, Generator, InputKind, Schema,
};

const POSTGRES_DDL: &str = r#"
CREATE TABLE accounts (
    id BIGSERIAL PRIMARY KEY,
    email VARCHAR(255) NOT NULL,
    balance NUMERIC(12,2),
    active BOOLEAN NOT NULL DEFAULT TRUE,
    born DATE,
    created_at TIMESTAMP NOT NULL,
    avatar BYTEA,
    score REAL,
    "type" TEXT,
    "a*/b" INTEGER,
    "x
y" TEXT
);
"#;

const MYSQL_DDL: &str = r#"
CREATE TABLE accounts (
    id BIGINT AUTO_INCREMENT PRIMARY KEY,
    tiny TINYINT,
    small SMALLINT NOT NULL,
    email VARCHAR(255) NOT NULL,
    balance DECIMAL(12,2),
    ratio FLOAT,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    born DATE,
    created_at DATETIME NOT NULL,
    avatar BLOB,
    `type` TEXT
);
"#;

const SQLITE_DDL: &str = r#"
CREATE TABLE accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tiny TINYINT,
    email VARCHAR(255) NOT NULL,
    balance NUMERIC(12,2),
    ratio REAL,
    active BOOLEAN NOT NULL,
    born DATE,
    created_at DATETIME NOT NULL,
    avatar BLOB,
    "type" TEXT
);
"#;

fn fixture(dialect: Dialect) -> (&'static str, &'static str) {
    match dialect {
        Dialect::Postgres => (POSTGRES_DDL, "postgresql"),
        Dialect::MySql => (MYSQL_DDL, "mysql"),
        Dialect::Sqlite => (SQLITE_DDL, "sqlite"),
    }
}

/// Annotations of the resolved schema, in column order
fn expected_annotations(ddl: &str, dialect: Dialect) -> Vec<ColumnAnnotation> {
    let mut diagnostics = Diagnostics::new();
    let mut schema: Schema = parse_into(
        ddl.as_bytes(),
        InputKind::Ddl,
        dialect,
        &ParseOptions::default(),
        "schema.sql",
        &mut diagnostics,
    );
    resolve_schema(&mut schema, dialect, &mut diagnostics);
    assert!(!diagnostics.has_errors());

    schema
        .tables()
        .flat_map(|t| t.columns.iter())
        .map(|c| ColumnAnnotation::for_column(c, c.canonical_type.unwrap()))
        .collect()
}

async fn emit(lang: &str, dialect: Dialect) -> EmissionUnit {
    let (ddl, rdbms) = fixture(dialect);
    let generator = Generator::new(Arc::new(Config::default())).unwrap();
    let request = GenerationRequest::ddl(ddl, lang, rdbms);
    let mut units = generator.emit(&request).await.unwrap();
    assert_eq!(units.len(), 1);
    units.remove(0)
}

/// Annotation of each field with whether its declared type admits null
fn recovered(lang: &str, content: &str) -> Vec<(ColumnAnnotation, bool)> {
    let lines: Vec<&str> = content.lines().collect();
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let annotation = match ColumnAnnotation::find(line) {
            Some(annotation) => annotation,
            None => continue,
        };
        let nullable = match lang {
            "go" => {
                let token = line.split_whitespace().nth(1).unwrap_or_default();
                token.starts_with("sql.Null")
            }
            "typescript" => lines[i + 1].contains("| null"),
            "python" => line.split('#').next().unwrap_or_default().contains("Optional["),
            "php" => lines[i + 1].contains("public ?"),
            other => panic!("no textual rule for {}", other),
        };
        out.push((annotation, nullable));
    }
    out
}

#[rstest]
#[tokio::test]
async fn test_annotations_recover_columns(
    #[values("go", "typescript", "python", "php")] lang: &str,
    #[values(Dialect::MySql, Dialect::Postgres, Dialect::Sqlite)] dialect: Dialect,
) {
    let expected = expected_annotations(fixture(dialect).0, dialect);
    let unit = emit(lang, dialect).await;

    let recovered = recovered(lang, &unit.content);
    let annotations: Vec<ColumnAnnotation> = recovered.iter().map(|(a, _)| a.clone()).collect();
    assert_eq!(annotations, expected);

    for (annotation, nullable) in recovered {
        // Go has no nullable byte slice wrapper
        if lang == "go" && matches!(annotation.canonical, CanonicalType::Binary(_)) {
            continue;
        }
        assert_eq!(nullable, !annotation.not_null, "{} {:?} field {}", lang, dialect, annotation.column);
    }
}

#[rstest]
#[tokio::test]
async fn test_rust_unit_parses_and_recovers_columns(
    #[values(Dialect::MySql, Dialect::Postgres, Dialect::Sqlite)] dialect: Dialect,
) {
    let expected = expected_annotations(fixture(dialect).0, dialect);
    let unit = emit("rust", dialect).await;

    let file = syn::parse_file(&unit.content).unwrap();
    let item = file
        .items
        .iter()
        .find_map(|item| match item {
            syn::Item::Struct(s) => Some(s),
            _ => None,
        })
        .unwrap();
    assert_eq!(item.ident, "Accounts");

    let mut recovered = Vec::new();
    for field in &item.fields {
        let doc = field
            .attrs
            .iter()
            .find_map(|attr| match &attr.meta {
                syn::Meta::NameValue(nv) if nv.path.is_ident("doc") => match &nv.value {
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(s), ..
                    }) => Some(s.value()),
                    _ => None,
                },
                _ => None,
            })
            .unwrap();
        let annotation = ColumnAnnotation::find(&doc).unwrap();

        let is_option = match &field.ty {
            syn::Type::Path(p) => p.path.segments.last().map_or(false, |s| s.ident == "Option"),
            _ => false,
        };
        assert_eq!(is_option, !annotation.not_null, "field {}", annotation.column);
        recovered.push(annotation);
    }

    assert_eq!(recovered, expected);

    let names: Vec<String> = item
        .fields
        .iter()
        .map(|f| f.ident.as_ref().unwrap().to_string())
        .collect();
    assert!(names.contains(&"r#type".to_string()));
}

#[test]
fn test_annotation_text_round_trips() {
    let annotation = ColumnAnnotation {
        column: "odd \"name\"".to_string(),
        canonical: CanonicalType::Decimal { precision: 12, scale: 2 },
        primary_key: true,
        not_null: true,
        auto_increment: false,
    };

    let line = format!("    // {}", annotation);
    assert_eq!(ColumnAnnotation::find(&line), Some(annotation));
}

#[tokio::test]
async fn test_awkward_column_names_survive_every_language() {
    let expected = vec!["a*/b".to_string(), "x\ny".to_string()];
    for lang in ["go", "rust", "typescript", "python", "php"] {
        let unit = emit(lang, Dialect::Postgres).await;
        let columns: Vec<String> = unit
            .content
            .lines()
            .filter_map(ColumnAnnotation::find)
            .map(|a| a.column)
            .filter(|c| !c.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_'))
            .collect();
        assert_eq!(columns, expected, "{}", lang);
    }
}
