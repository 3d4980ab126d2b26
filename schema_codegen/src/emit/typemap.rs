//! Canonical type to target-language type tokens
//!
//! The table is built once and never changes. [`verify`] checks that every
//! language covers every [`TypeKind`].

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::emit::Language;
use crate::error::{Error, Result};
use crate::schema::types::{CanonicalType, TypeKind};

/// Type tokens for one canonical kind in one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTokens {
    pub plain: &'static str,
    /// Null-capable form used for nullable columns
    pub nullable: &'static str,
}

impl TypeTokens {
    pub fn select(&self, nullable: bool) -> &'static str {
        if nullable {
            self.nullable
        } else {
            self.plain
        }
    }
}

type LanguageTable = HashMap<TypeKind, TypeTokens>;

fn tokens(plain: &'static str, nullable: &'static str) -> TypeTokens {
    TypeTokens { plain, nullable }
}

static TYPE_TABLE: Lazy<HashMap<Language, LanguageTable>> = Lazy::new(|| {
    let mut table = HashMap::new();

    table.insert(
        Language::Go,
        HashMap::from([
            (TypeKind::Int8, tokens("int8", "sql.NullInt16")),
            (TypeKind::Int16, tokens("int16", "sql.NullInt16")),
            (TypeKind::Int32, tokens("int32", "sql.NullInt32")),
            (TypeKind::Int64, tokens("int64", "sql.NullInt64")),
            (TypeKind::Float32, tokens("float32", "sql.NullFloat64")),
            (TypeKind::Float64, tokens("float64", "sql.NullFloat64")),
            (TypeKind::Decimal, tokens("string", "sql.NullString")),
            (TypeKind::Text, tokens("string", "sql.NullString")),
            (TypeKind::Boolean, tokens("bool", "sql.NullBool")),
            (TypeKind::Date, tokens("time.Time", "sql.NullTime")),
            (TypeKind::DateTime, tokens("time.Time", "sql.NullTime")),
            (TypeKind::Binary, tokens("[]byte", "[]byte")),
        ]),
    );

    table.insert(
        Language::Rust,
        HashMap::from([
            (TypeKind::Int8, tokens("i8", "Option<i8>")),
            (TypeKind::Int16, tokens("i16", "Option<i16>")),
            (TypeKind::Int32, tokens("i32", "Option<i32>")),
            (TypeKind::Int64, tokens("i64", "Option<i64>")),
            (TypeKind::Float32, tokens("f32", "Option<f32>")),
            (TypeKind::Float64, tokens("f64", "Option<f64>")),
            (TypeKind::Decimal, tokens("String", "Option<String>")),
            (TypeKind::Text, tokens("String", "Option<String>")),
            (TypeKind::Boolean, tokens("bool", "Option<bool>")),
            (TypeKind::Date, tokens("chrono::NaiveDate", "Option<chrono::NaiveDate>")),
            (TypeKind::DateTime, tokens("chrono::NaiveDateTime", "Option<chrono::NaiveDateTime>")),
            (TypeKind::Binary, tokens("Vec<u8>", "Option<Vec<u8>>")),
        ]),
    );

    table.insert(
        Language::TypeScript,
        HashMap::from([
            (TypeKind::Int8, tokens("number", "number | null")),
            (TypeKind::Int16, tokens("number", "number | null")),
            (TypeKind::Int32, tokens("number", "number | null")),
            (TypeKind::Int64, tokens("bigint", "bigint | null")),
            (TypeKind::Float32, tokens("number", "number | null")),
            (TypeKind::Float64, tokens("number", "number | null")),
            (TypeKind::Decimal, tokens("string", "string | null")),
            (TypeKind::Text, tokens("string", "string | null")),
            (TypeKind::Boolean, tokens("boolean", "boolean | null")),
            (TypeKind::Date, tokens("Date", "Date | null")),
            (TypeKind::DateTime, tokens("Date", "Date | null")),
            (TypeKind::Binary, tokens("Uint8Array", "Uint8Array | null")),
        ]),
    );

    table.insert(
        Language::Python,
        HashMap::from([
            (TypeKind::Int8, tokens("int", "Optional[int]")),
            (TypeKind::Int16, tokens("int", "Optional[int]")),
            (TypeKind::Int32, tokens("int", "Optional[int]")),
            (TypeKind::Int64, tokens("int", "Optional[int]")),
            (TypeKind::Float32, tokens("float", "Optional[float]")),
            (TypeKind::Float64, tokens("float", "Optional[float]")),
            (TypeKind::Decimal, tokens("Decimal", "Optional[Decimal]")),
            (TypeKind::Text, tokens("str", "Optional[str]")),
            (TypeKind::Boolean, tokens("bool", "Optional[bool]")),
            (TypeKind::Date, tokens("date", "Optional[date]")),
            (TypeKind::DateTime, tokens("datetime", "Optional[datetime]")),
            (TypeKind::Binary, tokens("bytes", "Optional[bytes]")),
        ]),
    );

    table.insert(
        Language::Php,
        HashMap::from([
            (TypeKind::Int8, tokens("int", "?int")),
            (TypeKind::Int16, tokens("int", "?int")),
            (TypeKind::Int32, tokens("int", "?int")),
            (TypeKind::Int64, tokens("int", "?int")),
            (TypeKind::Float32, tokens("float", "?float")),
            (TypeKind::Float64, tokens("float", "?float")),
            (TypeKind::Decimal, tokens("string", "?string")),
            (TypeKind::Text, tokens("string", "?string")),
            (TypeKind::Boolean, tokens("bool", "?bool")),
            (TypeKind::Date, tokens("\\DateTimeImmutable", "?\\DateTimeImmutable")),
            (TypeKind::DateTime, tokens("\\DateTimeImmutable", "?\\DateTimeImmutable")),
            (TypeKind::Binary, tokens("string", "?string")),
        ]),
    );

    table
});

/// Check that every language has an entry for every canonical kind
pub fn verify() -> Result<()> {
    let mut missing = Vec::new();
    for language in Language::ALL {
        for kind in TypeKind::ALL {
            let present = TYPE_TABLE
                .get(&language)
                .map_or(false, |entries| entries.contains_key(&kind));
            if !present {
                missing.push(format!("{}/{:?}", language, kind));
            }
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::EmissionInvariantError(format!(
            "Type table has no entry for {}",
            missing.join(", ")
        )))
    }
}

/// Look up the tokens for a canonical type
pub fn lookup(language: Language, canonical: CanonicalType) -> Result<TypeTokens> {
    let kind = canonical.kind().ok_or_else(|| {
        Error::EmissionInvariantError(format!("Type '{}' cannot be emitted", canonical))
    })?;

    TYPE_TABLE
        .get(&language)
        .and_then(|entries| entries.get(&kind))
        .copied()
        .ok_or_else(|| {
            Error::EmissionInvariantError(format!("Type table has no entry for {}/{:?}", language, kind))
        })
}
