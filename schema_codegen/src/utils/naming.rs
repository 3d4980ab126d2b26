//! Naming utilities for schema_codegen
//!
//! This module provides identifier casing, sanitizing and artifact naming.

use chrono::{DateTime, Utc};
use inflector::Inflector;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;

/// A casing convention applied to generated identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Casing {
    Snake,
    Camel,
    Pascal,
    Kebab,
    ScreamingSnake,
}

/// Apply a naming convention to a string
pub fn apply_naming_convention(name: &str, casing: Casing) -> String {
    match casing {
        Casing::Snake => name.to_snake_case(),
        Casing::Camel => name.to_camel_case(),
        Casing::Pascal => name.to_pascal_case(),
        Casing::Kebab => name.to_kebab_case(),
        Casing::ScreamingSnake => name.to_screaming_snake_case(),
    }
}

/// Sanitize a raw name into an identifier
pub fn sanitize_identifier(name: &str) -> String {
    // Remove or replace characters not allowed in identifiers
    let mut sanitized = name
        .trim()
        .replace(|c: char| !c.is_ascii_alphanumeric() && c != '_', "_");

    // Ensure identifier doesn't start with a number
    if sanitized.chars().next().map_or(false, |c| c.is_ascii_digit()) {
        sanitized = format!("_{}", sanitized);
    }

    sanitized
}

/// Derive a table name from an uploaded file name
pub fn table_name_from_file(file_name: &str) -> String {
    let stem = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    let stem = match stem.rfind('.') {
        Some(dot) if dot > 0 => &stem[..dot],
        _ => stem,
    };

    let sanitized = sanitize_identifier(stem);
    if sanitized.trim_matches('_').is_empty() {
        "table".to_string()
    } else {
        sanitized
    }
}

/// Check for name conflicts in a list of identifiers
pub fn check_identifier_conflicts(
    names: &[String],
    ignore_case: bool,
) -> Option<(String, String)> {
    let mut seen = HashMap::<String, String>::new();

    for name in names {
        let key = if ignore_case { name.to_lowercase() } else { name.clone() };

        if let Some(existing) = seen.get(&key) {
            return Some((existing.clone(), name.clone()));
        }
        seen.insert(key, name.clone());
    }

    None
}

/// Format name as a valid file name
pub fn format_file_name(name: &str) -> String {
    name.replace(
        |c: char| matches!(c, ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'),
        "_",
    )
}

/// Random alphanumeric suffix used to keep artifact names unique
pub fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Create a timestamped, collision-resistant artifact stem
pub fn create_artifact_stem(prefix: &str, now: DateTime<Utc>, suffix: &str) -> String {
    format!(
        "{}-{}-{}",
        format_file_name(prefix),
        now.format("%Y%m%d-%H%M%S"),
        suffix
    )
}
