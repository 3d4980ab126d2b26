//! Python source layout

use crate::emit::{comment_text, Language, TableModel};

/// Render one table as a dataclass with SQL class constants
pub fn render_unit(model: &TableModel) -> String {
    let lang = Language::Python;
    let mut out = String::new();
    out.push_str(&format!(
        "# Generated by schema_codegen from the {} table. Do not edit.\n",
        comment_text(&model.table)
    ));
    out.push_str("from __future__ import annotations\n\n");
    out.push_str("from dataclasses import dataclass\n");

    let uses = |token: &str| {
        model.fields.iter().any(|f| {
            f.type_token == token || f.type_token == format!("Optional[{}]", token)
        })
    };
    let temporal: Vec<&str> = ["date", "datetime"].into_iter().filter(|t| uses(*t)).collect();
    if !temporal.is_empty() {
        out.push_str(&format!("from datetime import {}\n", temporal.join(", ")));
    }
    if uses("Decimal") {
        out.push_str("from decimal import Decimal\n");
    }
    if model.fields.iter().any(|f| f.nullable) {
        out.push_str("from typing import ClassVar, Optional, Tuple\n");
    } else {
        out.push_str("from typing import ClassVar, Tuple\n");
    }
    out.push_str("\n\n");

    out.push_str("@dataclass\n");
    out.push_str(&format!("class {}:\n", model.type_name));
    out.push_str(&format!("    \"\"\"Row of the {} table.\"\"\"\n\n", comment_text(&model.table)));

    out.push_str(&format!(
        "    TABLE: ClassVar[str] = {}\n",
        lang.string_literal(&model.table)
    ));
    let keys: Vec<String> = model.primary_key.iter().map(|k| lang.string_literal(k)).collect();
    let key_tuple = match keys.len() {
        0 => "()".to_string(),
        1 => format!("({},)", keys[0]),
        _ => format!("({})", keys.join(", ")),
    };
    out.push_str(&format!("    PRIMARY_KEY: ClassVar[Tuple[str, ...]] = {}\n", key_tuple));
    for (key, sql) in model.statements.named() {
        out.push_str(&format!(
            "    {}: ClassVar[str] = {}\n",
            key.to_uppercase(),
            lang.string_literal(sql)
        ));
    }
    out.push('\n');

    for field in &model.fields {
        out.push_str(&format!(
            "    {}: {}  # {}\n",
            field.name, field.type_token, field.annotation
        ));
    }

    out
}

/// `__init__.py` importing every generated class
pub fn render_support(entries: &[(String, String)]) -> String {
    let mut out = String::from("# Generated by schema_codegen. Do not edit.\n");
    for (type_name, file_name) in entries {
        out.push_str(&format!(
            "from .{} import {}\n",
            file_name.trim_end_matches(".py"),
            type_name
        ));
    }
    let names: Vec<String> = entries
        .iter()
        .map(|(type_name, _)| Language::Python.string_literal(type_name))
        .collect();
    out.push_str(&format!("\n__all__ = [{}]\n", names.join(", ")));
    out
}
