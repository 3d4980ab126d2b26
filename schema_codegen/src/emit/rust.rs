//! Rust source layout

use crate::emit::{comment_text, Language, TableModel};

/// Render one table as a Rust struct with associated SQL constants
pub fn render_unit(model: &TableModel) -> String {
    let lang = Language::Rust;
    let mut out = String::new();
    out.push_str(&format!(
        "//! Generated by schema_codegen from the `{}` table. Do not edit.\n\n",
        comment_text(&model.table)
    ));

    out.push_str(&format!("/// Row of the `{}` table.\n", comment_text(&model.table)));
    out.push_str("#[derive(Debug, Clone, PartialEq)]\n");
    out.push_str(&format!("pub struct {} {{\n", model.type_name));
    for field in &model.fields {
        out.push_str(&format!("    /// {}\n", field.annotation));
        out.push_str(&format!("    pub {}: {},\n", field.name, field.type_token));
    }
    out.push_str("}\n\n");

    let keys: Vec<String> = model.primary_key.iter().map(|k| lang.string_literal(k)).collect();
    out.push_str(&format!("impl {} {{\n", model.type_name));
    out.push_str(&format!(
        "    pub const TABLE: &'static str = {};\n",
        lang.string_literal(&model.table)
    ));
    out.push_str(&format!(
        "    pub const PRIMARY_KEY: &'static [&'static str] = &[{}];\n",
        keys.join(", ")
    ));
    for (key, sql) in model.statements.named() {
        out.push_str(&format!(
            "    pub const {}: &'static str = {};\n",
            key.to_uppercase(),
            lang.string_literal(sql)
        ));
    }
    out.push_str("}\n");

    out
}

/// `mod.rs` declaring every generated module
pub fn render_support(entries: &[(String, String)]) -> String {
    let mut out = String::from("//! Generated by schema_codegen. Do not edit.\n\n");
    for (_, file_name) in entries {
        let module = file_name.trim_end_matches(".rs");
        out.push_str(&format!("pub mod {};\n", Language::Rust.escape_keyword(module)));
    }
    out.push('\n');
    for (type_name, file_name) in entries {
        let module = file_name.trim_end_matches(".rs");
        out.push_str(&format!(
            "pub use {}::{};\n",
            Language::Rust.escape_keyword(module),
            type_name
        ));
    }
    out
}
