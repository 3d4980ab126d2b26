//! TypeScript source layout

use crate::emit::{comment_text, Language, TableModel};
use crate::utils::naming::{apply_naming_convention, Casing};

/// Render one table as an exported interface plus SQL constants
pub fn render_unit(model: &TableModel) -> String {
    let lang = Language::TypeScript;
    let mut out = String::new();
    out.push_str(&format!(
        "// Generated by schema_codegen from the {} table. Do not edit.\n\n",
        comment_text(&model.table)
    ));

    out.push_str(&format!("/** Row of the {} table. */\n", comment_text(&model.table)));
    out.push_str(&format!("export interface {} {{\n", model.type_name));
    for field in &model.fields {
        out.push_str(&format!("  /** {} */\n", field.annotation));
        out.push_str(&format!("  {}: {};\n", field.name, field.type_token));
    }
    out.push_str("}\n\n");

    out.push_str(&format!(
        "export const {}Table = {};\n\n",
        model.type_name,
        lang.string_literal(&model.table)
    ));

    let keys: Vec<String> = model.primary_key.iter().map(|k| lang.string_literal(k)).collect();
    out.push_str(&format!(
        "export const {}PrimaryKey = [{}] as const;\n\n",
        model.type_name,
        keys.join(", ")
    ));

    out.push_str(&format!("export const {}Sql = {{\n", model.type_name));
    for (key, sql) in model.statements.named() {
        out.push_str(&format!(
            "  {}: {},\n",
            apply_naming_convention(key, Casing::Camel),
            lang.string_literal(sql)
        ));
    }
    out.push_str("} as const;\n");

    out
}

/// `index.ts` re-exporting every generated module
pub fn render_support(entries: &[(String, String)]) -> String {
    let mut out = String::from("// Generated by schema_codegen. Do not edit.\n\n");
    for (_, file_name) in entries {
        out.push_str(&format!(
            "export * from \"./{}\";\n",
            file_name.trim_end_matches(".ts")
        ));
    }
    out
}
