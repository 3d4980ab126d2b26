//! PHP source layout

use crate::emit::{comment_text, Language, TableModel};

const NAMESPACE: &str = "Models";

/// Render one table as a final class with typed properties
pub fn render_unit(model: &TableModel) -> String {
    let lang = Language::Php;
    let mut out = String::new();
    out.push_str("<?php\n\ndeclare(strict_types=1);\n\n");
    out.push_str(&format!(
        "// Generated by schema_codegen from the {} table. Do not edit.\n\n",
        comment_text(&model.table)
    ));
    out.push_str(&format!("namespace {};\n\n", NAMESPACE));

    out.push_str(&format!("/**\n * Row of the {} table.\n */\n", comment_text(&model.table)));
    out.push_str(&format!("final class {}\n{{\n", model.type_name));

    out.push_str(&format!(
        "    public const TABLE = {};\n",
        lang.string_literal(&model.table)
    ));
    let keys: Vec<String> = model.primary_key.iter().map(|k| lang.string_literal(k)).collect();
    out.push_str(&format!("    public const PRIMARY_KEY = [{}];\n", keys.join(", ")));
    for (key, sql) in model.statements.named() {
        out.push_str(&format!(
            "    public const {} = {};\n",
            key.to_uppercase(),
            lang.string_literal(sql)
        ));
    }

    for field in &model.fields {
        out.push('\n');
        out.push_str(&format!("    /** {} */\n", field.annotation));
        if field.nullable {
            out.push_str(&format!("    public {} ${} = null;\n", field.type_token, field.name));
        } else {
            out.push_str(&format!("    public {} ${};\n", field.type_token, field.name));
        }
    }
    out.push_str("}\n");

    out
}

/// `bootstrap.php` requiring every generated class
pub fn render_support(entries: &[(String, String)]) -> String {
    let mut out = String::from("<?php\n\ndeclare(strict_types=1);\n\n// Generated by schema_codegen. Do not edit.\n\n");
    for (_, file_name) in entries {
        out.push_str(&format!(
            "require_once __DIR__ . {};\n",
            Language::Php.string_literal(&format!("/{}", file_name))
        ));
    }
    out
}
