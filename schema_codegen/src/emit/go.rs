//! Go source layout

use crate::emit::{comment_text, escape_quoted, Language, TableModel};
use crate::utils::naming::{apply_naming_convention, Casing};

const PACKAGE: &str = "models";

/// Render one table as a Go struct with `db` tags
pub fn render_unit(model: &TableModel) -> String {
    let lang = Language::Go;
    let mut out = String::new();
    out.push_str("// Code generated by schema_codegen. DO NOT EDIT.\n\n");
    out.push_str(&format!("package {}\n\n", PACKAGE));

    let mut imports = Vec::new();
    if model.fields.iter().any(|f| f.type_token.starts_with("sql.")) {
        imports.push("database/sql");
    }
    if model.fields.iter().any(|f| f.type_token.starts_with("time.")) {
        imports.push("time");
    }
    match imports.as_slice() {
        [] => {}
        [single] => out.push_str(&format!("import \"{}\"\n\n", single)),
        many => {
            out.push_str("import (\n");
            for import in many {
                out.push_str(&format!("\t\"{}\"\n", import));
            }
            out.push_str(")\n\n");
        }
    }

    let tags: Vec<String> = model
        .fields
        .iter()
        .map(|f| struct_tag(&f.column))
        .collect();
    let name_width = model.fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    let type_width = model.fields.iter().map(|f| f.type_token.len()).max().unwrap_or(0);
    let tag_width = tags.iter().map(String::len).max().unwrap_or(0);

    out.push_str(&format!(
        "// {} maps rows of the {} table.\n",
        model.type_name,
        comment_text(&model.table)
    ));
    out.push_str(&format!("type {} struct {{\n", model.type_name));
    for (field, tag) in model.fields.iter().zip(&tags) {
        out.push_str(&format!(
            "\t{:name_width$} {:type_width$} {:tag_width$} // {}\n",
            field.name,
            field.type_token,
            tag,
            field.annotation,
            name_width = name_width,
            type_width = type_width,
            tag_width = tag_width,
        ));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("// {}Table is the name of the source table.\n", model.type_name));
    out.push_str(&format!(
        "const {}Table = {}\n\n",
        model.type_name,
        lang.string_literal(&model.table)
    ));

    let constants: Vec<(String, &str)> = model
        .statements
        .named()
        .into_iter()
        .map(|(key, sql)| (format!("{}{}", model.type_name, apply_naming_convention(key, Casing::Pascal)), sql))
        .collect();
    let const_width = constants.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    out.push_str(&format!("// SQL statements for the {} table.\n", comment_text(&model.table)));
    out.push_str("const (\n");
    for (name, sql) in &constants {
        out.push_str(&format!(
            "\t{:width$} = {}\n",
            name,
            lang.string_literal(sql),
            width = const_width
        ));
    }
    out.push_str(")\n\n");

    let keys: Vec<String> = model.primary_key.iter().map(|k| lang.string_literal(k)).collect();
    out.push_str(&format!(
        "// {}PrimaryKey lists the primary key columns.\n",
        model.type_name
    ));
    out.push_str(&format!(
        "var {}PrimaryKey = []string{{{}}}\n",
        model.type_name,
        keys.join(", ")
    ));

    out
}

/// `db` struct tag; a raw string unless the column name contains a backtick
fn struct_tag(column: &str) -> String {
    let tag = format!("db:\"{}\"", escape_quoted(column));
    if tag.contains('`') {
        Language::Go.string_literal(&tag)
    } else {
        format!("`{}`", tag)
    }
}

/// Package documentation listing the generated types
pub fn render_support(entries: &[(String, String)]) -> String {
    let types: Vec<&str> = entries.iter().map(|(type_name, _)| type_name.as_str()).collect();
    format!(
        "// Code generated by schema_codegen. DO NOT EDIT.\n\n\
         // Package {} holds generated table models.\n\
         //\n\
         // Types: {}\n\
         package {}\n",
        PACKAGE,
        types.join(", "),
        PACKAGE
    )
}
