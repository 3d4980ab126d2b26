//! Property tests for CSV column type inference

use proptest::prelude::*;

use schema_codegen::diagnostics::Diagnostics;
use schema_codegen::schema::csv::{parse_csv, ColumnInference, CsvOptions};
use schema_codegen::CanonicalType;

fn infer<'a>(values: impl IntoIterator<Item = &'a str>) -> CanonicalType {
    let mut inference = ColumnInference::new();
    for value in values {
        inference.observe(value);
    }
    inference.canonical()
}

proptest! {
    #[test]
    fn integers_within_i32_infer_integer_32(values in prop::collection::vec(any::<i32>(), 1..50)) {
        let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        prop_assert_eq!(infer(rendered.iter().map(String::as_str)), CanonicalType::Integer(32));
    }

    #[test]
    fn one_wide_integer_widens_to_64(
        values in prop::collection::vec(any::<i32>(), 0..20),
        wide in (i32::MAX as i64 + 1)..i64::MAX,
    ) {
        let mut rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        rendered.push(wide.to_string());
        prop_assert_eq!(infer(rendered.iter().map(String::as_str)), CanonicalType::Integer(64));
    }

    #[test]
    fn decimals_cover_every_value(
        values in prop::collection::vec((0u32..1_000_000, 0u32..1000), 1..30),
    ) {
        let rendered: Vec<String> = values.iter().map(|(w, f)| format!("{}.{:03}", w, f)).collect();
        let whole = rendered.iter().map(|r| r.split('.').next().unwrap().len()).max().unwrap();

        match infer(rendered.iter().map(String::as_str)) {
            CanonicalType::Decimal { precision, scale } => {
                prop_assert_eq!(scale, 3);
                prop_assert_eq!(precision as usize, whole + 3);
            }
            other => prop_assert!(false, "expected decimal, got {:?}", other),
        }
    }

    #[test]
    fn any_free_text_falls_back_to_text(
        values in prop::collection::vec(any::<i32>(), 0..20),
        word in "[a-zA-Z]{1,12}",
    ) {
        let mut rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        rendered.push(word);
        prop_assert_eq!(infer(rendered.iter().map(String::as_str)), CanonicalType::Text(None));
    }

    #[test]
    fn empty_cells_carry_no_evidence(values in prop::collection::vec(any::<i16>(), 1..20), blanks in 0usize..10) {
        let mut rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        rendered.extend(std::iter::repeat(String::new()).take(blanks));
        prop_assert_eq!(infer(rendered.iter().map(String::as_str)), CanonicalType::Integer(32));
    }

    #[test]
    fn every_header_becomes_a_column(headers in prop::collection::btree_set("[a-z]{1,8}", 1..10)) {
        let headers: Vec<String> = headers.into_iter().collect();
        let row: Vec<&str> = headers.iter().map(|_| "1").collect();
        let input = format!("{}\n{}\n", headers.join(","), row.join(","));

        let mut diagnostics = Diagnostics::new();
        let schema = parse_csv(input.as_bytes(), "sample.csv", &CsvOptions::default(), &mut diagnostics);

        prop_assert!(!diagnostics.has_errors());
        let table = schema.table("sample").unwrap();
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let expected: Vec<&str> = headers.iter().map(String::as_str).collect();
        prop_assert_eq!(names, expected);
    }
}

#[test]
fn dates_and_datetimes_mix_to_datetime() {
    assert_eq!(infer(["2024-01-02", "2024-02-03"]), CanonicalType::Date);
    assert_eq!(infer(["2024-01-02", "2024-02-03 10:11:12"]), CanonicalType::DateTime);
}
