//! CSV sample parsing and column type inference
//!
//! The header row names the columns of a single table. Data rows are sampled
//! to pick the narrowest canonical type that accepts every non-empty value.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::schema::types::{CanonicalType, Column, Schema, Table};
use crate::utils::naming::{sanitize_identifier, table_name_from_file};

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("valid regex"));
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d*)\.(\d+)$|^[+-]?(\d+)\.?$").expect("valid regex"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Options controlling CSV reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Maximum number of data rows inspected
    pub sample_rows: usize,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            sample_rows: 1000,
            delimiter: b',',
        }
    }
}

/// What a single cell value could be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueShape {
    /// Parsed as i64, if the value is an integer literal in range
    pub integer: Option<i64>,
    /// (integer digits, fraction digits), if the value is a decimal literal
    pub decimal: Option<(usize, usize)>,
    pub date: bool,
    pub datetime: bool,
}

/// Classify one trimmed, non-empty cell value
pub fn classify_value(value: &str) -> ValueShape {
    let integer = if INTEGER_RE.is_match(value) {
        value.parse::<i64>().ok()
    } else {
        None
    };

    let decimal = DECIMAL_RE.captures(value).map(|caps| {
        let (whole, fraction) = match caps.get(2) {
            Some(fraction) => (caps.get(1).map_or("", |m| m.as_str()), fraction.as_str()),
            None => (caps.get(3).map_or("", |m| m.as_str()), ""),
        };
        let significant = whole.trim_start_matches('0').len().max(1);
        (significant, fraction.len())
    });

    let date = DATE_FORMATS
        .iter()
        .any(|format| NaiveDate::parse_from_str(value, format).is_ok());
    let datetime = DATETIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        || chrono::DateTime::parse_from_rfc3339(value).is_ok();

    ValueShape {
        integer,
        decimal,
        date,
        datetime,
    }
}

/// Running type evidence for one column
#[derive(Debug, Clone)]
pub struct ColumnInference {
    seen: usize,
    all_integer: bool,
    fits_i32: bool,
    all_decimal: bool,
    max_whole_digits: usize,
    max_scale: usize,
    all_date: bool,
    all_temporal: bool,
    any_datetime: bool,
}

impl Default for ColumnInference {
    fn default() -> Self {
        Self {
            seen: 0,
            all_integer: true,
            fits_i32: true,
            all_decimal: true,
            max_whole_digits: 0,
            max_scale: 0,
            all_date: true,
            all_temporal: true,
            any_datetime: false,
        }
    }
}

impl ColumnInference {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one cell; empty cells carry no evidence
    pub fn observe(&mut self, raw: &str) {
        let value = raw.trim();
        if value.is_empty() {
            return;
        }
        self.seen += 1;
        let shape = classify_value(value);

        match shape.integer {
            Some(n) => self.fits_i32 &= i32::try_from(n).is_ok(),
            None => self.all_integer = false,
        }
        match shape.decimal {
            Some((whole, scale)) => {
                self.max_whole_digits = self.max_whole_digits.max(whole);
                self.max_scale = self.max_scale.max(scale);
            }
            None => self.all_decimal = false,
        }
        self.all_date &= shape.date;
        self.all_temporal &= shape.date || shape.datetime;
        self.any_datetime |= shape.datetime;
    }

    /// Narrowest type consistent with everything observed
    pub fn canonical(&self) -> CanonicalType {
        if self.seen == 0 {
            return CanonicalType::Text(None);
        }
        if self.all_integer {
            return CanonicalType::Integer(if self.fits_i32 { 32 } else { 64 });
        }
        if self.all_decimal {
            let clamp = |n: usize| u16::try_from(n).unwrap_or(u16::MAX);
            return CanonicalType::Decimal {
                precision: clamp(self.max_whole_digits + self.max_scale),
                scale: clamp(self.max_scale),
            };
        }
        if self.all_date {
            return CanonicalType::Date;
        }
        if self.all_temporal && self.any_datetime {
            return CanonicalType::DateTime;
        }
        CanonicalType::Text(None)
    }
}

/// Parse a CSV sample into a single-table schema named after `source_name`
pub fn parse_csv(
    input: &[u8],
    source_name: &str,
    options: &CsvOptions,
    diagnostics: &mut Diagnostics,
) -> Schema {
    let mut schema = Schema::new();
    let table_name = table_name_from_file(source_name);
    let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);

    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            diagnostics.error(
                DiagnosticKind::Parse,
                format!("CSV header could not be read: {}", e),
                Location::table(&table_name).at_line(Some(1)),
            );
            return schema;
        }
    };

    if headers.iter().all(|cell| cell.trim().is_empty()) {
        diagnostics.error(
            DiagnosticKind::Parse,
            "CSV header row is empty",
            Location::table(&table_name).at_line(Some(1)),
        );
        return schema;
    }

    let mut table = Table::new(&table_name);
    table.line = Some(1);
    let errors_before = diagnostics.error_count();

    for (index, cell) in headers.iter().enumerate() {
        let cell = cell.trim();
        if cell.is_empty() {
            diagnostics.error(
                DiagnosticKind::Parse,
                format!("CSV header cell {} is empty", index + 1),
                Location::table(&table_name).at_line(Some(1)),
            );
            continue;
        }
        let name = sanitize_identifier(cell);
        if table.column(&name).is_some() {
            diagnostics.error(
                DiagnosticKind::Parse,
                format!("Duplicate CSV header '{}'", cell),
                Location::column(&table_name, &name).at_line(Some(1)),
            );
            continue;
        }
        table.add_column(Column::new(&name, "csv"));
    }
    if diagnostics.error_count() > errors_before {
        return schema;
    }

    let mut inferences = vec![ColumnInference::new(); headers.len()];
    let mut sampled = 0;
    for record in reader.records().take(options.sample_rows) {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize);
                diagnostics.error(
                    DiagnosticKind::Parse,
                    format!("Malformed CSV record: {}", e),
                    Location::table(&table_name).at_line(line),
                );
                return schema;
            }
        };
        for (inference, value) in inferences.iter_mut().zip(record.iter()) {
            inference.observe(value);
        }
        sampled += 1;
    }

    for (column, inference) in table.columns.iter_mut().zip(&inferences) {
        let canonical = inference.canonical();
        column.source_type = canonical.to_string();
        column.canonical_type = Some(canonical);
    }

    tracing::debug!(table = %table_name, columns = table.columns.len(), sampled, "Inferred CSV column types");
    schema.add_table(table);
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn infer(values: &[&str]) -> CanonicalType {
        let mut inference = ColumnInference::new();
        for value in values {
            inference.observe(value);
        }
        inference.canonical()
    }

    #[rstest]
    #[case(&["1", "-20", "300"], CanonicalType::Integer(32))]
    #[case(&["1", "3000000000"], CanonicalType::Integer(64))]
    #[case(&["1", "99999999999999999999"], CanonicalType::Decimal { precision: 20, scale: 0 })]
    #[case(&["1.5", "12.25", "7"], CanonicalType::Decimal { precision: 4, scale: 2 })]
    #[case(&["2024-01-31", "2023/12/01"], CanonicalType::Date)]
    #[case(&["2024-01-31", "2024-01-31 10:00:00"], CanonicalType::DateTime)]
    #[case(&["2024-01-31T10:00:00Z"], CanonicalType::DateTime)]
    #[case(&["1", "abc"], CanonicalType::Text(None))]
    #[case(&["2024-01-31", "soon"], CanonicalType::Text(None))]
    #[case(&["", "  "], CanonicalType::Text(None))]
    #[case(&["", "42", ""], CanonicalType::Integer(32))]
    fn test_inference_precedence(#[case] values: &[&str], #[case] expected: CanonicalType) {
        assert_eq!(infer(values), expected);
    }

    #[test]
    fn test_parse_csv_builds_single_table() {
        let input = b"id,Full Name,joined\n1,Ada,2024-01-01\n2,,2024-02-01\n";
        let mut diagnostics = Diagnostics::new();
        let schema = parse_csv(input, "people.csv", &CsvOptions::default(), &mut diagnostics);

        assert!(diagnostics.is_empty());
        let table = schema.table("people").unwrap();
        let columns: Vec<_> = table
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.canonical_type, c.nullable, c.is_primary_key))
            .collect();
        assert_eq!(
            columns,
            vec![
                ("id", Some(CanonicalType::Integer(32)), true, false),
                ("Full_Name", Some(CanonicalType::Text(None)), true, false),
                ("joined", Some(CanonicalType::Date), true, false),
            ]
        );
    }

    #[test]
    fn test_header_only_is_all_text() {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_csv(b"a,b\n", "t.csv", &CsvOptions::default(), &mut diagnostics);

        let table = schema.table("t").unwrap();
        assert!(table
            .columns
            .iter()
            .all(|c| c.canonical_type == Some(CanonicalType::Text(None))));
    }

    #[test]
    fn test_sampling_stops_at_limit() {
        let input = b"n\n1\n2\nthree\n";
        let options = CsvOptions {
            sample_rows: 2,
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let schema = parse_csv(input, "n.csv", &options, &mut diagnostics);

        assert_eq!(
            schema.table("n").unwrap().columns[0].canonical_type,
            Some(CanonicalType::Integer(32))
        );
    }

    #[rstest]
    #[case(b"".as_slice(), "empty")]
    #[case(b"a,,c\n1,2,3\n".as_slice(), "cell 2 is empty")]
    #[case(b"a,A\n1,2\n".as_slice(), "Duplicate CSV header")]
    #[case(b"a,b\n1,2\n3\n".as_slice(), "Malformed CSV record")]
    fn test_invalid_csv_is_error(#[case] input: &[u8], #[case] expected: &str) {
        let mut diagnostics = Diagnostics::new();
        let schema = parse_csv(input, "bad.csv", &CsvOptions::default(), &mut diagnostics);

        assert!(schema.is_empty());
        let errors = diagnostics.into_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains(expected), "{}", errors[0].message);
    }
}
