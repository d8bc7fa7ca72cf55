//! Comma-separated upload parsing.
//!
//! The first non-blank record is the header. Columns are taken as-is; only the
//! shape (same width on every row) and numeric cells are checked. Empty cells
//! become `NaN`, which the model rejects later.
//!
//! Fields may be double-quoted. Quoted fields keep commas, line breaks and
//! surrounding spaces, and `""` inside them is a literal quote. Unquoted
//! fields are trimmed.

use thiserror::Error;

use super::FeatureTable;

const DELIMITER: char = ',';
const QUOTE: char = '"';
const BOM: char = '\u{feff}';

/// Reasons an uploaded file could not be turned into a [`FeatureTable`].
#[derive(Debug, Error, PartialEq)]
pub enum CsvError {
    /// Upload bytes were not UTF-8 text.
    #[error("File is not valid UTF-8 text")]
    NotUtf8,
    /// The file had no header line.
    #[error("File has no header row")]
    MissingHeader,
    /// A quoted field was still open at the end of the file.
    #[error("Line {line} opens a quoted field that is never closed")]
    UnterminatedQuote { line: usize },
    /// A data line had a different number of fields than the header.
    #[error("Line {line} has {found} fields but the header has {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
    /// A cell could not be read as a number.
    #[error("Line {line}, column '{column}': '{value}' is not a number")]
    NonNumeric {
        line: usize,
        column: String,
        value: String,
    },
}

/// Parse uploaded CSV bytes into a feature table.
pub fn parse_table(bytes: &[u8]) -> Result<FeatureTable, CsvError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CsvError::NotUtf8)?;
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut records = read_records(text)?.into_iter();
    let columns = records.next().ok_or(CsvError::MissingHeader)?.fields;

    let mut rows = Vec::new();
    for Record { line, fields } in records {
        if fields.len() != columns.len() {
            return Err(CsvError::RaggedRow {
                line,
                expected: columns.len(),
                found: fields.len(),
            });
        }
        let row = fields
            .iter()
            .zip(&columns)
            .map(|(field, column)| parse_cell(field, column, line))
            .collect::<Result<Vec<f64>, CsvError>>()?;
        rows.push(row);
    }

    Ok(FeatureTable { columns, rows })
}

/// One logical CSV record and the line it starts on.
struct Record {
    line: usize,
    fields: Vec<String>,
}

#[derive(Default)]
struct RecordBuilder {
    fields: Vec<String>,
    field: String,
    /// The current field opened with a quote.
    quoted: bool,
    /// Inside the quotes of the current field.
    in_quotes: bool,
}

impl RecordBuilder {
    fn end_field(&mut self) {
        let field = std::mem::take(&mut self.field);
        let field = if self.quoted {
            field
        } else {
            field.trim().to_string()
        };
        self.fields.push(field);
        self.quoted = false;
    }

    /// Close the record, dropping it when the line was blank.
    fn end_record(&mut self, line: usize, records: &mut Vec<Record>) {
        self.end_field();
        let fields = std::mem::take(&mut self.fields);
        let blank = matches!(fields.as_slice(), [only] if only.trim().is_empty());
        if !blank {
            records.push(Record { line, fields });
        }
    }
}

fn read_records(text: &str) -> Result<Vec<Record>, CsvError> {
    let mut records = Vec::new();
    let mut builder = RecordBuilder::default();
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\r' && chars.peek() == Some(&'\n') {
            continue;
        }
        if builder.in_quotes {
            match ch {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    builder.field.push(QUOTE);
                }
                QUOTE => builder.in_quotes = false,
                _ => {
                    if ch == '\n' {
                        line += 1;
                    }
                    builder.field.push(ch);
                }
            }
            continue;
        }
        match ch {
            QUOTE if !builder.quoted && builder.field.trim().is_empty() => {
                builder.field.clear();
                builder.quoted = true;
                builder.in_quotes = true;
            }
            DELIMITER => builder.end_field(),
            '\n' => {
                builder.end_record(record_line, &mut records);
                line += 1;
                record_line = line;
            }
            // Spaces between a closing quote and the delimiter.
            _ if builder.quoted && ch.is_whitespace() => {}
            _ => builder.field.push(ch),
        }
    }

    if builder.in_quotes {
        return Err(CsvError::UnterminatedQuote { line: record_line });
    }
    builder.end_record(record_line, &mut records);
    Ok(records)
}

fn parse_cell(field: &str, column: &str, line: usize) -> Result<f64, CsvError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|_| CsvError::NonNumeric {
        line,
        column: column.to_string(),
        value: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows_in_order() {
        let table = parse_table(b"close,volume,volatility,lag1_return\n100,5000,0.25,0.5\n101.5,4200,0.3,-1.2\n")
            .unwrap();
        assert_eq!(
            table.columns(),
            ["close", "volume", "volatility", "lag1_return"]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[1], vec![101.5, 4200.0, 0.3, -1.2]);
    }

    #[test]
    fn accepts_arbitrary_columns() {
        let table = parse_table(b"foo,bar\n1,2\n").unwrap();
        assert_eq!(table.columns(), ["foo", "bar"]);
    }

    #[test]
    fn header_only_file_is_an_empty_table() {
        let table = parse_table(b"close,volume\n").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn empty_file_has_no_header() {
        assert_eq!(parse_table(b""), Err(CsvError::MissingHeader));
        assert_eq!(parse_table(b"\n\n  \n"), Err(CsvError::MissingHeader));
    }

    #[test]
    fn handles_bom_crlf_quotes_and_blank_lines() {
        let bytes = "\u{feff}\"close\", \"volume\"\r\n\r\n1.5 , \"2\"\r\n".as_bytes();
        let table = parse_table(bytes).unwrap();
        assert_eq!(table.columns(), ["close", "volume"]);
        assert_eq!(table.rows(), &[vec![1.5, 2.0]]);
    }

    #[test]
    fn empty_cells_become_nan() {
        let table = parse_table(b"a,b\n1,\n").unwrap();
        assert_eq!(table.rows()[0][0], 1.0);
        assert!(table.rows()[0][1].is_nan());
    }

    #[test]
    fn ragged_rows_report_line_numbers() {
        let err = parse_table(b"a,b\n1,2\n\n3\n").unwrap_err();
        assert_eq!(
            err,
            CsvError::RaggedRow {
                line: 4,
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn non_numeric_cells_are_rejected() {
        let err = parse_table(b"close,ticker\n1,SPY\n").unwrap_err();
        assert_eq!(
            err,
            CsvError::NonNumeric {
                line: 2,
                column: "ticker".into(),
                value: "SPY".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "Line 2, column 'ticker': 'SPY' is not a number"
        );
    }

    #[test]
    fn quoted_commas_stay_inside_their_field() {
        let err = parse_table(b"\"close, adj\",volume\n\"1,5\",2\n").unwrap_err();
        assert_eq!(
            err,
            CsvError::NonNumeric {
                line: 2,
                column: "close, adj".into(),
                value: "1,5".into(),
            }
        );

        let table = parse_table(b"\"close, adj\",volume\n1,2\n").unwrap();
        assert_eq!(table.columns(), ["close, adj", "volume"]);
        assert_eq!(table.rows(), &[vec![1.0, 2.0]]);
    }

    #[test]
    fn doubled_quotes_and_line_breaks_inside_quotes() {
        let table = parse_table(b"\"say \"\"hi\"\"\",\"two\nlines\"\n1,2\n3,4\n").unwrap();
        assert_eq!(table.columns(), ["say \"hi\"", "two\nlines"]);
        assert_eq!(table.row_count(), 2);

        let err = parse_table(b"a,\"b\nc\n1,2\n\n7\n").unwrap_err();
        assert_eq!(err, CsvError::UnterminatedQuote { line: 1 });
    }

    #[test]
    fn line_numbers_follow_multiline_records() {
        let err = parse_table(b"\"a\nb\",c\n1,2\n3\n").unwrap_err();
        assert_eq!(
            err,
            CsvError::RaggedRow {
                line: 4,
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert_eq!(parse_table(&[0xff, 0xfe, 0x00]), Err(CsvError::NotUtf8));
    }
}
