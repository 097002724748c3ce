//! CSV snapshot reading for `lunch_and_learn`.
//!
//! Reads the `issues.csv` reseed snapshot. Fields may be wrapped in double
//! quotes; inside quotes, commas and newlines are literal and `""` is an
//! escaped quote.

use crate::error::{LalError, Result};
use crate::model::{Issue, Priority};

/// Header columns the snapshot must carry.
pub const SNAPSHOT_FIELDS: &[&str] = &["Code", "ShortDescription", "LongDescription", "Priority"];

/// One parsed record and the line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Split CSV text into records.
///
/// Blank lines are skipped. A leading UTF-8 BOM is ignored.
///
/// # Errors
///
/// Returns `Csv` for an unterminated quoted field or stray text after a
/// closing quote.
pub fn parse_records(input: &str) -> Result<Vec<Record>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut records = Vec::new();
    let mut chars = input.chars().peekable();

    let mut line = 1;
    let mut record_line = 1;
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut after_quote = false;
    let mut quote_line = 0;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    after_quote = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !after_quote => {
                in_quotes = true;
                quote_line = line;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                after_quote = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(&mut records, record_line, std::mem::take(&mut fields));
                after_quote = false;
                line += 1;
                record_line = line;
            }
            _ if after_quote => {
                return Err(LalError::Csv {
                    line,
                    reason: format!("unexpected '{c}' after closing quote"),
                });
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(LalError::Csv {
            line: quote_line,
            reason: "unterminated quoted field".to_string(),
        });
    }

    if !field.is_empty() || !fields.is_empty() || after_quote {
        fields.push(field);
        push_record(&mut records, record_line, fields);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Record>, line: usize, fields: Vec<String>) {
    let blank = fields.len() == 1 && fields[0].trim().is_empty();
    if !blank {
        records.push(Record { line, fields });
    }
}

/// Parse a snapshot into issues, mapping columns by header name.
///
/// # Errors
///
/// Returns `Csv` (with the offending line) if the header lacks a required
/// column, a row is short, or a priority is not recognised.
pub fn read_issues(input: &str) -> Result<Vec<Issue>> {
    let mut records = parse_records(input)?.into_iter();
    let Some(header) = records.next() else {
        return Ok(Vec::new());
    };

    let mut index = [0usize; 4];
    for (slot, wanted) in index.iter_mut().zip(SNAPSHOT_FIELDS) {
        *slot = header
            .fields
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LalError::Csv {
                line: header.line,
                reason: format!("missing column '{wanted}' in header"),
            })?;
    }
    let width = index.iter().max().copied().unwrap_or(0) + 1;

    records
        .map(|record| {
            if record.fields.len() < width {
                return Err(LalError::Csv {
                    line: record.line,
                    reason: format!(
                        "expected at least {width} fields, found {}",
                        record.fields.len()
                    ),
                });
            }
            let field = |i: usize| record.fields[index[i]].clone();
            let priority = field(3).parse::<Priority>().map_err(|_| LalError::Csv {
                line: record.line,
                reason: format!("invalid priority '{}'", field(3).trim()),
            })?;
            Ok(Issue::new(field(0), field(1), field(2), priority))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_records() {
        let records = parse_records("a,b,c\n1,2,3\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].fields, vec!["1", "2", "3"]);
        assert_eq!(records[1].line, 2);
    }

    #[test]
    fn test_parse_quoted_comma_quote_and_newline() {
        let input = "h1,h2\n\"Hello, \"\"CSV\"\"\",\"Line1\nLine2\"\nnext,row\n";
        let records = parse_records(input).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].fields, vec!["Hello, \"CSV\"", "Line1\nLine2"]);
        assert_eq!(records[2].line, 4);
    }

    #[test]
    fn test_parse_crlf_bom_and_missing_final_newline() {
        let records = parse_records("\u{feff}a,b\r\n1,2").unwrap();
        assert_eq!(records[0].fields, vec!["a", "b"]);
        assert_eq!(records[1].fields, vec!["1", "2"]);
    }

    #[test]
    fn test_parse_empty_trailing_field() {
        let records = parse_records("a,\n").unwrap();
        assert_eq!(records[0].fields, vec!["a", ""]);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let records = parse_records("a\n\n\nb\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line, 4);
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let err = parse_records("a\n\"open").unwrap_err();
        assert!(matches!(err, LalError::Csv { line: 2, .. }));
    }

    #[test]
    fn test_text_after_closing_quote_is_error() {
        assert!(parse_records("\"a\"b\n").is_err());
    }

    #[test]
    fn test_read_issues_by_header_name() {
        let input = "Priority,Code,LongDescription,ShortDescription\n\
                     High,ISSUE-1,\"Long, with comma\",Short\n\
                     0,ISSUE-2,l2,s2\n";
        let issues = read_issues(input).unwrap();
        assert_eq!(
            issues,
            vec![
                Issue::new("ISSUE-1", "Short", "Long, with comma", Priority::High),
                Issue::new("ISSUE-2", "s2", "l2", Priority::Low),
            ]
        );
    }

    #[test]
    fn test_read_issues_missing_column() {
        let err = read_issues("Code,ShortDescription,LongDescription\nA,s,l\n").unwrap_err();
        assert!(err.to_string().contains("missing column 'Priority'"));
    }

    #[test]
    fn test_read_issues_bad_priority_reports_line() {
        let err = read_issues("Code,ShortDescription,LongDescription,Priority\nA,s,l,urgent\n")
            .unwrap_err();
        assert!(matches!(err, LalError::Csv { line: 2, .. }));
    }

    #[test]
    fn test_read_issues_short_row() {
        let err = read_issues("Code,ShortDescription,LongDescription,Priority\nA,s\n").unwrap_err();
        assert!(matches!(err, LalError::Csv { line: 2, .. }));
    }

    #[test]
    fn test_read_issues_empty_input() {
        assert!(read_issues("").unwrap().is_empty());
    }
}
