//! Ledger loading: validates and materializes tabular input rows.
//!
//! The loader is strict fail-fast: every row-level problem across the whole
//! input is collected first, then reported together, and the run aborts
//! before any remote call is made. There are no partial ledgers.

use std::fmt;
use std::io::BufRead;

use chrono::NaiveDate;
use thiserror::Error;

use crate::duration::{ParseDurationError, parse_duration};
use crate::types::{IssueKey, LedgerRow};

const COLUMN_DATE: &str = "date";
const COLUMN_TIME: &str = "time";
const COLUMN_ISSUE_KEY: &str = "issuekey";
const COLUMN_DESCRIPTION: &str = "description";

/// Errors produced while loading a ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The input had no header row at all.
    #[error("ledger is empty: expected a header row")]
    Empty,

    /// The header row lacked one or more mandatory columns.
    #[error("ledger header is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),

    /// One or more rows failed validation.
    #[error("{}", render_row_errors(.0))]
    Rows(Vec<RowError>),

    /// Reading the underlying input failed.
    #[error("failed to read ledger line {line}: {message}")]
    Io { line: usize, message: String },
}

/// A single invalid row, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub kind: RowErrorKind,
}

/// What went wrong with a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowErrorKind {
    BadDate { value: String },
    BadTime { value: String, source: ParseDurationError },
    MissingKey,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RowErrorKind::BadDate { value } => {
                write!(f, "line {}: unparseable date {value:?}", self.line)
            }
            RowErrorKind::BadTime { value, source } => {
                write!(f, "line {}: unparseable time {value:?}: {source}", self.line)
            }
            RowErrorKind::MissingKey => write!(f, "line {}: missing issue key", self.line),
        }
    }
}

fn render_row_errors(errors: &[RowError]) -> String {
    let mut out = format!("{} invalid ledger row(s):", errors.len());
    for error in errors {
        out.push_str("\n  ");
        out.push_str(&error.to_string());
    }
    out
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    time: usize,
    issue_key: usize,
    description: Option<usize>,
}

impl Columns {
    fn from_header(fields: &[String]) -> Result<Self, LedgerError> {
        let position = |name: &str| {
            fields
                .iter()
                .position(|field| field.trim().eq_ignore_ascii_case(name))
        };

        let date = position(COLUMN_DATE);
        let time = position(COLUMN_TIME);
        let issue_key = position(COLUMN_ISSUE_KEY);

        let mut missing = Vec::new();
        if date.is_none() {
            missing.push("Date");
        }
        if time.is_none() {
            missing.push("Time");
        }
        if issue_key.is_none() {
            missing.push("IssueKey");
        }
        let (Some(date), Some(time), Some(issue_key)) = (date, time, issue_key) else {
            return Err(LedgerError::MissingColumns(missing));
        };

        Ok(Self {
            date,
            time,
            issue_key,
            description: position(COLUMN_DESCRIPTION),
        })
    }
}

/// Loads and validates the ledger from a tabular record stream.
///
/// Returns the rows in file order, or every accumulated error at once.
pub fn load_ledger<R: BufRead>(reader: R) -> Result<Vec<LedgerRow>, LedgerError> {
    let mut lines = reader.lines().enumerate();

    let columns = loop {
        let Some((idx, line)) = lines.next() else {
            return Err(LedgerError::Empty);
        };
        let line = line.map_err(|err| LedgerError::Io {
            line: idx + 1,
            message: err.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        break Columns::from_header(&split_record(&line))?;
    };

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (idx, line) in lines {
        let line_number = idx + 1;
        let line = line.map_err(|err| LedgerError::Io {
            line: line_number,
            message: err.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_record(&line);
        match parse_row(&fields, columns, line_number) {
            Ok(row) => rows.push(row),
            Err(row_errors) => errors.extend(row_errors),
        }
    }

    if errors.is_empty() {
        Ok(rows)
    } else {
        Err(LedgerError::Rows(errors))
    }
}

fn parse_row(fields: &[String], columns: Columns, line: usize) -> Result<LedgerRow, Vec<RowError>> {
    let field = |idx: usize| fields.get(idx).map(String::as_str).unwrap_or_default();
    let mut errors = Vec::new();

    let date_text = field(columns.date).trim();
    let date = match date_text.parse::<NaiveDate>() {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(RowError {
                line,
                kind: RowErrorKind::BadDate {
                    value: date_text.to_string(),
                },
            });
            None
        }
    };

    let time_text = field(columns.time);
    let duration = match parse_duration(time_text) {
        Ok(duration) => Some(duration),
        Err(source) => {
            errors.push(RowError {
                line,
                kind: RowErrorKind::BadTime {
                    value: time_text.trim().to_string(),
                    source,
                },
            });
            None
        }
    };

    let issue_key = match IssueKey::new(field(columns.issue_key).trim()) {
        Ok(key) => Some(key),
        Err(_) => {
            errors.push(RowError {
                line,
                kind: RowErrorKind::MissingKey,
            });
            None
        }
    };

    let description = columns.description.map(field).and_then(|text| {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    });

    match (date, duration, issue_key) {
        (Some(date), Some(duration), Some(issue_key)) if errors.is_empty() => Ok(LedgerRow {
            date,
            duration,
            issue_key,
            description,
        }),
        _ => Err(errors),
    }
}

/// Splits one comma-separated record, honoring double-quoted fields with
/// doubled-quote escapes. Multi-line quoted fields are not supported.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}
