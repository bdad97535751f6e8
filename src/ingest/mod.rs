//! Ingestion - comma-separated text to typed records
//!
//! The first line is the header. Columns are located by name (trimmed,
//! uppercased), so column order is free and extra columns are ignored.
//! Quotes carry no meaning: every comma separates fields. Every data line
//! either becomes a `RawRecord` or a `RowIssue`.

pub mod timestamp;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use timestamp::{format_local, parse_timestamp_millis};

/// Required header columns, in display order
pub const REQUIRED_COLUMNS: [&str; 4] = ["ID", "LATITUDE", "LONGITUDE", "TIMESTAMP"];

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Header is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
    #[error("{} malformed row(s){}", .0.len(), first_issue(.0))]
    MalformedRows(Vec<RowIssue>),
    #[error("Unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn first_issue(issues: &[RowIssue]) -> String {
    issues
        .first()
        .map(|issue| format!(", first at line {}: {}", issue.line, issue.kind))
        .unwrap_or_default()
}

/// What to do with lines that fail to parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRows {
    /// Drop them and keep the well-formed rows
    #[default]
    Skip,
    /// Fail the whole load
    Reject,
}

/// One accepted data line
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_millis: i64,
}

/// Column positions resolved from the header line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub id: usize,
    pub latitude: usize,
    pub longitude: usize,
    pub timestamp: usize,
}

impl Schema {
    /// Resolve column positions; every required column must be present
    pub fn from_header(header: &csv::StringRecord) -> Result<Self, IngestError> {
        let headers: Vec<String> = header.iter().map(|h| h.trim().to_uppercase()).collect();

        let mut positions = [None; 4];
        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers.iter().position(|h| h == name);
        }

        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .zip(positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| *name)
            .collect();

        match positions {
            [Some(id), Some(latitude), Some(longitude), Some(timestamp)] => Ok(Schema {
                id,
                latitude,
                longitude,
                timestamp,
            }),
            _ => Err(IngestError::MissingColumns(missing)),
        }
    }
}

/// Why a data line was rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    MissingField { column: &'static str },
    EmptyId,
    InvalidNumber { column: &'static str, value: String },
    InvalidTimestamp { value: String },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::MissingField { column } => write!(f, "missing {} field", column),
            IssueKind::EmptyId => write!(f, "empty ID"),
            IssueKind::InvalidNumber { column, value } => {
                write!(f, "{} '{}' is not a finite number", column, value)
            }
            IssueKind::InvalidTimestamp { value } => {
                write!(f, "TIMESTAMP '{}' is not a recognized date", value)
            }
        }
    }
}

/// A rejected data line (1-based line number in the input text)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowIssue {
    pub line: usize,
    #[serde(flatten)]
    pub kind: IssueKind,
}

/// Records in input order plus the lines that were rejected
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub records: Vec<RawRecord>,
    pub issues: Vec<RowIssue>,
}

/// Parse the full text of a delimited file
pub fn parse_records(text: &str, policy: MalformedRows) -> Result<Parsed, IngestError> {
    // Excel "CSV UTF-8" exports start with a byte-order mark
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let schema = Schema::from_header(reader.headers()?)?;
    tracing::debug!(?schema, "Header resolved");

    let mut lines = LineCounter::new(text);
    let mut parsed = Parsed::default();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record)? {
        // Whitespace-only line
        if record.len() <= 1 && record.get(0).map_or(true, str::is_empty) {
            continue;
        }
        match parse_row(&record, &schema) {
            Ok(row) => parsed.records.push(row),
            Err(kind) => {
                let line = record
                    .position()
                    .map_or(0, |pos| lines.line_at(pos.byte()));
                tracing::debug!(line, %kind, "Rejected row");
                parsed.issues.push(RowIssue { line, kind });
            }
        }
    }

    if policy == MalformedRows::Reject && !parsed.issues.is_empty() {
        return Err(IngestError::MalformedRows(parsed.issues));
    }

    if !parsed.issues.is_empty() {
        tracing::warn!(
            "Skipped {} malformed row(s), kept {}",
            parsed.issues.len(),
            parsed.records.len()
        );
    }

    Ok(parsed)
}

/// Maps reader byte offsets to 1-based line numbers.
///
/// A record's offset is where the reader resumed, which can sit before
/// blank lines it skipped, so line breaks directly at the offset belong to
/// the gap and are counted before the record. Offsets must not decrease.
struct LineCounter<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, offset: u64) -> usize {
        let end = self.bytes.len();
        let mut target = usize::try_from(offset).map_or(end, |o| o.min(end));
        while matches!(self.bytes.get(target), Some(b'\r' | b'\n')) {
            target += 1;
        }
        while self.pos < target {
            match self.bytes[self.pos] {
                b'\n' => self.line += 1,
                b'\r' if self.bytes.get(self.pos + 1) != Some(&b'\n') => self.line += 1,
                _ => {}
            }
            self.pos += 1;
        }
        self.line
    }
}

fn parse_row(record: &csv::StringRecord, schema: &Schema) -> Result<RawRecord, IssueKind> {
    let field = |idx: usize, column: &'static str| {
        record.get(idx).ok_or(IssueKind::MissingField { column })
    };

    let id = field(schema.id, "ID")?;
    if id.is_empty() {
        return Err(IssueKind::EmptyId);
    }
    let latitude = parse_number(field(schema.latitude, "LATITUDE")?, "LATITUDE")?;
    let longitude = parse_number(field(schema.longitude, "LONGITUDE")?, "LONGITUDE")?;
    let raw_ts = field(schema.timestamp, "TIMESTAMP")?;
    let timestamp_millis =
        parse_timestamp_millis(raw_ts).ok_or_else(|| IssueKind::InvalidTimestamp {
            value: raw_ts.to_string(),
        })?;

    Ok(RawRecord {
        id: id.to_string(),
        latitude,
        longitude,
        timestamp_millis,
    })
}

fn parse_number(value: &str, column: &'static str) -> Result<f64, IssueKind> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| IssueKind::InvalidNumber {
            column,
            value: value.to_string(),
        })
}
