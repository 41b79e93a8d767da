//! CSV ingestion: every row is a list of numeric features followed by a class label.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::common_types::{Dataset, Record};
use crate::error::{KnnError, Result};

/// What to do with a row that cannot be turned into a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRowPolicy {
    /// Stop and return the row's error.
    #[default]
    Abort,
    /// Drop the row with a warning and keep reading.
    Skip,
}

impl FromStr for MalformedRowPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(MalformedRowPolicy::Abort),
            "skip" => Ok(MalformedRowPolicy::Skip),
            other => Err(format!("unknown malformed-row policy {:?} (expected abort or skip)", other)),
        }
    }
}

impl fmt::Display for MalformedRowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRowPolicy::Abort => f.write_str("abort"),
            MalformedRowPolicy::Skip => f.write_str("skip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvOptions {
    /// Treat the first row as a header instead of data.
    pub has_headers: bool,
    pub delimiter: char,
    pub on_malformed: MalformedRowPolicy,
    /// Feature count every row must have. When unset, `Abort` takes it from the
    /// first row and `Skip` from the most common width in the file.
    pub expected_features: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            has_headers: false,
            delimiter: ',',
            on_malformed: MalformedRowPolicy::Abort,
            expected_features: None,
        }
    }
}

impl CsvOptions {
    fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(|b| b.is_ascii())
            .ok_or_else(|| {
                KnnError::InvalidInput(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ))
            })
    }

    pub fn validate(&self) -> Result<()> {
        if self.expected_features == Some(0) {
            return Err(KnnError::InvalidInput(
                "expected_features must be at least 1".to_string(),
            ));
        }
        self.delimiter_byte().map(|_| ())
    }
}

/// Opens `path` and reads it with [`read_dataset`].
pub fn load_dataset(path: &Path, options: &CsvOptions) -> Result<Dataset<f64>> {
    let file = File::open(path)?;
    tracing::debug!(path = %path.display(), "loading dataset");
    read_dataset(file, options)
}

/// Reads a labeled dataset from CSV.
///
/// Features are parsed as `f64`; unparsable or non-finite values are reported as
/// `FeatureParse` rather than read as zero. Rows with no feature, an empty label,
/// or the wrong feature count are `InvalidInput`.
///
/// Under [`MalformedRowPolicy::Abort`] the first offending row is returned as an
/// error. Under [`MalformedRowPolicy::Skip`] offending rows are dropped with a
/// warning; without `expected_features` the width kept is the most common one
/// in the file, so a bad leading row cannot evict the good rows after it.
pub fn read_dataset<R: Read>(reader: R, options: &CsvOptions) -> Result<Dataset<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_headers)
        .delimiter(options.delimiter_byte()?)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let skip = options.on_malformed == MalformedRowPolicy::Skip;
    let mut rows: Vec<(u64, Record<f64>)> = Vec::new();
    let mut expected = options.expected_features;
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());

        match parse_row(&row, line) {
            Ok(record) if skip => rows.push((line, record)),
            Ok(record) => {
                let width = *expected.get_or_insert(record.dimensions());
                check_width(&record, line, width)?;
                rows.push((line, record));
            }
            Err(err) if skip => {
                tracing::warn!(line, error = %err, "skipping malformed row");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    if skip {
        if let Some(width) = expected.or_else(|| most_common_width(&rows)) {
            rows.retain(|(line, record)| match check_width(record, *line, width) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(line = *line, error = %err, "skipping malformed row");
                    skipped += 1;
                    false
                }
            });
        }
    }

    tracing::info!(records = rows.len(), skipped, "dataset loaded");
    Dataset::new(rows.into_iter().map(|(_, record)| record).collect())
}

fn check_width(record: &Record<f64>, line: u64, expected: usize) -> Result<()> {
    if record.dimensions() != expected {
        return Err(KnnError::InvalidInput(format!(
            "line {} has {} features, expected {}",
            line,
            record.dimensions(),
            expected
        )));
    }
    Ok(())
}

/// Most frequent feature count; ties go to the width seen first.
fn most_common_width(rows: &[(u64, Record<f64>)]) -> Option<usize> {
    let mut widths: HashMap<usize, (usize, usize)> = HashMap::new();
    for (position, (_, record)) in rows.iter().enumerate() {
        let entry = widths.entry(record.dimensions()).or_insert((0, position));
        entry.0 += 1;
    }
    widths
        .into_iter()
        .max_by_key(|&(_, (count, first))| (count, Reverse(first)))
        .map(|(width, _)| width)
}

fn parse_row(row: &csv::StringRecord, line: u64) -> Result<Record<f64>> {
    if row.len() < 2 {
        return Err(KnnError::InvalidInput(format!(
            "line {} needs at least one feature and a label, found {} field(s)",
            line,
            row.len()
        )));
    }
    let label_column = row.len() - 1;
    let label = &row[label_column];
    if label.is_empty() {
        return Err(KnnError::InvalidInput(format!("line {} has an empty label", line)));
    }

    let features = row
        .iter()
        .take(label_column)
        .enumerate()
        .map(|(column, value)| parse_feature(value, line, column))
        .collect::<Result<Vec<f64>>>()?;

    Ok(Record::new(features, label))
}

fn parse_feature(value: &str, line: u64, column: usize) -> Result<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| KnnError::FeatureParse {
            line,
            column,
            value: value.to_string(),
        })
}
