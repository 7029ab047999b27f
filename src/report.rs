//! The top-level produced artifact (§10.4): per-file metrics, global
//! metrics, and a diagnostics summary, serializable to JSON or a flat CSV
//! table.

use crate::diagnostics::DiagnosticSummary;
use crate::errors::CoreError;
use crate::model::{GlobalMetrics, PerFileMetrics};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;

/// The bundled pipeline output (§3 Report).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub files:       BTreeMap<String, PerFileMetrics>,
    pub global:      GlobalMetrics,
    pub diagnostics: DiagnosticSummary,
}

/// The report file formats the CLI knows how to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unrecognized report format `{other}` (expected `json` or `csv`)")),
        }
    }
}

/// One flattened CSV row: a file's name alongside all of its metrics
/// fields, via `#[serde(flatten)]` so `PerFileMetrics`'s field set drives
/// the column list without restating it here.
#[derive(Serialize)]
struct CsvRow<'a> {
    filename: &'a str,
    #[serde(flatten)]
    metrics:  &'a PerFileMetrics,
}

/// Writes `report` to `path` in the requested format.
///
/// # Errors
///
/// Returns `CoreError::Io` on file creation failure, `CoreError::Json`/`Csv`
/// on serialization failure.
pub fn write_report(report: &Report, path: impl AsRef<Path>, format: ReportFormat) -> Result<(), CoreError> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    match format {
        ReportFormat::Json => serde_json::to_writer_pretty(writer, report)?,
        ReportFormat::Csv => write_csv(report, writer)?,
    }

    Ok(())
}

fn write_csv<W: std::io::Write>(report: &Report, writer: W) -> Result<(), CoreError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for (filename, metrics) in &report.files {
        csv_writer.serialize(CsvRow { filename, metrics })?;
    }
    csv_writer.flush()?;
    Ok(())
}
