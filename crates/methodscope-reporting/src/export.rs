use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use methodscope_core::{EvaluationRecord, RunSummary};
use serde::Serialize;

use crate::{ExportFormat, ReportError};

/// Render records as a pretty-printed JSON array.
///
/// Field order follows [`EvaluationRecord`]'s declaration, so the output is
/// stable across runs.
pub fn export_json(records: &[EvaluationRecord]) -> Result<String, ReportError> {
    let mut out = serde_json::to_string_pretty(records)?;
    out.push('\n');
    Ok(out)
}

fn csv_escape(s: &str) -> String {
    if s.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render records as CSV with one row per (document, criterion).
pub fn export_csv(records: &[EvaluationRecord]) -> String {
    let mut out = String::from("Filename,Question,Initial Response,Detailed Response\n");
    for r in records {
        out.push_str(&format!(
            "{},{},{},{}\n",
            csv_escape(&r.filename),
            csv_escape(&r.question),
            csv_escape(&r.initial_response),
            csv_escape(&r.detailed_response),
        ));
    }
    out
}

fn write_file(path: &Path, content: &str) -> Result<(), ReportError> {
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::create(path).map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    Ok(())
}

/// Write all records to `path`, replacing any existing file.
pub fn write_records(
    records: &[EvaluationRecord],
    format: ExportFormat,
    path: &Path,
) -> Result<(), ReportError> {
    let content = match format {
        ExportFormat::Json => export_json(records)?,
        ExportFormat::Csv => export_csv(records),
    };
    write_file(path, &content)?;
    tracing::info!(path = %path.display(), records = records.len(), format = format.label(), "results written");
    Ok(())
}

/// Sidecar location for the run summary: `results.json` → `results.summary.json`.
pub fn summary_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "results".to_string());
    output.with_file_name(format!("{stem}.summary.json"))
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

/// Write the run summary as pretty JSON, stamped with the current time.
pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), ReportError> {
    let doc = SummaryDocument {
        generated_at: Utc::now(),
        summary,
    };
    let mut content = serde_json::to_string_pretty(&doc)?;
    content.push('\n');
    write_file(path, &content)?;
    tracing::info!(path = %path.display(), "run summary written");
    Ok(())
}
