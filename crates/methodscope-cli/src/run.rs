//! One evaluation run: pipeline, records file, summary sidecar.

use std::path::Path;

use methodscope_core::{ProgressEvent, RunContext, RunSummary, run_evaluation};
use methodscope_reporting::{ExportFormat, summary_path_for, write_records, write_summary};
use tokio_util::sync::CancellationToken;

/// Evaluate `folder` and write the records to `output`.
///
/// Failing to write the records file fails the run. The summary sidecar is
/// written next to it; a failure there is only a warning.
pub async fn evaluate_and_write(
    ctx: &RunContext,
    folder: &Path,
    output: &Path,
    format: ExportFormat,
    progress: impl Fn(ProgressEvent) + Send + Sync,
    cancel: CancellationToken,
) -> anyhow::Result<RunSummary> {
    let outcome = run_evaluation(ctx, folder, progress, cancel).await?;

    write_records(&outcome.records, format, output)?;

    let summary_path = summary_path_for(output);
    if let Err(e) = write_summary(&outcome.summary, &summary_path) {
        tracing::warn!(path = %summary_path.display(), error = %e, "run summary not written");
        eprintln!("WARNING: run summary not written: {}", e);
    }

    Ok(outcome.summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use methodscope_core::model::mock::{MockModel, MockResponse};
    use methodscope_core::{BackendError, PdfBackend};
    use serde_json::Value;

    /// Treats each file's UTF-8 content as a single page.
    struct PlainTextBackend;

    impl PdfBackend for PlainTextBackend {
        fn extract_pages(&self, path: &Path) -> Result<Vec<String>, BackendError> {
            Ok(vec![std::fs::read_to_string(path)?])
        }
    }

    fn papers() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("B.pdf"), "Second   article.").unwrap();
        std::fs::write(dir.path().join("A.pdf"), "First\narticle.").unwrap();
        dir
    }

    fn context() -> RunContext {
        let model = Arc::new(MockModel::new(MockResponse::answer("2 - Clear")));
        RunContext::new(model, Arc::new(PlainTextBackend))
    }

    #[tokio::test]
    async fn writes_records_file_and_summary() {
        let input = papers();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("results.json");

        let summary = evaluate_and_write(
            &context(),
            input.path(),
            &output,
            ExportFormat::Json,
            |_| {},
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(summary.records, 14);

        let records: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(records.len(), 14);
        assert_eq!(records[0]["Filename"], "A.pdf");
        assert_eq!(records[0]["Question"], "central_research_question");
        assert_eq!(records[7]["Filename"], "B.pdf");
        assert!(
            records
                .iter()
                .all(|r| r["Initial Response"].as_str().unwrap().contains("2 - Clear"))
        );

        let sidecar: Value = serde_json::from_str(
            &std::fs::read_to_string(out_dir.path().join("results.summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(sidecar["records"], 14);
        assert_eq!(sidecar["documents_evaluated"], 2);
        assert_eq!(sidecar["scores"][0]["counts"]["clear"], 2);
    }

    #[tokio::test]
    async fn csv_format_writes_csv() {
        let input = papers();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("results.csv");

        evaluate_and_write(
            &context(),
            input.path(),
            &output,
            ExportFormat::Csv,
            |_| {},
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("Filename,Question,Initial Response,Detailed Response\n"));
        assert!(content.contains("A.pdf,central_research_question,"));
        assert!(out_dir.path().join("results.summary.json").exists());
    }

    #[tokio::test]
    async fn unwritable_output_fails_the_run() {
        let input = papers();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("missing").join("results.json");

        let err = evaluate_and_write(
            &context(),
            input.path(),
            &output,
            ExportFormat::Json,
            |_| {},
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("results.json"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn missing_input_folder_fails_before_writing() {
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("results.json");

        let result = evaluate_and_write(
            &context(),
            &out_dir.path().join("no-such-folder"),
            &output,
            ExportFormat::Json,
            |_| {},
            CancellationToken::new(),
        )
        .await;

        assert!(result.is_err());
        assert!(!output.exists());
    }
}
