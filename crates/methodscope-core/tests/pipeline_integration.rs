//! Integration tests for [`run_evaluation`].
//!
//! Documents are plain-text files with a `.pdf` extension read by a fake
//! backend, and the model is a [`MockModel`], so no PDF library or network
//! is involved.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use methodscope_core::criteria;
use methodscope_core::model::mock::{MockModel, MockResponse};
use methodscope_core::{
    BackendError, MODEL_ERROR_MARKER, PdfBackend, ProgressEvent, RunContext, run_evaluation,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::MakeWriter;

/// Reads the file as UTF-8, one page per form feed. Files whose content
/// starts with `CORRUPT` fail like an unparseable PDF.
struct TextFileBackend;

impl PdfBackend for TextFileBackend {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, BackendError> {
        let content = std::fs::read_to_string(path)?;
        if content.starts_with("CORRUPT") {
            return Err(BackendError::OpenError("format error: no objects found".into()));
        }
        Ok(content.split('\u{c}').map(str::to_string).collect())
    }
}

fn folder_with(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn context(model: Arc<MockModel>) -> RunContext {
    RunContext::new(model, Arc::new(TextFileBackend))
}

#[derive(Clone, Default)]
struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn two_documents_give_fourteen_ordered_records() {
    let dir = folder_with(&[
        ("B.pdf", "Second article.\u{c}Page two."),
        ("A.pdf", "First article."),
        ("notes.txt", "ignored"),
    ]);
    let model = Arc::new(MockModel::new(MockResponse::answer("1 - Unclear")));

    let outcome = run_evaluation(&context(model.clone()), dir.path(), |_| {}, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 14);
    let names = criteria::names();
    for (i, record) in outcome.records.iter().enumerate() {
        let expected_file = if i < 7 { "A.pdf" } else { "B.pdf" };
        assert_eq!(record.filename, expected_file);
        assert_eq!(record.question, names[i % 7]);
    }
    assert_eq!(model.call_count(), 28);
    assert_eq!(outcome.summary.documents_found, 2);
    assert_eq!(outcome.summary.documents_evaluated, 2);
    assert_eq!(outcome.summary.documents_incomplete, 0);
    assert_eq!(outcome.summary.records, 14);
    assert!(!outcome.summary.cancelled);
    assert!(outcome.summary.scores.iter().all(|s| s.counts.unclear == 2));
}

#[tokio::test]
async fn document_text_is_normalized_before_prompting() {
    let dir = folder_with(&[("A.pdf", "  Sampling\n\nwas   random.\u{c}\tEnd.  ")]);
    let model = Arc::new(MockModel::new(MockResponse::answer("2 - Clear")));

    run_evaluation(&context(model.clone()), dir.path(), |_| {}, CancellationToken::new())
        .await
        .unwrap();

    let first = &model.prompts()[0];
    assert!(first.contains("Article text:\nSampling was random. End.\n"));
}

#[tokio::test]
async fn unreachable_model_still_completes() {
    let dir = folder_with(&[("A.pdf", "one"), ("B.pdf", "two")]);
    let model = Arc::new(MockModel::new(MockResponse::unreachable()));

    let outcome = run_evaluation(&context(model), dir.path(), |_| {}, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 14);
    for record in &outcome.records {
        assert_eq!(record.initial_response, MODEL_ERROR_MARKER);
        assert_eq!(record.detailed_response, MODEL_ERROR_MARKER);
    }
    assert!(outcome.summary.scores.iter().all(|s| s.counts.model_errors == 2));
}

#[tokio::test]
async fn failed_extraction_skips_document_and_logs_filename() {
    let writer = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let dir = folder_with(&[("A.pdf", "CORRUPT bytes"), ("B.pdf", "A readable article.")]);
    let model = Arc::new(MockModel::new(MockResponse::answer("0 - Missing")));

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let outcome = run_evaluation(
        &context(model),
        dir.path(),
        move |e| sink.lock().unwrap().push(e),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.records.len(), 7);
    assert!(outcome.records.iter().all(|r| r.filename == "B.pdf"));
    assert_eq!(outcome.summary.documents_skipped.len(), 1);
    assert_eq!(outcome.summary.documents_skipped[0].filename, "A.pdf");

    let log = String::from_utf8(writer.buf.lock().unwrap().clone()).unwrap();
    let line = log
        .lines()
        .find(|l| l.contains("skipping document"))
        .expect("extraction failure should be logged");
    assert!(line.contains("ERROR"));
    assert!(line.contains("A.pdf"));

    let events = events.lock().unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        ProgressEvent::DocumentSkipped { filename, .. } if filename == "A.pdf"
    )));
}

#[tokio::test]
async fn empty_folder_gives_no_records() {
    let dir = folder_with(&[("readme.md", "no pdfs here")]);
    let model = Arc::new(MockModel::new(MockResponse::answer("2 - Clear")));

    let outcome = run_evaluation(&context(model.clone()), dir.path(), |_| {}, CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.summary.documents_found, 0);
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn criteria_subset_is_respected() {
    let dir = folder_with(&[("A.pdf", "text")]);
    let model = Arc::new(MockModel::new(MockResponse::answer("2 - Clear")));
    let mut ctx = context(model);
    ctx.criteria = criteria::select(&["limitations", "sampling"]).unwrap();

    let outcome = run_evaluation(&ctx, dir.path(), |_| {}, CancellationToken::new())
        .await
        .unwrap();

    let questions: Vec<_> = outcome.records.iter().map(|r| r.question.as_str()).collect();
    assert_eq!(questions, vec!["sampling", "limitations"]);
    assert_eq!(outcome.summary.criteria, vec!["sampling", "limitations"]);
}

#[tokio::test]
async fn concurrent_documents_keep_deterministic_order() {
    let dir = folder_with(&[("A.pdf", "a"), ("B.pdf", "b"), ("C.pdf", "c")]);
    let model = Arc::new(
        MockModel::new(MockResponse::answer("1 - Unclear")).with_delay(Duration::from_millis(5)),
    );
    let mut ctx = context(model);
    ctx.max_concurrent_documents = 3;

    let outcome = run_evaluation(&ctx, dir.path(), |_| {}, CancellationToken::new())
        .await
        .unwrap();

    let files: Vec<_> = outcome.records.iter().map(|r| r.filename.as_str()).collect();
    let mut expected = vec!["A.pdf"; 7];
    expected.extend(vec!["B.pdf"; 7]);
    expected.extend(vec!["C.pdf"; 7]);
    assert_eq!(files, expected);
}

#[tokio::test]
async fn cancellation_stops_new_work() {
    let dir = folder_with(&[("A.pdf", "a"), ("B.pdf", "b")]);
    let model = Arc::new(MockModel::new(MockResponse::answer("2 - Clear")));
    let cancel = CancellationToken::new();

    // Cancel as soon as the first criterion of the first document finishes.
    let trigger = cancel.clone();
    let outcome = run_evaluation(
        &context(model),
        dir.path(),
        move |e| {
            if matches!(e, ProgressEvent::CriterionFinished { .. }) {
                trigger.cancel();
            }
        },
        cancel,
    )
    .await
    .unwrap();

    assert!(outcome.summary.cancelled);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].filename, "A.pdf");
    assert_eq!(outcome.summary.documents_evaluated, 1);
    assert_eq!(outcome.summary.documents_incomplete, 1);
}

#[tokio::test]
async fn missing_folder_is_an_error() {
    let model = Arc::new(MockModel::new(MockResponse::answer("2 - Clear")));
    let result = run_evaluation(
        &context(model),
        Path::new("/no/such/folder"),
        |_| {},
        CancellationToken::new(),
    )
    .await;
    assert!(result.is_err());
}
