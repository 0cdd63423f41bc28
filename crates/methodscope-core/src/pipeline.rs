//! Batch evaluation of a folder of PDFs.
//!
//! Documents are processed in file-name order and criteria in catalog order.
//! Per-document and per-criterion failures become data (a skipped document,
//! or a marker string in a record); only an unreadable input folder stops
//! the run.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use futures_util::stream;
use tokio_util::sync::CancellationToken;

use crate::criteria::Criterion;
use crate::model::{MODEL_ERROR_MARKER, ModelClient};
use crate::text::extract_document_text;
use crate::{
    BackendError, CriterionOutcome, CriterionScores, DETAILED_SKIPPED_PREFIX, EvaluationRecord,
    PipelineError, ProgressEvent, RunContext, RunSummary, ScoreCounts, SkippedDocument, prompt,
    response,
};

/// Records plus run-level metadata.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub records: Vec<EvaluationRecord>,
    pub summary: RunSummary,
}

enum DocumentOutcome {
    Evaluated {
        complete: bool,
        records: Vec<EvaluationRecord>,
        outcomes: Vec<(&'static str, CriterionOutcome)>,
    },
    Skipped(SkippedDocument),
    NotStarted,
}

/// List the PDFs directly inside `folder`, sorted by file name.
///
/// Directories and files with other extensions are ignored. The extension
/// match is case-insensitive.
pub fn discover_documents(folder: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !folder.is_dir() {
        return Err(PipelineError::FolderNotFound(folder.to_path_buf()));
    }
    let read_err = |source| PipelineError::ReadFolder {
        path: folder.to_path_buf(),
        source,
    };

    let mut docs = Vec::new();
    for entry in std::fs::read_dir(folder).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            docs.push(path);
        }
    }
    docs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(docs)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Evaluate every PDF in `folder` against the context's criteria.
pub async fn run_evaluation(
    ctx: &RunContext,
    folder: &Path,
    progress: impl Fn(ProgressEvent) + Send + Sync,
    cancel: CancellationToken,
) -> Result<RunOutcome, PipelineError> {
    let docs = discover_documents(folder)?;
    let total = docs.len();
    tracing::info!(
        folder = %folder.display(),
        documents = total,
        criteria = ctx.criteria.len(),
        model = ctx.model.model_name(),
        "starting evaluation run"
    );

    let progress = &progress;
    let cancel = &cancel;
    let outcomes: Vec<DocumentOutcome> = stream::iter(docs.iter().enumerate())
        .map(|(index, path)| evaluate_document(ctx, path, index, total, progress, cancel))
        .buffered(ctx.max_concurrent_documents.max(1))
        .collect()
        .await;

    let mut summary = RunSummary {
        input_folder: folder.to_path_buf(),
        model: ctx.model.model_name().to_string(),
        criteria: ctx.criteria.iter().map(|c| c.name.to_string()).collect(),
        documents_found: total,
        cancelled: cancel.is_cancelled(),
        scores: ctx
            .criteria
            .iter()
            .map(|c| CriterionScores {
                criterion: c.name.to_string(),
                counts: ScoreCounts::default(),
            })
            .collect(),
        ..RunSummary::default()
    };

    let mut records = Vec::with_capacity(total * ctx.criteria.len());
    for outcome in outcomes {
        match outcome {
            DocumentOutcome::Evaluated {
                complete,
                records: doc_records,
                outcomes,
            } => {
                summary.documents_evaluated += 1;
                if !complete {
                    summary.documents_incomplete += 1;
                }
                records.extend(doc_records);
                for (name, outcome) in outcomes {
                    if let Some(scores) = summary.scores.iter_mut().find(|s| s.criterion == name) {
                        tally(&mut scores.counts, &outcome);
                    }
                }
            }
            DocumentOutcome::Skipped(skipped) => summary.documents_skipped.push(skipped),
            DocumentOutcome::NotStarted => {}
        }
    }
    summary.records = records.len();

    tracing::info!(
        documents = summary.documents_evaluated,
        incomplete = summary.documents_incomplete,
        skipped = summary.documents_skipped.len(),
        records = summary.records,
        cancelled = summary.cancelled,
        "evaluation run complete"
    );
    Ok(RunOutcome { records, summary })
}

fn tally(counts: &mut ScoreCounts, outcome: &CriterionOutcome) {
    let evaluation = match outcome {
        CriterionOutcome::Done { evaluation }
        | CriterionOutcome::DetailedCallFailed { evaluation, .. } => evaluation,
        CriterionOutcome::InitialCallFailed { .. } => {
            counts.model_errors += 1;
            return;
        }
        CriterionOutcome::DetailedSkipped { .. } => {
            counts.unparsed += 1;
            return;
        }
    };
    match response::label_ordinal(evaluation) {
        Some(0) => counts.missing += 1,
        Some(1) => counts.unclear += 1,
        Some(2) => counts.clear += 1,
        _ => counts.unparsed += 1,
    }
}

async fn evaluate_document(
    ctx: &RunContext,
    path: &Path,
    index: usize,
    total: usize,
    progress: &(impl Fn(ProgressEvent) + Send + Sync),
    cancel: &CancellationToken,
) -> DocumentOutcome {
    if cancel.is_cancelled() {
        return DocumentOutcome::NotStarted;
    }
    let filename = display_name(path);
    progress(ProgressEvent::DocumentStarted {
        index,
        total,
        filename: filename.clone(),
    });

    let text = match extract_blocking(ctx, path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(file = %filename, stage = "extraction", error = %e, "skipping document");
            progress(ProgressEvent::DocumentSkipped {
                index,
                total,
                filename: filename.clone(),
                error: e.to_string(),
            });
            return DocumentOutcome::Skipped(SkippedDocument {
                filename,
                error: e.to_string(),
            });
        }
    };

    let mut records = Vec::with_capacity(ctx.criteria.len());
    let mut outcomes = Vec::with_capacity(ctx.criteria.len());
    for criterion in &ctx.criteria {
        if cancel.is_cancelled() {
            break;
        }
        progress(ProgressEvent::CriterionStarted {
            filename: filename.clone(),
            criterion: criterion.name.to_string(),
        });

        let evaluated = tokio::select! {
            _ = cancel.cancelled() => None,
            evaluated = evaluate_criterion(ctx.model.as_ref(), criterion, &filename, &text) => Some(evaluated),
        };
        let Some((record, outcome)) = evaluated else {
            tracing::warn!(file = %filename, criterion = criterion.name, "cancelled mid-criterion");
            break;
        };

        progress(ProgressEvent::CriterionFinished {
            filename: filename.clone(),
            criterion: criterion.name.to_string(),
            outcome: outcome.clone(),
        });
        records.push(record);
        outcomes.push((criterion.name, outcome));
    }

    progress(ProgressEvent::DocumentFinished {
        index,
        total,
        filename,
        records: records.len(),
    });
    DocumentOutcome::Evaluated {
        complete: records.len() == ctx.criteria.len(),
        records,
        outcomes,
    }
}

/// Run the blocking PDF backend off the async executor.
async fn extract_blocking(ctx: &RunContext, path: &Path) -> Result<String, BackendError> {
    let backend = ctx.pdf_backend.clone();
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_document_text(&path, backend.as_ref()))
        .await
        .map_err(|e| BackendError::ExtractionError(format!("extraction task failed: {e}")))?
}

/// Drive the two-call protocol for one criterion.
pub async fn evaluate_criterion(
    model: &dyn ModelClient,
    criterion: &Criterion,
    filename: &str,
    document_text: &str,
) -> (EvaluationRecord, CriterionOutcome) {
    let record = |initial: String, detailed: String| EvaluationRecord {
        filename: filename.to_string(),
        question: criterion.name.to_string(),
        initial_response: initial,
        detailed_response: detailed,
    };

    let initial_prompt = prompt::build_initial_prompt(criterion, document_text);
    let initial = match model.generate(&initial_prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(file = filename, criterion = criterion.name, stage = "initial", error = %e, "model call failed");
            return (
                record(MODEL_ERROR_MARKER.to_string(), MODEL_ERROR_MARKER.to_string()),
                CriterionOutcome::InitialCallFailed {
                    error: e.to_string(),
                },
            );
        }
    };

    let answer = match response::parse(&initial) {
        Ok(answer) => answer,
        Err(e) => {
            tracing::error!(file = filename, criterion = criterion.name, stage = "parse", error = %e, "initial response unusable");
            let marker = format!("{DETAILED_SKIPPED_PREFIX}: {e}");
            return (
                record(initial, marker),
                CriterionOutcome::DetailedSkipped {
                    error: e.to_string(),
                },
            );
        }
    };
    let detailed_prompt = prompt::render_detailed_prompt(criterion, &answer, document_text);
    let evaluation = answer.evaluation;

    match model.generate(&detailed_prompt).await {
        Ok(detailed) => (record(initial, detailed), CriterionOutcome::Done { evaluation }),
        Err(e) => {
            tracing::error!(file = filename, criterion = criterion.name, stage = "detailed", error = %e, "model call failed");
            (
                record(initial, MODEL_ERROR_MARKER.to_string()),
                CriterionOutcome::DetailedCallFailed {
                    evaluation,
                    error: e.to_string(),
                },
            )
        }
    }
}
