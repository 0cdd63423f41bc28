use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod criteria;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod response;
pub mod text;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use criteria::{CatalogError, Criterion};
pub use model::{MODEL_ERROR_MARKER, ModelCallError, ModelClient, ModelSettings, OllamaClient};
pub use pipeline::{RunOutcome, discover_documents, run_evaluation};
pub use response::{ParseError, ParsedModelAnswer};

/// Prefix of the detailed response stored when the initial answer could not
/// be parsed and the follow-up call was skipped.
pub const DETAILED_SKIPPED_PREFIX: &str = "Detailed prompt skipped";

/// One stored outcome for a (document, criterion) pair.
///
/// Field order and serialized names are part of the output format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Initial Response")]
    pub initial_response: String,
    #[serde(rename = "Detailed Response")]
    pub detailed_response: String,
}

/// A document that was found but could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDocument {
    pub filename: String,
    pub error: String,
}

/// How often each rubric level was assigned for one criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCounts {
    pub missing: usize,
    pub unclear: usize,
    pub clear: usize,
    /// Initial responses without a usable evaluation label.
    pub unparsed: usize,
    /// Initial model calls that failed outright.
    pub model_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionScores {
    pub criterion: String,
    pub counts: ScoreCounts,
}

/// Run-level metadata written alongside the records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub input_folder: PathBuf,
    pub model: String,
    pub criteria: Vec<String>,
    pub documents_found: usize,
    /// Documents whose text was extracted, including incomplete ones.
    pub documents_evaluated: usize,
    /// Evaluated documents cut off by cancellation before every criterion ran.
    pub documents_incomplete: usize,
    pub documents_skipped: Vec<SkippedDocument>,
    pub records: usize,
    pub cancelled: bool,
    pub scores: Vec<CriterionScores>,
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    DocumentStarted {
        index: usize,
        total: usize,
        filename: String,
    },
    DocumentSkipped {
        index: usize,
        total: usize,
        filename: String,
        error: String,
    },
    CriterionStarted {
        filename: String,
        criterion: String,
    },
    CriterionFinished {
        filename: String,
        criterion: String,
        outcome: CriterionOutcome,
    },
    DocumentFinished {
        index: usize,
        total: usize,
        filename: String,
        records: usize,
    },
}

/// How the two-call protocol ended for one criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriterionOutcome {
    /// Both calls succeeded; carries the evaluation label.
    Done { evaluation: String },
    /// The initial call failed.
    InitialCallFailed { error: String },
    /// The initial answer held no usable JSON, so the follow-up was skipped.
    DetailedSkipped { error: String },
    /// The initial answer parsed but the follow-up call failed.
    DetailedCallFailed { evaluation: String, error: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input folder not found: {0}")]
    FolderNotFound(PathBuf),
    #[error("cannot read input folder {path}: {source}")]
    ReadFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything a run needs, passed explicitly rather than held globally.
#[derive(Clone)]
pub struct RunContext {
    pub model: Arc<dyn ModelClient>,
    pub pdf_backend: Arc<dyn PdfBackend>,
    /// Criteria to evaluate, in catalog order.
    pub criteria: Vec<&'static Criterion>,
    /// Documents evaluated at the same time. 1 means fully sequential.
    pub max_concurrent_documents: usize,
}

impl RunContext {
    /// A sequential context over the full catalog.
    pub fn new(model: Arc<dyn ModelClient>, pdf_backend: Arc<dyn PdfBackend>) -> Self {
        Self {
            model,
            pdf_backend,
            criteria: criteria::all().iter().collect(),
            max_concurrent_documents: 1,
        }
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("model", &self.model.model_name())
            .field(
                "criteria",
                &self.criteria.iter().map(|c| c.name).collect::<Vec<_>>(),
            )
            .field("max_concurrent_documents", &self.max_concurrent_documents)
            .finish()
    }
}
