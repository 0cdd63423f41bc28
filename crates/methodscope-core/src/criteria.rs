//! The fixed catalog of transparency criteria.
//!
//! Task descriptions and response options are embedded verbatim in the
//! prompts, so changing their wording changes model output. Every criterion
//! uses the same three-level rubric: `0 - Missing`, `1 - Unclear`, `2 - Clear`.

use thiserror::Error;

/// Evaluation labels the model is asked to choose from, indexed by ordinal.
pub const EVALUATION_LABELS: [&str; 3] = ["0 - Missing", "1 - Unclear", "2 - Clear"];

/// One evaluative dimension with its scoring rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criterion {
    pub name: &'static str,
    pub task: &'static str,
    /// Rubric options in ordinal order (0, 1, 2).
    pub response_options: [&'static str; 3],
}

impl Criterion {
    /// Options paired with their ordinal.
    pub fn enumerated_options(&self) -> impl Iterator<Item = (usize, &'static str)> {
        self.response_options.into_iter().enumerate()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown criterion {name:?} (known: {known})")]
    UnknownCriterion { name: String, known: String },
}

static CATALOG: [Criterion; 7] = [
    Criterion {
        name: "central_research_question",
        task: "Assess whether the article clearly states its central research question(s), aim, or hypothesis, so that a reader can tell what the study set out to answer.",
        response_options: [
            "0 - Missing: The article does not state a research question, aim, or hypothesis.",
            "1 - Unclear: A research question or aim is implied or mentioned, but it is vague, scattered across the text, or inconsistent.",
            "2 - Clear: The central research question(s), aim, or hypothesis is explicitly and unambiguously stated.",
        ],
    },
    Criterion {
        name: "data_collection",
        task: "Assess whether the article describes how the data were collected (instruments, procedures, setting, and timing) in enough detail for the study to be repeated.",
        response_options: [
            "0 - Missing: The article does not describe how the data were collected.",
            "1 - Unclear: Data collection is mentioned, but key details such as instruments, procedures, setting, or timing are missing or ambiguous.",
            "2 - Clear: The data collection methods are described explicitly and in enough detail to be replicated.",
        ],
    },
    Criterion {
        name: "sampling",
        task: "Assess whether the article explains how participants, cases, or sources were selected, including the sampling strategy and the inclusion and exclusion criteria.",
        response_options: [
            "0 - Missing: The article does not explain how participants, cases, or sources were selected.",
            "1 - Unclear: The sampling approach is mentioned, but the strategy or the inclusion and exclusion criteria are incomplete or ambiguous.",
            "2 - Clear: The sampling strategy and the inclusion and exclusion criteria are stated explicitly.",
        ],
    },
    Criterion {
        name: "sample_size",
        task: "Assess whether the article reports the size of the sample and, where relevant, explains how that size was determined or justified.",
        response_options: [
            "0 - Missing: The article does not report the sample size.",
            "1 - Unclear: A sample size is reported, but it is inconsistent, only partially reported, or given without any justification.",
            "2 - Clear: The sample size is reported explicitly and its determination or justification is explained.",
        ],
    },
    Criterion {
        name: "analysis",
        task: "Assess whether the article describes how the data were analysed, including the analytic approach, procedures, and any software or coding frameworks used.",
        response_options: [
            "0 - Missing: The article does not describe how the data were analysed.",
            "1 - Unclear: The analysis is named or briefly mentioned, but the procedures are not described well enough to follow.",
            "2 - Clear: The analytic approach and procedures are described explicitly and in enough detail to be followed.",
        ],
    },
    Criterion {
        name: "conclusions",
        task: "Assess whether the article's conclusions are clearly stated and explicitly linked to the results and to the research question(s).",
        response_options: [
            "0 - Missing: The article does not state conclusions drawn from its results.",
            "1 - Unclear: Conclusions are stated, but their link to the results or to the research question is weak or ambiguous.",
            "2 - Clear: The conclusions are stated explicitly and are clearly supported by and linked to the results.",
        ],
    },
    Criterion {
        name: "limitations",
        task: "Assess whether the article acknowledges the limitations of the study and discusses how they may affect the findings.",
        response_options: [
            "0 - Missing: The article does not acknowledge any limitations of the study.",
            "1 - Unclear: Limitations are mentioned in passing, but their consequences for the findings are not discussed.",
            "2 - Clear: The limitations are stated explicitly and their implications for the findings are discussed.",
        ],
    },
];

/// All criteria, in catalog order.
pub fn all() -> &'static [Criterion] {
    &CATALOG
}

/// Look up a criterion by name.
pub fn get(name: &str) -> Option<&'static Criterion> {
    CATALOG.iter().find(|c| c.name == name)
}

/// Criterion names, in catalog order.
pub fn names() -> Vec<&'static str> {
    CATALOG.iter().map(|c| c.name).collect()
}

/// Resolve a subset of criteria by name.
///
/// An empty selection means the whole catalog. The result is always in
/// catalog order, whatever order `selection` uses, and duplicates collapse.
pub fn select<S: AsRef<str>>(selection: &[S]) -> Result<Vec<&'static Criterion>, CatalogError> {
    if selection.is_empty() {
        return Ok(CATALOG.iter().collect());
    }
    for name in selection {
        let name = name.as_ref().trim();
        if get(name).is_none() {
            return Err(CatalogError::UnknownCriterion {
                name: name.to_string(),
                known: names().join(", "),
            });
        }
    }
    Ok(CATALOG
        .iter()
        .filter(|c| selection.iter().any(|s| s.as_ref().trim() == c.name))
        .collect())
}
