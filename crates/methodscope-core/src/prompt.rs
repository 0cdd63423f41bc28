//! Prompt construction for the two-call evaluation protocol.

use std::fmt::Write;

use crate::criteria::{Criterion, EVALUATION_LABELS};
use crate::response::{self, ParseError, ParsedModelAnswer};

/// Build the first-stage classification prompt.
///
/// The whole document text is embedded as-is; nothing is truncated or chunked.
pub fn build_initial_prompt(criterion: &Criterion, document_text: &str) -> String {
    let mut options = String::new();
    for (ordinal, option) in criterion.enumerated_options() {
        let _ = writeln!(options, "{ordinal}: {option}");
    }

    let labels = EVALUATION_LABELS
        .iter()
        .map(|l| format!("\"{l}\""))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are reviewing an academic article for methodological transparency.\n\
         \n\
         Task: {task}\n\
         \n\
         Response options:\n\
         {options}\
         \n\
         Respond with a single JSON object containing exactly these keys:\n\
         - \"question\": the task description above, repeated verbatim\n\
         - \"evaluation\": one of {labels}\n\
         - \"reasoning\": your justification, citing evidence from the article\n\
         \n\
         Example of the expected format:\n\
         {{\"question\": \"{task}\", \"evaluation\": \"1 - Unclear\", \"reasoning\": \"The methods section mentions the topic but gives no specific details.\"}}\n\
         \n\
         Article text:\n\
         {document_text}\n",
        task = criterion.task,
    )
}

/// Build the second-stage reflection prompt from the raw initial response.
///
/// Fails when the initial response carries no usable JSON answer; the caller
/// records that outcome instead of sending anything to the model.
pub fn build_detailed_prompt(
    criterion: &Criterion,
    initial_response_raw: &str,
    document_text: &str,
) -> Result<String, ParseError> {
    let answer = response::parse(initial_response_raw)?;
    Ok(render_detailed_prompt(criterion, &answer, document_text))
}

/// Second-stage prompt for an already parsed initial answer.
pub fn render_detailed_prompt(
    criterion: &Criterion,
    answer: &ParsedModelAnswer,
    document_text: &str,
) -> String {
    format!(
        "You previously reviewed an academic article for methodological transparency.\n\
         \n\
         Task: {task}\n\
         Your evaluation was: \"{evaluation}\"\n\
         \n\
         Reflect on whether this evaluation was correct. Quote passages from the \
         article directly as evidence that supports or refutes the evaluation. If \
         the article contains no relevant passage, say so.\n\
         \n\
         Respond with a single JSON object containing exactly these keys:\n\
         - \"reflection\": whether the evaluation was correct, and why\n\
         - \"supporting evidence\": a list of direct quotations from the article\n\
         \n\
         Article text:\n\
         {document_text}\n",
        task = criterion.task,
        evaluation = answer.evaluation,
    )
}
