//! Extraction of the JSON answer embedded in a model response.
//!
//! Models wrap their JSON in prose or markdown fences. Rather than taking the
//! greedy span from the first `{` to the last `}`, each `{` is tried in turn
//! as the start of a streaming decode. [`extract_json_object`] takes the first
//! complete object; [`parse`] takes the first one that is a valid answer.
//! Trailing text after the object is ignored.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no JSON object found in model response")]
    NoJsonFound,
    #[error("malformed JSON in model response: {0}")]
    MalformedJson(String),
}

/// The classification extracted from an initial response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParsedModelAnswer {
    pub evaluation: String,
    #[serde(default)]
    pub reasoning: String,
}

impl ParsedModelAnswer {
    /// Rubric ordinal (0, 1 or 2) from the leading digit of the label, if any.
    pub fn ordinal(&self) -> Option<u8> {
        label_ordinal(&self.evaluation)
    }
}

/// Rubric ordinal of an evaluation label such as `"2 - Clear"`.
pub fn label_ordinal(label: &str) -> Option<u8> {
    match label.trim_start().chars().next()? {
        '0' => Some(0),
        '1' => Some(1),
        '2' => Some(2),
        _ => None,
    }
}

fn has_brace_span(raw: &str) -> bool {
    raw.find('{')
        .is_some_and(|start| raw[start..].contains('}'))
}

/// One decode attempt per `{`, in text order. Positions that decode to a
/// non-object value are skipped.
fn candidate_objects(raw: &str) -> impl Iterator<Item = Result<Map<String, Value>, String>> + '_ {
    raw.match_indices('{').filter_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => Some(Ok(map)),
            Some(Ok(_)) | None => None,
            Some(Err(e)) => Some(Err(e.to_string())),
        }
    })
}

/// Scan candidates until `accept` takes one. The error from the earliest
/// candidate is reported when none is accepted.
fn first_accepted<T>(
    raw: &str,
    accept: impl Fn(Map<String, Value>) -> Result<T, String>,
) -> Result<T, ParseError> {
    if !has_brace_span(raw) {
        return Err(ParseError::NoJsonFound);
    }

    let mut first_error = None;
    for candidate in candidate_objects(raw) {
        match candidate.and_then(&accept) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    Err(ParseError::MalformedJson(
        first_error.unwrap_or_else(|| "no decodable object".to_string()),
    ))
}

/// Find the first JSON object embedded in `raw`.
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    first_accepted(raw, Ok)
}

/// Parse an initial response into a [`ParsedModelAnswer`].
///
/// Embedded objects that are not an answer (an empty `{}`, a quoted
/// fragment) are passed over in favor of a later one that is.
pub fn parse(raw: &str) -> Result<ParsedModelAnswer, ParseError> {
    first_accepted(raw, |object| {
        serde_json::from_value(Value::Object(object)).map_err(|e| e.to_string())
    })
}
