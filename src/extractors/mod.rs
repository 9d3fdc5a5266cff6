// Structured extractors: deterministic parsers for model output.
//
// The completion service answers in free text that is supposed to contain a
// single JSON array (lead search) or object (email draft). Extraction finds
// that span, then `parse_payload` validates it against a serde type. Nothing
// here panics on hostile input; every failure is an `ExtractError`.

use regex::Regex;
use serde::de::DeserializeOwned;

/// Characters of the raw reply echoed back in extraction errors.
pub const PREVIEW_CHARS: usize = 150;

/// Failure to recover a typed payload from model output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// No bracket-delimited array and no fenced JSON block.
    #[error("the model response did not contain a valid JSON array; it began: {preview}...")]
    NoArray {
        /// Leading characters of the reply.
        preview: String,
    },
    /// No brace-delimited object and no fenced JSON block.
    #[error("the model response did not contain a valid JSON object; it began: {preview}...")]
    NoObject {
        /// Leading characters of the reply.
        preview: String,
    },
    /// The span was found but does not match the expected shape.
    #[error("the model response was not valid JSON for the expected shape: {0}")]
    Schema(String),
}

/// Locate the JSON array in a model reply.
///
/// Uses the span from the first `[` to the last `]` when one exists,
/// otherwise the contents of a ```` ```json ```` fence.
///
/// # Errors
///
/// Returns [`ExtractError::NoArray`] when neither form is present.
pub fn extract_json_array(text: &str) -> Result<&str, ExtractError> {
    let text = text.trim();
    delimited_span(text, '[', ']')
        .or_else(|| fenced_block(text))
        .ok_or_else(|| ExtractError::NoArray {
            preview: preview(text),
        })
}

/// Locate the JSON object in a model reply.
///
/// Uses the span from the first `{` to the last `}` when one exists,
/// otherwise the contents of a ```` ```json ```` fence.
///
/// # Errors
///
/// Returns [`ExtractError::NoObject`] when neither form is present.
pub fn extract_json_object(text: &str) -> Result<&str, ExtractError> {
    let text = text.trim();
    delimited_span(text, '{', '}')
        .or_else(|| fenced_block(text))
        .ok_or_else(|| ExtractError::NoObject {
            preview: preview(text),
        })
}

/// Deserialize an extracted span into `T`, rejecting unknown shapes.
///
/// # Errors
///
/// Returns [`ExtractError::Schema`] with the serde message on mismatch.
pub fn parse_payload<T: DeserializeOwned>(span: &str) -> Result<T, ExtractError> {
    serde_json::from_str(span).map_err(|e| ExtractError::Schema(e.to_string()))
}

fn delimited_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    text.get(start..=end)
}

fn fenced_block(text: &str) -> Option<&str> {
    let fence = Regex::new(r"(?s)```json\s*(.*?)\s*```").ok()?;
    let inner = fence.captures(text)?.get(1)?.as_str();
    (!inner.is_empty()).then_some(inner)
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
