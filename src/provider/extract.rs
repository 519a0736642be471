//! Text extraction from provider payloads
//!
//! Providers place generated text at different paths. Each known shape is a
//! `TextExtractable` strategy; strategies are tried in priority order and
//! the first non-blank match wins.

use serde_json::Value;

pub trait TextExtractable: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, payload: &Value) -> Option<String>;
}

/// `choices[0].message.content`, as a string or a list of text parts.
pub struct ChatCompletionsShape;

impl TextExtractable for ChatCompletionsShape {
    fn name(&self) -> &'static str {
        "chat_completions"
    }

    fn extract(&self, payload: &Value) -> Option<String> {
        let content = payload
            .get("choices")?
            .as_array()?
            .first()?
            .get("message")?
            .get("content")?;

        match content {
            Value::String(text) => Some(text.clone()),
            Value::Array(parts) => Some(join_text_parts(parts.iter())),
            _ => None,
        }
    }
}

/// Top-level `output_text`, else the text parts of every `output[*].content`.
pub struct StructuredOutputShape;

impl TextExtractable for StructuredOutputShape {
    fn name(&self) -> &'static str {
        "structured_output"
    }

    fn extract(&self, payload: &Value) -> Option<String> {
        if let Some(text) = payload.get("output_text").and_then(Value::as_str) {
            if !text.trim().is_empty() {
                return Some(text.to_string());
            }
        }

        let parts = payload
            .get("output")?
            .as_array()?
            .iter()
            .filter_map(|item| item.get("content").and_then(Value::as_array))
            .flatten()
            .filter(|part| {
                matches!(
                    part.get("type").and_then(Value::as_str),
                    None | Some("output_text") | Some("text")
                )
            });

        Some(join_text_parts(parts))
    }
}

/// `candidates[0].content.parts[*].text`
pub struct CandidatesShape;

impl TextExtractable for CandidatesShape {
    fn name(&self) -> &'static str {
        "candidates"
    }

    fn extract(&self, payload: &Value) -> Option<String> {
        let parts = payload
            .get("candidates")?
            .as_array()?
            .first()?
            .get("content")?
            .get("parts")?
            .as_array()?;

        Some(join_text_parts(parts.iter()))
    }
}

/// Default priority order.
pub static DEFAULT_EXTRACTORS: &[&dyn TextExtractable] =
    &[&ChatCompletionsShape, &StructuredOutputShape, &CandidatesShape];

/// Returns the text of the first strategy with a non-blank match, as the provider sent it.
pub fn extract_text(payload: &Value, extractors: &[&dyn TextExtractable]) -> Option<String> {
    extractors.iter().find_map(|extractor| {
        let text = extractor.extract(payload)?;
        if text.trim().is_empty() {
            None
        } else {
            tracing::debug!(shape = extractor.name(), "Extracted report text");
            Some(text)
        }
    })
}

fn join_text_parts<'a>(parts: impl Iterator<Item = &'a Value>) -> String {
    parts
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("")
}
