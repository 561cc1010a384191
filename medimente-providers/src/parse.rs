use anyhow::{Context, anyhow};
use medimente_core::types::StructuredResult;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Extract the model's text from a `generateContent` envelope.
///
/// Text parts of the first candidate are concatenated.
pub fn parse_generate_content_text(body: &[u8]) -> anyhow::Result<String> {
    let resp: GenerateContentResponse =
        serde_json::from_slice(body).context("decode generateContent JSON")?;

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no candidates in generateContent response"))?;

    let finish_reason = candidate.finish_reason;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(anyhow!(
            "no text in generateContent response (finishReason={})",
            finish_reason.as_deref().unwrap_or("unknown")
        ));
    }
    Ok(text)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuredOutputError {
    #[error("model output is not valid JSON: {0}")]
    Decode(String),

    #[error("model output does not match the expected shape: {0}")]
    Malformed(String),
}

/// Decode and validate the structuring call's JSON text.
///
/// `summaryTable` and `gentleStory` must be non-empty strings and
/// `structuredSummary` an array of complete entries; otherwise nothing is
/// returned.
pub fn parse_structured_result(text: &str) -> Result<StructuredResult, StructuredOutputError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| StructuredOutputError::Decode(e.to_string()))?;

    let non_empty_str = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    };

    if !non_empty_str("summaryTable") {
        return Err(StructuredOutputError::Malformed("missing summaryTable".into()));
    }
    if !value.get("structuredSummary").is_some_and(Value::is_array) {
        return Err(StructuredOutputError::Malformed(
            "structuredSummary is not an array".into(),
        ));
    }
    if !non_empty_str("gentleStory") {
        return Err(StructuredOutputError::Malformed("missing gentleStory".into()));
    }

    serde_json::from_value(value).map_err(|e| StructuredOutputError::Malformed(e.to_string()))
}
