use std::{
    fmt::{Debug, Display},
    future::Future,
    sync::LazyLock,
};

use digest_datastore::SummaryRecord;
use regex::{Captures, Regex};
use serde::Deserialize;

/// Longest transcript prefix, in characters, submitted for summarization.
pub const MAX_TRANSCRIPT_CHARS: usize = 20_000;

const SUMMARY_PROMPT: &str = include_str!("./prompts/summary.txt");

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(title|transcript)\}").unwrap());

pub trait Summarizer {
    const MAX_TRANSCRIPT_CHARS: usize = MAX_TRANSCRIPT_CHARS;
    const SUMMARIZER_MODEL: &'static str;

    type Error: Debug + Display;

    /// Produces the short/detail summary pair of a transcript. Callers bound
    /// the transcript to [`Self::MAX_TRANSCRIPT_CHARS`] beforehand.
    fn summarize(
        &self,
        transcript: &str,
        title: &str,
    ) -> impl Future<Output = Result<SummaryRecord, Self::Error>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("No content in response")]
    EmptyContent,
    #[error("Failed to parse summary json: {source}. Response: {raw}")]
    InvalidOutput {
        source: serde_json::Error,
        raw: String,
    },
    #[error("Summary json has an empty field. Response: {raw}")]
    IncompleteOutput { raw: String },
}

/// Cuts `transcript` to its first `max_chars` characters, never splitting a
/// character.
pub fn truncate_transcript(transcript: &str, max_chars: usize) -> &str {
    match transcript.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &transcript[..byte_idx],
        None => transcript,
    }
}

/// Fills the summary prompt in one pass, so placeholder text inside the
/// title or transcript is left as is.
pub fn build_prompt(transcript: &str, title: &str) -> String {
    PLACEHOLDER_RE
        .replace_all(SUMMARY_PROMPT, |caps: &Captures| match &caps[1] {
            "title" => title,
            _ => transcript,
        })
        .into_owned()
}

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    short_summary: String,
    detail_summary: String,
}

/// Validates the model output against the summary contract: a JSON object
/// with non-empty `short_summary` and `detail_summary` strings, optionally
/// wrapped in a fenced code block.
pub fn parse_summary_response(raw: &str) -> Result<SummaryRecord, SummarizeError> {
    let cleaned = strip_code_fence(raw.trim());

    let payload = serde_json::from_str::<SummaryPayload>(cleaned).map_err(|source| {
        SummarizeError::InvalidOutput {
            source,
            raw: raw.to_string(),
        }
    })?;

    let summary = SummaryRecord {
        short_summary: payload.short_summary,
        detail_summary: payload.detail_summary,
    };
    if !summary.is_complete() {
        return Err(SummarizeError::IncompleteOutput {
            raw: raw.to_string(),
        });
    }

    Ok(summary)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(body) = text.strip_prefix("```") else {
        return text;
    };
    // language tag, e.g. ```json
    let body = body.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_response() {
        let raw = "```json\n{\"short_summary\":\"a\",\"detail_summary\":\"b\"}\n```";
        let summary = parse_summary_response(raw).unwrap();
        assert_eq!(summary.short_summary, "a");
        assert_eq!(summary.detail_summary, "b");
    }

    #[test]
    fn test_parse_plain_response_with_whitespace() {
        let raw = "\n  {\"short_summary\": \"short\", \"detail_summary\": \"## Detail\\n- point\"}  \n";
        let summary = parse_summary_response(raw).unwrap();
        assert_eq!(summary.short_summary, "short");
        assert_eq!(summary.detail_summary, "## Detail\n- point");
    }

    #[test]
    fn test_parse_bare_fence_without_language() {
        let raw = "```\n{\"short_summary\":\"a\",\"detail_summary\":\"b\"}```";
        assert!(parse_summary_response(raw).is_ok());
    }

    #[test]
    fn test_parse_malformed_json_keeps_raw_text() {
        let raw = "Here is your summary: {not json}";
        let err = parse_summary_response(raw).unwrap_err();
        match err {
            SummarizeError::InvalidOutput { raw: kept, .. } => assert_eq!(kept, raw),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_field_is_error() {
        let raw = r#"{"short_summary": "only short"}"#;
        assert!(matches!(
            parse_summary_response(raw),
            Err(SummarizeError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn test_parse_empty_field_is_error() {
        let raw = r#"{"short_summary": "s", "detail_summary": "   "}"#;
        assert!(matches!(
            parse_summary_response(raw),
            Err(SummarizeError::IncompleteOutput { .. })
        ));
    }

    #[test]
    fn test_truncate_is_exact_prefix() {
        let transcript = "あ".repeat(MAX_TRANSCRIPT_CHARS + 500);
        let truncated = truncate_transcript(&transcript, MAX_TRANSCRIPT_CHARS);

        assert_eq!(truncated.chars().count(), MAX_TRANSCRIPT_CHARS);
        assert!(transcript.starts_with(truncated));
        assert_eq!(truncated.len(), MAX_TRANSCRIPT_CHARS * "あ".len());
    }

    #[test]
    fn test_truncate_leaves_short_text_untouched() {
        assert_eq!(truncate_transcript("short", MAX_TRANSCRIPT_CHARS), "short");
        assert_eq!(truncate_transcript("", 10), "");
        assert_eq!(truncate_transcript("abcdef", 3), "abc");
    }

    #[test]
    fn test_build_prompt_embeds_title_and_transcript() {
        let prompt = build_prompt("the transcript body", "My Video");

        assert!(prompt.contains("Video title: My Video"));
        assert!(prompt.contains("the transcript body"));
        assert!(!prompt.contains("{title}"));
        assert!(!prompt.contains("{transcript}"));
        assert!(prompt.contains("\"short_summary\""));
    }

    #[test]
    fn test_build_prompt_leaves_placeholders_in_title_alone() {
        let transcript = "x".repeat(MAX_TRANSCRIPT_CHARS);
        let prompt = build_prompt(&transcript, "Reacting to {transcript} memes");

        assert_eq!(prompt.matches(transcript.as_str()).count(), 1);
        assert!(prompt.contains("Video title: Reacting to {transcript} memes"));
    }
}
