//! # Yt Parser
//!
//! Extracts caption data from YouTube watch pages: the embedded
//! `ytInitialPlayerResponse` script data, its caption tracks, and the timed-text
//! XML those tracks point at.

use std::{borrow::Cow, ops::Deref, sync::LazyLock};

use regex::{Captures, Regex};
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::Error;

static YT_PLAYER_RESPONSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var\s+ytInitialPlayerResponse\s*=\s*(\{.*?\});\s*(?:var\s|</script>)")
        .unwrap()
});

static TIMED_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text\b[^>]*>(.*?)</text>").unwrap());

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").unwrap()
});

/// Marker of the consent / bot-check wall served instead of the watch page.
const SIGN_IN_WALL_MARKER: &str = "Sign in to confirm";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub captions: Option<Captions>,
    pub playability_status: Option<PlayabilityStatus>,
}

#[derive(Debug, Deserialize)]
pub struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    pub tracklist: Option<CaptionTracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTracklist {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `"asr"` for auto-generated tracks, absent for uploaded ones.
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, language: &str) -> bool {
        self.language_code == language
            || self
                .language_code
                .strip_prefix(language)
                .is_some_and(|rest| rest.starts_with('-'))
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayabilityStatus {
    pub status: Option<String>,
    pub reason: Option<String>,
}

impl PlayerResponse {
    pub fn caption_tracks(&self) -> &[CaptionTrack] {
        self.captions
            .as_ref()
            .and_then(|c| c.tracklist.as_ref())
            .map(|t| t.caption_tracks.as_slice())
            .unwrap_or_default()
    }

    /// Human readable reason the video cannot be played, if YouTube gave one.
    pub fn unplayable_reason(&self) -> Option<&str> {
        self.playability_status
            .as_ref()
            .filter(|s| s.status.as_deref() != Some("OK"))
            .and_then(|s| s.reason.as_deref())
    }
}

/// Picks the caption track to download.
///
/// Preference order: uploaded track in `language`, auto-generated track in
/// `language`, then whatever track is listed first.
pub fn select_caption_track<'a>(
    tracks: &'a [CaptionTrack],
    language: &str,
) -> Option<&'a CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.matches_language(language) && !t.is_generated())
        .or_else(|| {
            tracks
                .iter()
                .find(|t| t.matches_language(language) && t.is_generated())
        })
        .or_else(|| tracks.first())
}

/// Joins the segments of a timed-text XML document into one line of text.
pub fn parse_timed_text(xml: &str) -> String {
    TIMED_TEXT_RE
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1))
        // segment text arrives entity-encoded twice
        .map(|m| decode_entities(&decode_entities(m.as_str())).into_owned())
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes the XML/HTML character references YouTube emits.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(text, |cap: &Captures| {
        let entity = &cap[1];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                .and_then(Result::ok)
                .and_then(char::from_u32),
        };
        decoded
            .map(String::from)
            .unwrap_or_else(|| cap[0].to_string())
    })
}

pub struct YtHtmlDocument(String);

impl Deref for YtHtmlDocument {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl YtHtmlDocument {
    pub fn new(doc: String) -> Self {
        YtHtmlDocument(doc)
    }

    pub fn is_sign_in_wall(&self) -> bool {
        self.contains(SIGN_IN_WALL_MARKER) && !self.contains("captionTracks")
    }

    pub fn to_json<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let raw = YT_PLAYER_RESPONSE_RE
            .captures(self)
            .and_then(|cap| cap.get(1))
            .ok_or(Error::ParseError(
                "Failed to extract ytInitialPlayerResponse from the page's script tag",
            ))?;

        Ok(serde_json::from_str(raw.as_str())?)
    }

    pub fn player_response(&self) -> Result<PlayerResponse, Error> {
        self.to_json::<PlayerResponse>()
    }
}

impl From<String> for YtHtmlDocument {
    fn from(value: String) -> Self {
        YtHtmlDocument(value)
    }
}
