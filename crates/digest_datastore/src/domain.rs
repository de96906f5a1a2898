use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A video discovered on the monitored channel during the current run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub view_count: u64,
    pub like_count: u64,
}

/// The current transcript of a video within a channel partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRecord {
    pub video_id: String,
    pub channel_id: String,
    pub captured_at: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub short_summary: String,
    pub detail_summary: String,
}

impl SummaryRecord {
    /// Both summaries carry non-whitespace content.
    pub fn is_complete(&self) -> bool {
        !self.short_summary.trim().is_empty() && !self.detail_summary.trim().is_empty()
    }
}

/// The durable record of a video, keyed by `(channel_id, captured_at)`.
///
/// The same `captured_at` is reused for every write concerning a video so that
/// the transcript checkpoint and the final summarized record land on one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedVideoItem {
    pub channel_id: String,
    pub captured_at: DateTime<Utc>,
    pub video: VideoCandidate,
    pub transcript: Option<String>,
    pub summary: Option<SummaryRecord>,
}

impl PersistedVideoItem {
    /// Builds a transcript-only record, written before summarization is attempted.
    pub fn checkpoint(transcript: TranscriptRecord, video: VideoCandidate) -> Self {
        PersistedVideoItem {
            channel_id: transcript.channel_id,
            captured_at: transcript.captured_at,
            video,
            transcript: Some(transcript.text),
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: SummaryRecord) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn is_fully_processed(&self) -> bool {
        self.summary.as_ref().is_some_and(SummaryRecord::is_complete)
    }

    pub fn has_transcript_only(&self) -> bool {
        self.transcript_record().is_some() && !self.is_fully_processed()
    }

    pub fn transcript_record(&self) -> Option<TranscriptRecord> {
        self.transcript
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(|text| TranscriptRecord {
                video_id: self.video.video_id.clone(),
                channel_id: self.channel_id.clone(),
                captured_at: self.captured_at,
                text: text.to_string(),
            })
    }
}

/// Read-side projection of a stored video; the transcript is left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub video_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub detail_summary: Option<String>,
    pub processed_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    pub channel_title: String,
    pub view_count: u64,
    pub like_count: u64,
    pub thumbnail_url: Option<String>,
}

impl From<&PersistedVideoItem> for SummaryView {
    fn from(item: &PersistedVideoItem) -> Self {
        let (summary, detail_summary) = match &item.summary {
            Some(s) => (Some(s.short_summary.clone()), Some(s.detail_summary.clone())),
            None => (None, None),
        };

        SummaryView {
            video_id: item.video.video_id.clone(),
            title: item.video.title.clone(),
            summary,
            detail_summary,
            processed_at: item.captured_at,
            published_at: item.video.published_at,
            channel_title: item.video.channel_title.clone(),
            view_count: item.video.view_count,
            like_count: item.video.like_count,
            thumbnail_url: item.video.thumbnail_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(transcript: Option<&str>, summary: Option<(&str, &str)>) -> PersistedVideoItem {
        PersistedVideoItem {
            channel_id: "UC123".into(),
            captured_at: Utc::now(),
            video: VideoCandidate {
                video_id: "vid1".into(),
                ..Default::default()
            },
            transcript: transcript.map(str::to_string),
            summary: summary.map(|(s, d)| SummaryRecord {
                short_summary: s.into(),
                detail_summary: d.into(),
            }),
        }
    }

    #[test]
    fn test_fully_processed_requires_both_summaries() {
        assert!(item(Some("t"), Some(("short", "detail"))).is_fully_processed());
        assert!(!item(Some("t"), Some(("short", ""))).is_fully_processed());
        assert!(!item(Some("t"), Some(("  ", "detail"))).is_fully_processed());
        assert!(!item(Some("t"), None).is_fully_processed());
    }

    #[test]
    fn test_transcript_only_state() {
        assert!(item(Some("transcript"), None).has_transcript_only());
        assert!(!item(Some("transcript"), Some(("s", "d"))).has_transcript_only());
        assert!(!item(None, None).has_transcript_only());
        assert!(!item(Some("   "), None).has_transcript_only());
    }

    #[test]
    fn test_checkpoint_keeps_transcript_key() {
        let captured_at = Utc::now();
        let checkpoint = PersistedVideoItem::checkpoint(
            TranscriptRecord {
                video_id: "vid1".into(),
                channel_id: "UC123".into(),
                captured_at,
                text: "hello".into(),
            },
            VideoCandidate {
                video_id: "vid1".into(),
                ..Default::default()
            },
        );

        assert_eq!(checkpoint.channel_id, "UC123");
        assert_eq!(checkpoint.captured_at, captured_at);
        assert!(checkpoint.summary.is_none());

        let record = checkpoint.transcript_record().expect("transcript record");
        assert_eq!(record.text, "hello");
        assert_eq!(record.video_id, "vid1");
    }

    #[test]
    fn test_summary_view_serializes_camel_case_without_transcript() {
        let view = SummaryView::from(&item(Some("secret transcript"), Some(("s", "d"))));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["videoId"], "vid1");
        assert_eq!(json["summary"], "s");
        assert_eq!(json["detailSummary"], "d");
        assert!(json.get("transcript").is_none());
    }
}
