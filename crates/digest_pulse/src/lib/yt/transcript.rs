use std::ops::Deref;

use crate::{
    parser::{parse_timed_text, select_caption_track, YtHtmlDocument},
    yt::{TranscriptError, TranscriptFetcher},
};

/// Scrapes caption tracks off the public watch page.
///
/// Fragile by nature and rate limited by YouTube, so only used when the run
/// is allowed to fetch transcripts live.
#[derive(Debug, Clone)]
pub struct YtTranscriptFetcher {
    client: reqwest::Client,
    language: String,
}

impl YtTranscriptFetcher {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            language: language.into(),
        }
    }

    async fn watch_page(&self, video_id: &str) -> Result<YtHtmlDocument, TranscriptError> {
        let html = self
            .client
            .get(Self::WATCH_URL)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(html.into())
    }
}

impl Deref for YtTranscriptFetcher {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl TranscriptFetcher for YtTranscriptFetcher {
    const WATCH_URL: &'static str = "https://www.youtube.com/watch";

    #[tracing::instrument(skip(self), fields(language = %self.language))]
    async fn fetch(&self, video_id: &str) -> Result<String, TranscriptError> {
        let doc = self.watch_page(video_id).await?;
        if doc.is_sign_in_wall() {
            return Err(TranscriptError::not_available(
                "YouTube requires sign-in to view this page",
            ));
        }

        let player = doc.player_response()?;
        let track = select_caption_track(player.caption_tracks(), &self.language)
            .ok_or_else(|| {
                TranscriptError::not_available(
                    player
                        .unplayable_reason()
                        .unwrap_or("video has no caption tracks"),
                )
            })?;

        tracing::debug!(
            language_code = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track"
        );

        let xml = self
            .get(&track.base_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let transcript = parse_timed_text(&xml);
        if transcript.is_empty() {
            return Err(TranscriptError::not_available("caption track is empty"));
        }

        Ok(transcript)
    }
}
