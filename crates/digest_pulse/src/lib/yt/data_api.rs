use std::collections::HashMap;

use chrono::{DateTime, Utc};
use digest_datastore::VideoCandidate;
use itertools::Itertools;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    parser::decode_entities,
    yt::{VideoSource, VideoStats},
};

#[derive(Debug, thiserror::Error)]
pub enum YouTubeApiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// YouTube Data API v3 client used for channel discovery.
#[derive(Clone)]
pub struct YouTubeDataApi {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

impl YouTubeDataApi {
    const BASE_URL: &'static str = "https://www.googleapis.com/youtube/v3";
    const MAX_RETRIES: u32 = 3;

    pub fn new(api_key: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(Self::MAX_RETRIES);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            api_key: api_key.into(),
            base_url: Self::BASE_URL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<T, YouTubeApiError> {
        let resp = self
            .client
            .get(format!("{}/{resource}", self.base_url))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, resource, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(YouTubeApiError::Api { status, message });
        }

        Ok(resp.json::<T>().await?)
    }
}

impl VideoSource for YouTubeDataApi {
    type Error = YouTubeApiError;

    #[tracing::instrument(skip(self))]
    async fn discover(
        &self,
        channel_id: &str,
        max_results: usize,
    ) -> Result<Vec<VideoCandidate>, Self::Error> {
        let max_results = max_results.min(Self::MAX_PAGE_SIZE);
        let response = self
            .get_json::<SearchResponse>(
                "search",
                &[
                    ("part", "snippet".into()),
                    ("channelId", channel_id.into()),
                    ("order", "date".into()),
                    ("type", "video".into()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;

        let candidates = response.into_candidates();
        tracing::info!(count = candidates.len(), "Discovered videos");
        Ok(candidates)
    }

    #[tracing::instrument(skip_all, fields(count = video_ids.len()))]
    async fn enrich(&self, video_ids: &[String]) -> Result<HashMap<String, VideoStats>, Self::Error> {
        let mut stats = HashMap::with_capacity(video_ids.len());

        for ids in video_ids.chunks(Self::MAX_PAGE_SIZE) {
            let response = self
                .get_json::<VideosResponse>(
                    "videos",
                    &[
                        ("part", "snippet,statistics".into()),
                        ("id", ids.iter().join(",")),
                    ],
                )
                .await?;
            stats.extend(response.into_stats());
        }

        Ok(stats)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Thumbnails {
    fn best_url(&self) -> Option<String> {
        self.medium
            .as_ref()
            .or(self.high.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
    }
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Option<Snippet>,
    statistics: Option<Statistics>,
}

/// Counts arrive as decimal strings and are omitted when hidden.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

fn parse_count(value: Option<&str>) -> u64 {
    value.and_then(|v| v.parse().ok()).unwrap_or_default()
}

impl SearchResponse {
    fn into_candidates(self) -> Vec<VideoCandidate> {
        self.items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                let snippet = item.snippet.unwrap_or_default();
                Some(VideoCandidate {
                    video_id,
                    // search snippets are HTML-escaped, unlike videos.list
                    title: decode_entities(&snippet.title).into_owned(),
                    channel_title: decode_entities(&snippet.channel_title).into_owned(),
                    published_at: snippet.published_at.unwrap_or_default(),
                    thumbnail_url: snippet.thumbnails.as_ref().and_then(Thumbnails::best_url),
                    view_count: 0,
                    like_count: 0,
                })
            })
            .collect()
    }
}

impl VideosResponse {
    fn into_stats(self) -> impl Iterator<Item = (String, VideoStats)> {
        self.items.into_iter().map(|item| {
            let statistics = item.statistics.as_ref();
            let stats = VideoStats {
                view_count: parse_count(statistics.and_then(|s| s.view_count.as_deref())),
                like_count: parse_count(statistics.and_then(|s| s.like_count.as_deref())),
                thumbnail_url: item
                    .snippet
                    .as_ref()
                    .and_then(|s| s.thumbnails.as_ref())
                    .and_then(Thumbnails::best_url),
            };
            (item.id, stats)
        })
    }
}
