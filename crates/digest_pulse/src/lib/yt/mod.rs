pub mod data_api;
pub mod transcript;

use std::{
    collections::HashMap,
    fmt::{Debug, Display},
    future::Future,
};

use digest_datastore::VideoCandidate;

use crate::config::MAX_PAGE_SIZE;

/// Statistics that discovery alone does not carry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoStats {
    pub view_count: u64,
    pub like_count: u64,
    pub thumbnail_url: Option<String>,
}

pub trait VideoSource {
    const MAX_PAGE_SIZE: usize = MAX_PAGE_SIZE;

    type Error: Debug + Display;

    /// Newest-first candidates published on `channel_id`, at most
    /// `max_results` (itself bounded by [`Self::MAX_PAGE_SIZE`]).
    fn discover(
        &self,
        channel_id: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<Vec<VideoCandidate>, Self::Error>> + Send;

    /// View/like counts and thumbnails keyed by video id. Ids the service no
    /// longer knows about are absent from the mapping.
    fn enrich(
        &self,
        video_ids: &[String],
    ) -> impl Future<Output = Result<HashMap<String, VideoStats>, Self::Error>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("No transcript available: {reason}")]
    NotAvailable { reason: String },
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Parse(#[from] crate::error::Error),
    #[error("Transcript fetch failed: {0}")]
    Other(String),
}

impl TranscriptError {
    pub fn not_available(reason: impl Into<String>) -> Self {
        TranscriptError::NotAvailable {
            reason: reason.into(),
        }
    }

    pub fn is_not_available(&self) -> bool {
        matches!(self, TranscriptError::NotAvailable { .. })
    }
}

/// Live, network-backed transcript retrieval.
pub trait TranscriptFetcher {
    const WATCH_URL: &'static str;

    fn fetch(&self, video_id: &str) -> impl Future<Output = Result<String, TranscriptError>> + Send;
}
