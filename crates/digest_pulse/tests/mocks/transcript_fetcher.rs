use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use digest_pulse::{TranscriptError, TranscriptFetcher};

#[derive(Clone, Debug)]
pub enum FetchResult {
    Text(String),
    NotAvailable,
    TransportError,
}

#[derive(Clone)]
pub struct MockTranscriptFetcher {
    pub calls: Arc<Mutex<Vec<String>>>,
    /// Result for any video without an entry in `overrides`.
    pub default: FetchResult,
    pub overrides: HashMap<String, FetchResult>,
}

impl MockTranscriptFetcher {
    pub fn new(text: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            default: FetchResult::Text(text.to_string()),
            overrides: HashMap::new(),
        }
    }

    pub fn failing(result: FetchResult) -> Self {
        Self {
            default: result,
            ..Self::new("")
        }
    }

    pub fn with_override(mut self, video_id: &str, result: FetchResult) -> Self {
        self.overrides.insert(video_id.to_string(), result);
        self
    }
}

impl TranscriptFetcher for MockTranscriptFetcher {
    const WATCH_URL: &'static str = "https://example.invalid/watch";

    async fn fetch(&self, video_id: &str) -> Result<String, TranscriptError> {
        self.calls.lock().unwrap().push(video_id.to_string());
        match self.overrides.get(video_id).unwrap_or(&self.default) {
            FetchResult::Text(text) => Ok(text.clone()),
            FetchResult::NotAvailable => Err(TranscriptError::not_available("captions disabled")),
            FetchResult::TransportError => {
                Err(TranscriptError::Other("connection reset by peer".into()))
            }
        }
    }
}
