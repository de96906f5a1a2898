pub mod builder;

use chrono::Utc;
use digest_datastore::{DataStore, PersistedVideoItem, TranscriptRecord, VideoCandidate};
use tokio_util::sync::CancellationToken;

use crate::{
    config::PipelineConfig,
    error::PipelineError,
    llm::summarizer::truncate_transcript,
    types::{BatchStats, VideoOutcome},
    yt::{TranscriptFetcher, VideoSource},
    Summarizer,
};

/// Batch ingestion of a channel's newest videos: dedup against the store,
/// transcript acquisition, summarization and persistence.
///
/// Candidates are processed one at a time in discovery order. A failure on
/// one video is counted and logged, never propagated; only discovery
/// failures and cancellation end a run early.
///
/// The store is assumed to have no other writer for the same channel while
/// a run is in progress.
#[derive(Debug)]
pub struct IngestionPipeline<D, V, T, S>
where
    D: DataStore + Send + Sync + 'static,
    V: VideoSource + Send + Sync + 'static,
    T: TranscriptFetcher + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    config: PipelineConfig,
    store: D,
    video_source: V,
    transcript_fetcher: T,
    summarizer: S,
}

/// Candidates that survived enrichment and filtering.
struct Discovery {
    candidates: Vec<VideoCandidate>,
    found: usize,
    filtered: usize,
}

enum TranscriptAcquisition {
    /// Reused from the store; no network call was made.
    Cached(TranscriptRecord),
    /// Fetched live during this run.
    Fetched(TranscriptRecord),
    Disallowed,
    /// No captions, or the live fetch itself failed.
    Unavailable,
}

impl<D, V, T, S> IngestionPipeline<D, V, T, S>
where
    D: DataStore + Send + Sync + 'static,
    V: VideoSource + Send + Sync + 'static,
    T: TranscriptFetcher + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Runs one batch over the channel's current candidates.
    ///
    /// Triggering `cancel` aborts the video in flight and returns
    /// [`PipelineError::Cancelled`] carrying the counters accumulated so far.
    #[tracing::instrument(skip_all, fields(channel_id = %self.config.channel_id, mode = ?self.config.execution_mode))]
    pub async fn run(&self, cancel: CancellationToken) -> Result<BatchStats, PipelineError> {
        let mut stats = BatchStats::default();

        let discovery = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled { stats }),
            discovery = self.discover_candidates() => discovery?,
        };
        stats.videos_found = discovery.found;
        stats.videos_filtered = discovery.filtered;

        if discovery.candidates.is_empty() {
            tracing::info!(?stats, "No videos to process at this time");
            return Ok(stats);
        }
        tracing::info!(count = discovery.candidates.len(), "Processing videos");

        for candidate in &discovery.candidates {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(video_id = %candidate.video_id, ?stats, "Run cancelled");
                    return Err(PipelineError::Cancelled { stats });
                }
                outcome = self.process_video(candidate) => outcome,
            };
            stats.record(outcome);
        }

        tracing::info!(?stats, "Batch processing complete");
        Ok(stats)
    }

    /// Newest-first candidates merged with their statistics, minus those below
    /// the configured view/like thresholds.
    #[tracing::instrument(skip_all)]
    async fn discover_candidates(&self) -> Result<Discovery, PipelineError> {
        let channel_id = &self.config.channel_id;
        let max_results = self.config.max_results.min(V::MAX_PAGE_SIZE);

        let discovered = self
            .video_source
            .discover(channel_id, max_results)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to discover videos"))
            .map_err(|e| PipelineError::Discovery {
                channel_id: channel_id.clone(),
                reason: e.to_string(),
            })?;

        let found = discovered.len();
        if discovered.is_empty() {
            return Ok(Discovery {
                candidates: Vec::new(),
                found,
                filtered: 0,
            });
        }

        let video_ids = discovered
            .iter()
            .map(|c| c.video_id.clone())
            .collect::<Vec<_>>();
        let mut stats_by_id = self
            .video_source
            .enrich(&video_ids)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to fetch video details"))
            .map_err(|e| PipelineError::Enrichment {
                reason: e.to_string(),
            })?;

        let mut filtered = 0;
        let candidates = discovered
            .into_iter()
            .filter_map(|mut candidate| {
                let Some(video_stats) = stats_by_id.remove(&candidate.video_id) else {
                    tracing::info!(video_id = %candidate.video_id, "Skipping video: no details returned");
                    filtered += 1;
                    return None;
                };

                candidate.view_count = video_stats.view_count;
                candidate.like_count = video_stats.like_count;
                candidate.thumbnail_url = video_stats.thumbnail_url.or(candidate.thumbnail_url);

                if candidate.view_count < self.config.min_view_count
                    || candidate.like_count < self.config.min_like_count
                {
                    tracing::info!(
                        video_id = %candidate.video_id,
                        view_count = candidate.view_count,
                        like_count = candidate.like_count,
                        "Skipping video: below view/like thresholds"
                    );
                    filtered += 1;
                    return None;
                }

                Some(candidate)
            })
            .collect::<Vec<_>>();

        Ok(Discovery {
            candidates,
            found,
            filtered,
        })
    }

    #[tracing::instrument(skip_all, fields(video_id = %candidate.video_id))]
    async fn process_video(&self, candidate: &VideoCandidate) -> VideoOutcome {
        let existing = match self.store.find_by_video_id(&candidate.video_id).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::error!(error = ?e, "Failed to look up existing record");
                return VideoOutcome::Errored;
            }
        };

        if existing
            .as_ref()
            .is_some_and(PersistedVideoItem::is_fully_processed)
        {
            tracing::info!("Skipping video: already summarized");
            return VideoOutcome::SkippedProcessed;
        }

        let transcript = match self.acquire_transcript(candidate, existing.as_ref()).await {
            TranscriptAcquisition::Cached(transcript) => transcript,
            TranscriptAcquisition::Fetched(transcript) => {
                self.checkpoint(candidate, &transcript).await;
                if !self.config.fetch_delay.is_zero() {
                    tokio::time::sleep(self.config.fetch_delay).await;
                }
                transcript
            }
            TranscriptAcquisition::Disallowed | TranscriptAcquisition::Unavailable => {
                return VideoOutcome::SkippedNoTranscript;
            }
        };

        tracing::info!("Generating summary");
        let submitted = truncate_transcript(&transcript.text, S::MAX_TRANSCRIPT_CHARS);
        let summary = match self.summarizer.summarize(submitted, &candidate.title).await {
            Ok(summary) if summary.is_complete() => summary,
            Ok(_) => {
                tracing::error!("Summarizer returned an empty summary");
                return VideoOutcome::Errored;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to summarize transcript");
                return VideoOutcome::Errored;
            }
        };

        let item = PersistedVideoItem::checkpoint(transcript, candidate.clone()).with_summary(summary);
        match self.store.put(&item).await {
            Ok(()) => {
                tracing::info!("Successfully processed video");
                VideoOutcome::Summarized
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to save summary");
                VideoOutcome::Errored
            }
        }
    }

    /// Reuses a stored transcript, or fetches one live when the execution
    /// mode allows it.
    ///
    /// Writes for a video reuse the capture timestamp of its existing record so
    /// every write lands on the same key.
    async fn acquire_transcript(
        &self,
        candidate: &VideoCandidate,
        existing: Option<&PersistedVideoItem>,
    ) -> TranscriptAcquisition {
        let captured_at = existing.map(|e| e.captured_at).unwrap_or_else(Utc::now);
        let record = |text: String| TranscriptRecord {
            video_id: candidate.video_id.clone(),
            channel_id: self.config.channel_id.clone(),
            captured_at,
            text,
        };

        if let Some(cached) = existing.and_then(PersistedVideoItem::transcript_record) {
            tracing::info!("Found existing transcript");
            return TranscriptAcquisition::Cached(record(cached.text));
        }

        if !self.config.execution_mode.allows_live_fetch() {
            tracing::info!("Skipping video: no stored transcript and live fetch is disabled");
            return TranscriptAcquisition::Disallowed;
        }

        tracing::info!("Fetching transcript");
        match self.transcript_fetcher.fetch(&candidate.video_id).await {
            Ok(text) if !text.trim().is_empty() => TranscriptAcquisition::Fetched(record(text)),
            Ok(_) => {
                tracing::info!("No transcript found: empty transcript");
                TranscriptAcquisition::Unavailable
            }
            Err(e) if e.is_not_available() => {
                tracing::info!(reason = %e, "No transcript found");
                TranscriptAcquisition::Unavailable
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to fetch transcript");
                TranscriptAcquisition::Unavailable
            }
        }
    }

    /// Persists a freshly fetched transcript before summarization. Best effort:
    /// a failure is logged and summarization still proceeds.
    async fn checkpoint(&self, candidate: &VideoCandidate, transcript: &TranscriptRecord) {
        let item = PersistedVideoItem::checkpoint(transcript.clone(), candidate.clone());
        match self.store.put(&item).await {
            Ok(()) => tracing::info!("Saved transcript"),
            Err(e) => tracing::error!(error = ?e, "Failed to save transcript"),
        }
    }
}
