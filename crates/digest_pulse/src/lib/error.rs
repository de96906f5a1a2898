use crate::types::BatchStats;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    ParseError(&'static str),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures that end a run. Per-video failures never surface here; they are
/// folded into [`BatchStats`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to discover videos for channel {channel_id}: {reason}")]
    Discovery { channel_id: String, reason: String },
    #[error("Failed to fetch video details: {reason}")]
    Enrichment { reason: String },
    #[error("Run cancelled after {} videos", .stats.videos_processed())]
    Cancelled { stats: BatchStats },
}

impl PipelineError {
    /// Counters accumulated before the run stopped, if any were.
    pub fn partial_stats(&self) -> Option<&BatchStats> {
        match self {
            PipelineError::Cancelled { stats } => Some(stats),
            _ => None,
        }
    }
}
