use std::time::Duration;

/// Largest page the discovery service returns for a single search.
pub const MAX_PAGE_SIZE: usize = 50;
pub const DEFAULT_MAX_RESULTS: usize = MAX_PAGE_SIZE;
/// Pause after each live transcript fetch.
pub const DEFAULT_FETCH_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_TRANSCRIPT_LANGUAGE: &str = "ja";
pub const DEFAULT_MIN_VIEW_COUNT: u64 = 0;
pub const DEFAULT_MIN_LIKE_COUNT: u64 = 0;

/// Whether a run may scrape transcripts itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Interactive run: live transcript fetches are allowed and rate limited.
    Local,
    /// Scheduled run: only transcripts already in the store are used.
    Unattended,
}

impl ExecutionMode {
    pub fn from_local_flag(local: bool) -> Self {
        if local {
            ExecutionMode::Local
        } else {
            ExecutionMode::Unattended
        }
    }

    pub fn allows_live_fetch(self) -> bool {
        matches!(self, ExecutionMode::Local)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Channel id must not be empty")]
    EmptyChannelId,
    #[error("max_results must be at least 1")]
    ZeroMaxResults,
    #[error("Transcript language must not be empty")]
    EmptyTranscriptLanguage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub channel_id: String,
    pub max_results: usize,
    pub execution_mode: ExecutionMode,
    pub fetch_delay: Duration,
    pub transcript_language: String,
    pub min_view_count: u64,
    pub min_like_count: u64,
}

impl PipelineConfig {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            max_results: DEFAULT_MAX_RESULTS,
            execution_mode: ExecutionMode::Unattended,
            fetch_delay: DEFAULT_FETCH_DELAY,
            transcript_language: DEFAULT_TRANSCRIPT_LANGUAGE.into(),
            min_view_count: DEFAULT_MIN_VIEW_COUNT,
            min_like_count: DEFAULT_MIN_LIKE_COUNT,
        }
    }

    pub fn execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = delay;
        self
    }

    pub fn transcript_language(mut self, language: impl Into<String>) -> Self {
        self.transcript_language = language.into();
        self
    }

    pub fn min_counts(mut self, min_view_count: u64, min_like_count: u64) -> Self {
        self.min_view_count = min_view_count;
        self.min_like_count = min_like_count;
        self
    }

    /// Checks the configuration once at startup. `max_results` beyond the
    /// page cap is clamped rather than rejected.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.channel_id.trim().is_empty() {
            return Err(ConfigError::EmptyChannelId);
        }
        if self.max_results == 0 {
            return Err(ConfigError::ZeroMaxResults);
        }
        if self.transcript_language.trim().is_empty() {
            return Err(ConfigError::EmptyTranscriptLanguage);
        }
        if self.max_results > MAX_PAGE_SIZE {
            tracing::warn!(
                requested = self.max_results,
                cap = MAX_PAGE_SIZE,
                "max_results exceeds page size, clamping"
            );
            self.max_results = MAX_PAGE_SIZE;
        }

        Ok(self)
    }
}
