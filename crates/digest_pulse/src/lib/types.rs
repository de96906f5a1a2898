use serde::{Deserialize, Serialize};

/// Terminal state of a single candidate within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoOutcome {
    SkippedProcessed,
    SkippedNoTranscript,
    Summarized,
    Errored,
}

/// Outcome counters of one run. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub videos_found: usize,
    pub videos_filtered: usize,
    pub videos_without_transcript: usize,
    pub videos_already_processed: usize,
    pub videos_summarized: usize,
    pub errors: usize,
}

impl BatchStats {
    pub fn record(&mut self, outcome: VideoOutcome) {
        match outcome {
            VideoOutcome::SkippedProcessed => self.videos_already_processed += 1,
            VideoOutcome::SkippedNoTranscript => self.videos_without_transcript += 1,
            VideoOutcome::Summarized => self.videos_summarized += 1,
            VideoOutcome::Errored => self.errors += 1,
        }
    }

    /// Candidates that reached a terminal state, filtered ones excluded.
    pub fn videos_processed(&self) -> usize {
        self.videos_already_processed
            + self.videos_without_transcript
            + self.videos_summarized
            + self.errors
    }
}
