pub mod config;
mod error;
mod llm;
pub mod parser;
mod processor;
pub mod secrets;
pub mod tracing;
pub mod types;
pub mod yt;

pub use config::{ExecutionMode, PipelineConfig};
pub use error::{Error, PipelineError};
pub use llm::anthropic;
pub use llm::summarizer::{
    build_prompt, parse_summary_response, truncate_transcript, SummarizeError, Summarizer,
    MAX_TRANSCRIPT_CHARS,
};
pub use processor::{builder::IngestionPipelineBuilder, IngestionPipeline};
pub use types::{BatchStats, VideoOutcome};
pub use yt::{TranscriptError, TranscriptFetcher, VideoSource, VideoStats};
