//! # DataStore Module
//!
//! Durable storage for ingested channel videos: the candidate metadata, the
//! captured transcript and the machine-generated summaries.
//!
//! Records are partitioned by channel id and sorted by capture timestamp, with a
//! secondary lookup by video id. Two backends are provided: Postgres (via sqlx)
//! and an in-memory store with the same semantics.

mod datastore;
mod domain;

pub use datastore::memory::MemoryDataStore;
pub use datastore::postgres::PgDataStore;
pub use datastore::DataStore;
pub use domain::{PersistedVideoItem, SummaryRecord, SummaryView, TranscriptRecord, VideoCandidate};
