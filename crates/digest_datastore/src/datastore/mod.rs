use std::future::Future;

use crate::PersistedVideoItem;

pub mod memory;
pub mod postgres;

/// Idempotency lookups and persistence of per-video records.
///
/// A store is assumed to have a single writer per channel per run; no
/// optimistic concurrency is applied to `put`.
pub trait DataStore {
    /// Resolves a video by id through the secondary index, without knowing its
    /// primary key. At most one record is returned.
    fn find_by_video_id(
        &self,
        video_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<PersistedVideoItem>>> + Send;

    /// Upserts `item` under `(item.channel_id, item.captured_at)`, replacing any
    /// other record held for the same video id.
    fn put(&self, item: &PersistedVideoItem) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Most recently published records of a channel, newest first.
    fn list_recent(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<PersistedVideoItem>>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn find_by_video_id(&self, video_id: &str) -> anyhow::Result<Option<PersistedVideoItem>> {
        (**self).find_by_video_id(video_id).await
    }

    async fn put(&self, item: &PersistedVideoItem) -> anyhow::Result<()> {
        (**self).put(item).await
    }

    async fn list_recent(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PersistedVideoItem>> {
        (**self).list_recent(channel_id, limit).await
    }
}
