use std::sync::{Arc, Mutex};

use digest_datastore::{DataStore, MemoryDataStore, PersistedVideoItem};

fn is_checkpoint(item: &PersistedVideoItem) -> bool {
    item.summary.is_none()
}

fn is_summarized(item: &PersistedVideoItem) -> bool {
    item.summary.is_some()
}

/// Memory-backed store that records every write and can be told to fail.
#[derive(Clone, Default)]
pub struct MockDataStore {
    pub inner: MemoryDataStore,
    pub puts: Arc<Mutex<Vec<PersistedVideoItem>>>,
    pub lookups: Arc<Mutex<Vec<String>>>,
    pub fail_lookups: bool,
    pub fail_put_when: Option<fn(&PersistedVideoItem) -> bool>,
}

impl MockDataStore {
    pub fn failing_lookups() -> Self {
        Self {
            fail_lookups: true,
            ..Default::default()
        }
    }

    /// Rejects the transcript-only checkpoint write.
    pub fn failing_checkpoints() -> Self {
        Self {
            fail_put_when: Some(is_checkpoint),
            ..Default::default()
        }
    }

    /// Rejects the final write carrying the summary.
    pub fn failing_summaries() -> Self {
        Self {
            fail_put_when: Some(is_summarized),
            ..Default::default()
        }
    }

    pub async fn seed(&self, item: PersistedVideoItem) {
        self.inner.put(&item).await.unwrap();
    }

    pub async fn get(&self, video_id: &str) -> Option<PersistedVideoItem> {
        self.inner.find_by_video_id(video_id).await.unwrap()
    }
}

impl DataStore for MockDataStore {
    async fn find_by_video_id(&self, video_id: &str) -> anyhow::Result<Option<PersistedVideoItem>> {
        self.lookups.lock().unwrap().push(video_id.to_string());
        if self.fail_lookups {
            return Err(anyhow::anyhow!("lookup unavailable"));
        }
        self.inner.find_by_video_id(video_id).await
    }

    async fn put(&self, item: &PersistedVideoItem) -> anyhow::Result<()> {
        self.puts.lock().unwrap().push(item.clone());
        if self.fail_put_when.is_some_and(|fail| fail(item)) {
            return Err(anyhow::anyhow!("write rejected"));
        }
        self.inner.put(item).await
    }

    async fn list_recent(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PersistedVideoItem>> {
        self.inner.list_recent(channel_id, limit).await
    }
}
