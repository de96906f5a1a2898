//! In-memory datastore.
//!
//! Mirrors the Postgres layout: a primary table keyed by
//! `(channel_id, captured_at)` plus a unique secondary index on video id.
//! Useful for tests and dry runs.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::{datastore::DataStore, PersistedVideoItem};

type PrimaryKey = (String, DateTime<Utc>);

#[derive(Debug, Default)]
struct Tables {
    items: BTreeMap<PrimaryKey, PersistedVideoItem>,
    video_index: HashMap<String, PrimaryKey>,
}

/// Cloning yields a handle onto the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.read().map(|t| t.items.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("memory datastore lock poisoned")
}

impl DataStore for MemoryDataStore {
    async fn find_by_video_id(&self, video_id: &str) -> anyhow::Result<Option<PersistedVideoItem>> {
        let tables = self.tables.read().map_err(poisoned)?;

        Ok(tables
            .video_index
            .get(video_id)
            .and_then(|key| tables.items.get(key))
            .cloned())
    }

    async fn put(&self, item: &PersistedVideoItem) -> anyhow::Result<()> {
        let mut guard = self.tables.write().map_err(poisoned)?;
        let tables = &mut *guard;
        let key = (item.channel_id.clone(), item.captured_at);

        // drop the previous slot so the video id keeps resolving to one record
        if let Some(previous) = tables.video_index.get(&item.video.video_id).cloned() {
            if previous != key {
                tables.items.remove(&previous);
            }
        }

        // a different video occupying this exact slot loses its index entry
        if let Some(displaced) = tables.items.get(&key) {
            if displaced.video.video_id != item.video.video_id {
                tables.video_index.remove(&displaced.video.video_id);
            }
        }

        tables
            .video_index
            .insert(item.video.video_id.clone(), key.clone());
        tables.items.insert(key, item.clone());

        tracing::debug!(video_id = %item.video.video_id, "Stored video in memory");
        Ok(())
    }

    async fn list_recent(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PersistedVideoItem>> {
        let tables = self.tables.read().map_err(poisoned)?;

        Ok(tables
            .items
            .values()
            .filter(|item| item.channel_id == channel_id)
            .sorted_by(|a, b| b.video.published_at.cmp(&a.video.published_at))
            .take(limit)
            .cloned()
            .collect())
    }
}
