use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use digest_datastore::VideoCandidate;
use digest_pulse::{VideoSource, VideoStats};

#[derive(Clone)]
pub struct MockVideoSource {
    pub videos: Vec<VideoCandidate>,
    pub stats: HashMap<String, VideoStats>,
    pub discover_calls: Arc<Mutex<Vec<(String, usize)>>>,
    pub enrich_calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub fail_discovery: bool,
    pub fail_enrichment: bool,
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

impl MockVideoSource {
    /// Videos newest first, each with 1000 views and 100 likes.
    pub fn with_videos(ids: &[&str]) -> Self {
        let videos = ids
            .iter()
            .enumerate()
            .map(|(i, id)| VideoCandidate {
                video_id: id.to_string(),
                title: format!("Title {id}"),
                channel_title: "Mock Channel".into(),
                published_at: base_time() - Duration::hours(i as i64),
                thumbnail_url: None,
                view_count: 0,
                like_count: 0,
            })
            .collect::<Vec<_>>();
        let stats = ids
            .iter()
            .map(|id| {
                (
                    id.to_string(),
                    VideoStats {
                        view_count: 1000,
                        like_count: 100,
                        thumbnail_url: Some(format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg")),
                    },
                )
            })
            .collect();

        Self {
            videos,
            stats,
            discover_calls: Arc::new(Mutex::new(Vec::new())),
            enrich_calls: Arc::new(Mutex::new(Vec::new())),
            fail_discovery: false,
            fail_enrichment: false,
        }
    }

    pub fn failing_discovery() -> Self {
        Self {
            fail_discovery: true,
            ..Self::with_videos(&[])
        }
    }

    pub fn failing_enrichment(ids: &[&str]) -> Self {
        Self {
            fail_enrichment: true,
            ..Self::with_videos(ids)
        }
    }

    pub fn with_counts(mut self, video_id: &str, view_count: u64, like_count: u64) -> Self {
        if let Some(stats) = self.stats.get_mut(video_id) {
            stats.view_count = view_count;
            stats.like_count = like_count;
        }
        self
    }

    pub fn without_stats(mut self, video_id: &str) -> Self {
        self.stats.remove(video_id);
        self
    }
}

impl VideoSource for MockVideoSource {
    type Error = anyhow::Error;

    async fn discover(
        &self,
        channel_id: &str,
        max_results: usize,
    ) -> Result<Vec<VideoCandidate>, Self::Error> {
        self.discover_calls
            .lock()
            .unwrap()
            .push((channel_id.to_string(), max_results));
        if self.fail_discovery {
            return Err(anyhow::anyhow!("quota exceeded"));
        }
        Ok(self.videos.iter().take(max_results).cloned().collect())
    }

    async fn enrich(&self, video_ids: &[String]) -> Result<HashMap<String, VideoStats>, Self::Error> {
        self.enrich_calls.lock().unwrap().push(video_ids.to_vec());
        if self.fail_enrichment {
            return Err(anyhow::anyhow!("videos endpoint unavailable"));
        }
        Ok(video_ids
            .iter()
            .filter_map(|id| self.stats.get(id).map(|s| (id.clone(), s.clone())))
            .collect())
    }
}
