use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::{datastore::DataStore, PersistedVideoItem, SummaryRecord, VideoCandidate};

static MIGRATOR: Migrator = sqlx::migrate!();

const SELECT_COLUMNS: &str = r#"
    channel_id, captured_at, video_id, title, channel_title, published_at,
    thumbnail_url, view_count, like_count, transcript, short_summary, detail_summary
"#;

#[derive(Debug, Clone)]
pub struct PgDataStore {
    pub pool: PgPool,
}

impl PgDataStore {
    /// Establish connection to database and create the videos table
    /// if not exists
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to postgres database")?;

        MIGRATOR
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(PgDataStore { pool })
    }
}

/// Raw row shape; every non-key column may be absent when written by older
/// or foreign writers.
#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    channel_id: String,
    captured_at: DateTime<Utc>,
    video_id: String,
    title: Option<String>,
    channel_title: Option<String>,
    published_at: Option<DateTime<Utc>>,
    thumbnail_url: Option<String>,
    view_count: Option<i64>,
    like_count: Option<i64>,
    transcript: Option<String>,
    short_summary: Option<String>,
    detail_summary: Option<String>,
}

impl From<VideoRow> for PersistedVideoItem {
    fn from(row: VideoRow) -> Self {
        // a summary exists only when both halves were written
        let summary = match (row.short_summary, row.detail_summary) {
            (Some(short_summary), Some(detail_summary)) => Some(SummaryRecord {
                short_summary,
                detail_summary,
            }),
            _ => None,
        };

        PersistedVideoItem {
            channel_id: row.channel_id,
            captured_at: row.captured_at,
            video: VideoCandidate {
                video_id: row.video_id,
                title: row.title.unwrap_or_default(),
                channel_title: row.channel_title.unwrap_or_default(),
                published_at: row.published_at.unwrap_or_default(),
                thumbnail_url: row.thumbnail_url,
                view_count: count_from_db(row.view_count),
                like_count: count_from_db(row.like_count),
            },
            transcript: row.transcript,
            summary,
        }
    }
}

fn count_from_db(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or_default()
}

fn count_to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl DataStore for PgDataStore {
    async fn find_by_video_id(&self, video_id: &str) -> anyhow::Result<Option<PersistedVideoItem>> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM videos WHERE video_id = $1 LIMIT 1"
        ))
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, video_id, "Failed to look up video");
        })
        .context("Failed to look up video by id")?;

        Ok(row.map(PersistedVideoItem::from))
    }

    async fn put(&self, item: &PersistedVideoItem) -> anyhow::Result<()> {
        let (short_summary, detail_summary) = match &item.summary {
            Some(s) => (Some(&s.short_summary), Some(&s.detail_summary)),
            None => (None, None),
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open transaction")?;

        // a different video parked on this key is displaced, as in the memory store
        sqlx::query(
            "DELETE FROM videos WHERE channel_id = $1 AND captured_at = $2 AND video_id <> $3",
        )
        .bind(&item.channel_id)
        .bind(item.captured_at)
        .bind(&item.video.video_id)
        .execute(&mut *tx)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = ?err,
                video_id = %item.video.video_id,
                "Failed to clear primary key slot"
            )
        })
        .context("Failed to clear primary key slot")?;

        sqlx::query(
            r#"
            INSERT INTO videos (
                channel_id, captured_at, video_id, title, channel_title, published_at,
                thumbnail_url, view_count, like_count, transcript, short_summary, detail_summary
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (video_id) DO UPDATE SET
                channel_id = EXCLUDED.channel_id,
                captured_at = EXCLUDED.captured_at,
                title = EXCLUDED.title,
                channel_title = EXCLUDED.channel_title,
                published_at = EXCLUDED.published_at,
                thumbnail_url = EXCLUDED.thumbnail_url,
                view_count = EXCLUDED.view_count,
                like_count = EXCLUDED.like_count,
                transcript = EXCLUDED.transcript,
                short_summary = EXCLUDED.short_summary,
                detail_summary = EXCLUDED.detail_summary
            "#,
        )
        .bind(&item.channel_id)
        .bind(item.captured_at)
        .bind(&item.video.video_id)
        .bind(&item.video.title)
        .bind(&item.video.channel_title)
        .bind(item.video.published_at)
        .bind(&item.video.thumbnail_url)
        .bind(count_to_db(item.video.view_count))
        .bind(count_to_db(item.video.like_count))
        .bind(&item.transcript)
        .bind(short_summary)
        .bind(detail_summary)
        .execute(&mut *tx)
        .await
        .inspect_err(|err| {
            tracing::error!(
                error = ?err,
                video_id = %item.video.video_id,
                "Failed to upsert video"
            )
        })
        .context("Failed to upsert video")?;

        tx.commit().await.context("Failed to commit video upsert")?;

        Ok(())
    }

    async fn list_recent(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PersistedVideoItem>> {
        let rows = sqlx::query_as::<_, VideoRow>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM videos
            WHERE channel_id = $1
            ORDER BY published_at DESC NULLS LAST
            LIMIT $2
            "#
        ))
        .bind(channel_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, channel_id, "Failed to list recent videos");
        })
        .context("Failed to list recent videos")?;

        Ok(rows.into_iter().map(PersistedVideoItem::from).collect())
    }
}
