use cja::Result;
use db::{creator_instances, NewVideoData, PgPool, VideoData};

use super::{VideoStore, VideoUpdate};

/// `video_data` and `creator_instances` in Postgres
#[derive(Debug, Clone)]
pub(crate) struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VideoStore for PgVideoStore {
    async fn creator_urls(&self) -> Result<Vec<Option<String>>> {
        creator_instances::live_urls(&self.pool).await
    }

    async fn find_video(&self, video_id: &str) -> Result<Option<VideoData>> {
        VideoData::find_by_video_id(&self.pool, video_id).await
    }

    async fn insert_video(&self, video: &NewVideoData) -> Result<()> {
        VideoData::insert(&self.pool, video).await
    }

    async fn update_video(&self, video_id: &str, update: VideoUpdate) -> Result<()> {
        VideoData::update_views(
            &self.pool,
            video_id,
            update.views,
            update.fill_day.map(super::DayBucket::get),
        )
        .await
    }
}
