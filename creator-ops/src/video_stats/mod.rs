use chrono::NaiveDate;
use cja::Result;
use db::{NewVideoData, VideoData};
use tracing::{info, instrument, warn};

mod bucket;
mod store;
mod video_id;

pub(crate) use bucket::{day_bucket, DayBucket};
pub(crate) use store::PgVideoStore;
pub(crate) use video_id::extract_video_id;

/// A video as the hosting platform reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VideoResource {
    pub title: String,
    pub date_published: NaiveDate,
    pub views: u64,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub date_published: NaiveDate,
    pub views: i64,
    pub channel: Option<String>,
}

#[async_trait::async_trait]
pub(crate) trait VideoPlatform: Send + Sync {
    async fn video(&self, video_id: &str) -> Result<Option<VideoResource>>;

    /// `None` when the channel doesn't exist or has no public handle.
    async fn channel_handle(&self, channel_id: &str) -> Result<Option<String>>;
}

/// What to write to an existing row on this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VideoUpdate {
    pub views: i64,
    pub fill_day: Option<DayBucket>,
}

#[async_trait::async_trait]
pub(crate) trait VideoStore: Send + Sync {
    async fn creator_urls(&self) -> Result<Vec<Option<String>>>;

    async fn find_video(&self, video_id: &str) -> Result<Option<VideoData>>;

    async fn insert_video(&self, video: &NewVideoData) -> Result<()>;

    async fn update_video(&self, video_id: &str, update: VideoUpdate) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UpsertOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PassSummary {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Looks up a video and its channel handle. Any lookup failure is logged and
/// treated as "not available today", the next daily pass tries again.
#[instrument(name = "video_stats.fetch_details", skip(platform))]
pub(crate) async fn fetch_details(
    platform: &impl VideoPlatform,
    video_id: &str,
) -> Option<VideoDetails> {
    let video = match platform.video(video_id).await {
        Ok(Some(video)) => video,
        Ok(None) => {
            info!(video.id = video_id, "Video not found, skipping");
            return None;
        }
        Err(err) => {
            warn!(video.id = video_id, error = ?err, "Video lookup failed, skipping");
            return None;
        }
    };

    let channel = match &video.channel_id {
        Some(channel_id) => match platform.channel_handle(channel_id).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(video.id = video_id, channel.id = %channel_id, error = ?err, "Channel lookup failed, skipping");
                return None;
            }
        },
        None => None,
    };

    Some(VideoDetails {
        video_id: video_id.to_string(),
        title: video.title,
        date_published: video.date_published,
        views: i64::try_from(video.views).unwrap_or(i64::MAX),
        channel,
    })
}

/// Always refreshes `views`, and fills today's day slot only if it is empty.
pub(crate) fn plan_update(existing: &VideoData, views: i64, today: NaiveDate) -> VideoUpdate {
    let fill_day = day_bucket(existing.date_published, today)
        .filter(|day| existing.views_on_day(day.get()).is_none());

    VideoUpdate { views, fill_day }
}

#[instrument(name = "video_stats.upsert", skip_all, fields(video.id = %details.video_id), err)]
pub(crate) async fn upsert(
    store: &impl VideoStore,
    existing: Option<&VideoData>,
    details: VideoDetails,
    today: NaiveDate,
) -> Result<UpsertOutcome> {
    if let Some(existing) = existing {
        let update = plan_update(existing, details.views, today);
        store.update_video(&details.video_id, update).await?;

        return Ok(UpsertOutcome::Updated);
    }

    let day = day_bucket(details.date_published, today).map(DayBucket::get);
    store
        .insert_video(&NewVideoData {
            video_id: details.video_id,
            title: details.title,
            date_published: details.date_published,
            views: details.views,
            channel: details.channel,
            day,
        })
        .await?;

    Ok(UpsertOutcome::Inserted)
}

async fn refresh_video(
    store: &impl VideoStore,
    platform: &impl VideoPlatform,
    video_id: &str,
    today: NaiveDate,
) -> Result<Option<UpsertOutcome>> {
    let existing = store.find_video(video_id).await?;

    let Some(details) = fetch_details(platform, video_id).await else {
        return Ok(None);
    };

    upsert(store, existing.as_ref(), details, today)
        .await
        .map(Some)
}

/// One pass over every creator's video. A single creator failing never stops
/// the rest of the pass.
#[instrument(name = "video_stats.update_all", skip(store, platform), err)]
pub(crate) async fn update_video_data(
    store: &impl VideoStore,
    platform: &impl VideoPlatform,
    today: NaiveDate,
) -> Result<PassSummary> {
    let urls = store.creator_urls().await?;
    let mut summary = PassSummary::default();

    for url in urls {
        let Some(video_id) = url.as_deref().and_then(extract_video_id) else {
            summary.skipped += 1;
            continue;
        };

        match refresh_video(store, platform, video_id, today).await {
            Ok(Some(UpsertOutcome::Inserted)) => summary.inserted += 1,
            Ok(Some(UpsertOutcome::Updated)) => summary.updated += 1,
            Ok(None) => summary.skipped += 1,
            Err(err) => {
                warn!(video.id = video_id, error = ?err, "Couldn't update video, moving on");
                summary.failed += 1;
            }
        }
    }

    info!(
        inserted = summary.inserted,
        updated = summary.updated,
        skipped = summary.skipped,
        failed = summary.failed,
        "Video stats pass complete"
    );

    Ok(summary)
}


#[cfg(test)]
mod tests {
    use super::{fakes::*, *};

    const URL: &str = "https://youtu.be/abc123def45";
    const VIDEO: &str = "abc123def45";

    #[tokio::test]
    async fn test_unseen_video_is_inserted_with_todays_bucket() {
        let store = MemoryStore::with_urls(&[Some(URL)]);
        let platform = FakePlatform::default().with_video(VIDEO, 500, days_ago(6));

        let summary = update_video_data(&store, &platform, today()).await.unwrap();

        assert_eq!(summary.inserted, 1);
        let row = store.row(VIDEO).unwrap();
        assert_eq!(row.views, 500);
        assert_eq!(row.views_on_day(6), Some(500));
        assert_eq!(row.day_views.iter().filter(|v| v.is_some()).count(), 1);
        assert_eq!(row.channel.as_deref(), Some("@hotslicer"));
        assert_eq!(row.title, "Video abc123def45");
    }

    #[tokio::test]
    async fn test_filled_bucket_is_never_overwritten() {
        let store = MemoryStore::with_urls(&[Some(URL)]);
        update_video_data(
            &store,
            &FakePlatform::default().with_video(VIDEO, 500, days_ago(6)),
            today(),
        )
        .await
        .unwrap();

        let summary = update_video_data(
            &store,
            &FakePlatform::default().with_video(VIDEO, 800, days_ago(6)),
            today(),
        )
        .await
        .unwrap();

        assert_eq!(summary.updated, 1);
        let row = store.row(VIDEO).unwrap();
        assert_eq!(row.views, 800);
        assert_eq!(row.views_on_day(6), Some(500));
    }

    #[tokio::test]
    async fn test_series_grows_one_day_at_a_time() {
        let store = MemoryStore::with_urls(&[Some(URL)]);
        let published = days_ago(1);
        let tomorrow = today().succ_opt().unwrap();

        update_video_data(
            &store,
            &FakePlatform::default().with_video(VIDEO, 100, published),
            today(),
        )
        .await
        .unwrap();
        update_video_data(
            &store,
            &FakePlatform::default().with_video(VIDEO, 250, published),
            tomorrow,
        )
        .await
        .unwrap();

        let row = store.row(VIDEO).unwrap();
        assert_eq!(row.views_on_day(1), Some(100));
        assert_eq!(row.views_on_day(2), Some(250));
        assert_eq!(row.views, 250);
    }

    #[tokio::test]
    async fn test_publish_day_and_old_videos_only_touch_views() {
        let store = MemoryStore::with_urls(&[
            Some("https://youtu.be/newnewnew00"),
            Some("https://youtu.be/oldoldold00"),
        ]);
        let platform = FakePlatform::default()
            .with_video("newnewnew00", 10, today())
            .with_video("oldoldold00", 9000, days_ago(31));

        update_video_data(&store, &platform, today()).await.unwrap();

        for id in ["newnewnew00", "oldoldold00"] {
            let row = store.row(id).unwrap();
            assert!(row.day_views.iter().all(Option::is_none), "{id}");
        }
    }

    #[tokio::test]
    async fn test_unparsable_urls_are_skipped_without_lookups() {
        let store = MemoryStore::with_urls(&[
            None,
            Some(""),
            Some("https://www.twitch.tv/hotslicer"),
        ]);
        let platform = FakePlatform::default();

        let summary = update_video_data(&store, &platform, today()).await.unwrap();

        assert_eq!(summary.skipped, 3);
        assert!(platform.lookups.lock().unwrap().is_empty());
        assert!(store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_video_is_skipped() {
        let store = MemoryStore::with_urls(&[Some(URL)]);

        let summary = update_video_data(&store, &FakePlatform::default(), today())
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(store.row(VIDEO).is_none());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_pass() {
        let mut store = MemoryStore::with_urls(&[
            Some("https://youtu.be/broken00000"),
            Some("https://youtu.be/dbfails0000"),
            Some(URL),
        ]);
        store.fail_updates_for = Some("dbfails0000".to_string());
        store.put(VideoData {
            video_id: "dbfails0000".to_string(),
            title: "Existing".to_string(),
            date_published: days_ago(3),
            views: 1,
            channel: None,
            day_views: [None; db::DAY_COLUMNS],
        });
        let mut platform = FakePlatform::default()
            .with_video("dbfails0000", 2, days_ago(3))
            .with_video(VIDEO, 500, days_ago(6));
        platform.broken_videos.push("broken00000".to_string());

        let summary = update_video_data(&store, &platform, today()).await.unwrap();

        assert_eq!(
            summary,
            PassSummary {
                inserted: 1,
                updated: 0,
                skipped: 1,
                failed: 1,
            }
        );
        assert!(store.row(VIDEO).is_some());
    }

    #[test]
    fn test_plan_update_skips_filled_slot() {
        let mut row = VideoData {
            video_id: VIDEO.to_string(),
            title: "t".to_string(),
            date_published: days_ago(6),
            views: 500,
            channel: None,
            day_views: [None; db::DAY_COLUMNS],
        };

        assert_eq!(
            plan_update(&row, 800, today()).fill_day.map(DayBucket::get),
            Some(6)
        );

        row.day_views[5] = Some(500);
        assert_eq!(
            plan_update(&row, 800, today()),
            VideoUpdate {
                views: 800,
                fill_day: None
            }
        );
    }
}
