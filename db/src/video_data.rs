use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder, Row};

/// Number of `views_N` columns, one per day since publish.
pub const DAY_COLUMNS: usize = 30;

const BASE_COLUMNS: &str = "video_id, title, date_published, views, channel";

fn day_column(day: u8) -> Result<String> {
    if (1..=DAY_COLUMNS).contains(&usize::from(day)) {
        Ok(format!("views_{day}"))
    } else {
        Err(eyre!("There is no views column for day {day}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoData {
    pub video_id: String,
    pub title: String,
    pub date_published: NaiveDate,
    pub views: i64,
    pub channel: Option<String>,
    /// `views_1` through `views_30`, index 0 is day 1.
    pub day_views: [Option<i64>; DAY_COLUMNS],
}

impl<'r> FromRow<'r, PgRow> for VideoData {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let mut day_views = [None; DAY_COLUMNS];
        for (i, slot) in day_views.iter_mut().enumerate() {
            *slot = row.try_get(format!("views_{}", i + 1).as_str())?;
        }

        Ok(Self {
            video_id: row.try_get("video_id")?,
            title: row.try_get("title")?,
            date_published: row.try_get("date_published")?,
            views: row.try_get("views")?,
            channel: row.try_get("channel")?,
            day_views,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideoData {
    pub video_id: String,
    pub title: String,
    pub date_published: NaiveDate,
    pub views: i64,
    pub channel: Option<String>,
    /// Day-since-publish slot to fill on insert, if the video is young enough.
    pub day: Option<u8>,
}

impl VideoData {
    /// The recorded view count for `day` (1-based), if that slot is filled.
    pub fn views_on_day(&self, day: u8) -> Option<i64> {
        let index = usize::from(day.checked_sub(1)?);
        self.day_views.get(index).copied().flatten()
    }

    #[tracing::instrument(name = "video_data.find", skip(pool), err)]
    pub async fn find_by_video_id(pool: &PgPool, video_id: &str) -> Result<Option<Self>> {
        let video = sqlx::query_as::<_, Self>("SELECT * FROM video_data WHERE video_id = $1")
            .bind(video_id)
            .fetch_optional(pool)
            .await?;

        Ok(video)
    }

    #[tracing::instrument(name = "video_data.insert", skip_all, fields(video.id = %new.video_id), err)]
    pub async fn insert(pool: &PgPool, new: &NewVideoData) -> Result<()> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO video_data ({BASE_COLUMNS}"));
        if let Some(day) = new.day {
            query.push(", ").push(day_column(day)?);
        }

        query.push(") VALUES (");
        let mut values = query.separated(", ");
        values
            .push_bind(&new.video_id)
            .push_bind(&new.title)
            .push_bind(new.date_published)
            .push_bind(new.views)
            .push_bind(&new.channel);
        if new.day.is_some() {
            values.push_bind(new.views);
        }
        values.push_unseparated(")");

        query.build().execute(pool).await?;

        Ok(())
    }

    /// Refreshes `views` and fills the `day` slot with the same count unless
    /// it already holds a value. Filled day slots are never overwritten.
    #[tracing::instrument(name = "video_data.update_views", skip(pool), err)]
    pub async fn update_views(
        pool: &PgPool,
        video_id: &str,
        views: i64,
        day: Option<u8>,
    ) -> Result<()> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE video_data SET views = ");
        query.push_bind(views);
        if let Some(day) = day {
            let column = day_column(day)?;
            query
                .push(format!(", {column} = COALESCE({column}, "))
                .push_bind(views)
                .push(")");
        }
        query.push(" WHERE video_id = ").push_bind(video_id);

        let result = query.build().execute(pool).await?;
        if result.rows_affected() == 0 {
            return Err(eyre!("No video_data row for {video_id}"));
        }

        Ok(())
    }
}
