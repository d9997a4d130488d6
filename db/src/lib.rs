use color_eyre::{
    eyre::{bail, WrapErr},
    Result,
};
use sqlx::postgres::PgPoolOptions;

pub mod creator_instances;
pub mod video_data;

pub use sqlx;
pub use sqlx::PgPool;

pub use video_data::{NewVideoData, VideoData, DAY_COLUMNS};

#[tracing::instrument(skip_all, err)]
pub async fn setup_db_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .wrap_err("Couldn't connect to the database")?;

    const MIGRATION_LOCK_ID: i64 = 0xDB_DB_DB_DB_DB_DB_DB;
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(&pool)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    let unlock_result: Option<bool> = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .fetch_one(&pool)
        .await?;

    match unlock_result {
        Some(true) => tracing::info!("Migration lock unlocked"),
        Some(false) => tracing::info!("Failed to unlock migration lock"),
        None => bail!("Failed to unlock migration lock"),
    }

    Ok(pool)
}
