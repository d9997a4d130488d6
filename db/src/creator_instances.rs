use color_eyre::Result;
use sqlx::PgPool;

/// Every creator's `live_url`, including the ones that haven't set one yet.
pub async fn live_urls(pool: &PgPool) -> Result<Vec<Option<String>>> {
    let urls = sqlx::query_scalar::<_, Option<String>>(
        "SELECT live_url FROM creator_instances ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(urls)
}
