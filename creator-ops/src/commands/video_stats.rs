use chrono::Utc;
use cja::jobs::Job;
use cja::Result;

use crate::{
    config::VideoStatsConfig, cron::run_cron, jobs::update_video_stats::UpdateVideoStats,
    state::AppState,
};

pub(crate) async fn track_videos() -> Result<()> {
    let config = VideoStatsConfig::from_env()?;
    let app_state = AppState::from_config(&config).await?;

    tracing::info!(
        timezone = %config.timezone,
        next_run = %app_state.schedule.next_after(Utc::now()),
        "Scheduler started, updating video stats daily at midnight"
    );
    run_cron(app_state).await;

    Ok(())
}

pub(crate) async fn update_video_stats() -> Result<()> {
    let config = VideoStatsConfig::from_env()?;
    let app_state = AppState::from_config(&config).await?;

    UpdateVideoStats
        .run_now(app_state, "Cli".to_string())
        .await?;

    Ok(())
}
