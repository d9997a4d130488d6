use chrono::Utc;
use cja::jobs::Job;

use crate::{state::AppState, video_stats::update_video_data};

#[derive(Debug, Clone)]
pub struct UpdateVideoStats;

#[async_trait::async_trait]
impl Job<AppState> for UpdateVideoStats {
    const NAME: &'static str = "UpdateVideoStats";

    async fn run(&self, app_state: AppState) -> cja::Result<()> {
        let today = app_state.schedule.today(Utc::now());

        update_video_data(&app_state.store, &app_state.youtube, today).await?;

        Ok(())
    }
}
