use cja::cron::{CronRegistry, Daily, Worker};

use crate::{jobs::update_video_stats::UpdateVideoStats, state::AppState};

fn cron_registry(schedule: Daily) -> CronRegistry<AppState> {
    let mut registry = CronRegistry::new();

    registry.register_job(UpdateVideoStats, schedule);

    registry
}

pub(crate) async fn run_cron(app_state: AppState) {
    let registry = cron_registry(app_state.schedule);

    Worker::new(app_state, registry).run().await;
}
