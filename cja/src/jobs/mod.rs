use crate::app_state::AppState as AS;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
#[error("JobError({0}): {1:?}")]
pub struct JobError(pub &'static str, pub color_eyre::Report);

#[async_trait::async_trait]
pub trait Job<AppState: AS>: Send + Sync + std::fmt::Debug + Clone + 'static {
    const NAME: &'static str;

    async fn run(&self, app_state: AppState) -> color_eyre::Result<()>;

    /// Runs the job inline on the current task, tagging the span with where
    /// the run was triggered from.
    #[instrument(name = "jobs.run_now", skip(self, app_state), fields(job.name = Self::NAME), err)]
    async fn run_now(self, app_state: AppState, context: String) -> Result<(), JobError> {
        tracing::info!("Running job");

        self.run(app_state)
            .await
            .map_err(|err| JobError(Self::NAME, err))
    }
}
