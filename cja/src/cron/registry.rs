use std::{collections::HashMap, error::Error, future::Future, pin::Pin};

use chrono::{DateTime, Utc};

use crate::{app_state::AppState as AS, jobs::Job};

use super::Daily;

pub struct CronRegistry<AppState: AS> {
    pub(super) jobs: Vec<CronJob<AppState>>,
}

#[async_trait::async_trait]
pub trait CronFn<AppState: AS> {
    // This collapses the error type to a string, the worker only logs it.
    async fn run(&self, app_state: AppState, context: String) -> Result<(), String>;
}

pub struct CronFnClosure<
    AppState: AS,
    FnError: Error + Send + Sync + 'static,
    F: Fn(AppState, String) -> Pin<Box<dyn Future<Output = Result<(), FnError>> + Send>>
        + Send
        + Sync
        + 'static,
> {
    pub(super) func: F,
    _marker: std::marker::PhantomData<AppState>,
}

#[async_trait::async_trait]
impl<
        AppState: AS,
        FnError: Error + Send + Sync + 'static,
        F: Fn(AppState, String) -> Pin<Box<dyn Future<Output = Result<(), FnError>> + Send>>
            + Send
            + Sync
            + 'static,
    > CronFn<AppState> for CronFnClosure<AppState, FnError, F>
{
    async fn run(&self, app_state: AppState, context: String) -> Result<(), String> {
        (self.func)(app_state, context)
            .await
            .map_err(|err| format!("{err}"))
    }
}

pub(super) struct CronJob<AppState: AS> {
    pub(super) name: &'static str,
    func: Box<dyn CronFn<AppState> + Send + Sync + 'static>,
    pub(super) schedule: Daily,
}

#[derive(Debug, thiserror::Error)]
#[error("TickError: {0}")]
pub enum TickError {
    JobError(String),
}

impl<AppState: AS> CronJob<AppState> {
    #[tracing::instrument(
        name = "cron_job.tick",
        skip_all,
        fields(
            cron_job.name = self.name,
            cron_job.next_run = tracing::field::Empty,
        )
    )]
    pub(super) async fn tick(
        &self,
        app_state: AppState,
        next_run_map: &mut HashMap<&'static str, DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), TickError> {
        let next_run = *next_run_map
            .entry(self.name)
            .or_insert_with(|| self.schedule.next_after(now));
        tracing::Span::current().record("cron_job.next_run", tracing::field::display(next_run));

        if now < next_run {
            tracing::trace!(task_name = self.name, "Not due yet");
            return Ok(());
        }

        // Reschedule before running so a failing job waits for tomorrow
        next_run_map.insert(self.name, self.schedule.next_after(now));

        tracing::info!(task_name = self.name, due_at = %next_run, "Running Task");
        let context = format!("Cron@{}", app_state.version());
        (self.func)
            .run(app_state, context)
            .await
            .map_err(TickError::JobError)
    }
}

impl<AppState: AS> CronRegistry<AppState> {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    #[tracing::instrument(name = "cron.register", skip_all, fields(cron_job.name = name, cron_job.schedule = ?schedule))]
    pub fn register<FnError: Error + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
        schedule: Daily,
        job: impl Fn(AppState, String) -> Pin<Box<dyn Future<Output = Result<(), FnError>> + Send>>
            + Send
            + Sync
            + 'static,
    ) {
        let cron_job = CronJob {
            name,
            func: Box::new(CronFnClosure {
                func: job,
                _marker: std::marker::PhantomData,
            }),
            schedule,
        };
        self.jobs.push(cron_job);
    }

    #[tracing::instrument(name = "cron.register_job", skip_all, fields(cron_job.name = J::NAME, cron_job.schedule = ?schedule))]
    pub fn register_job<J: Job<AppState>>(&mut self, job: J, schedule: Daily) {
        self.register(J::NAME, schedule, move |app_state, context| {
            J::run_now(job.clone(), app_state, context)
        });
    }

    /// When each registered job will next fire, as seen from `now`.
    pub fn next_runs(&self, now: DateTime<Utc>) -> Vec<(&'static str, DateTime<Utc>)> {
        self.jobs
            .iter()
            .map(|job| (job.name, job.schedule.next_after(now)))
            .collect()
    }
}

impl<AppState: AS> Default for CronRegistry<AppState> {
    fn default() -> Self {
        Self::new()
    }
}
