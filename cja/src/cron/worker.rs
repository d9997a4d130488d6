use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, Utc};

use crate::app_state::AppState as AS;

use super::registry::CronRegistry;

const POLL_INTERVAL: Duration = Duration::from_secs(30);

pub struct Worker<AppState: AS> {
    state: AppState,
    registry: CronRegistry<AppState>,
}

impl<AppState: AS> Worker<AppState> {
    pub fn new(state: AppState, registry: CronRegistry<AppState>) -> Self {
        Self { state, registry }
    }

    /// Polls the clock forever. Schedules are computed fresh on every start,
    /// nothing about past runs is persisted.
    pub async fn run(self) {
        let worker_id = uuid::Uuid::new_v4();
        let mut next_run_map: HashMap<&'static str, DateTime<Utc>> = HashMap::new();

        for (name, next_run) in self.registry.next_runs(Utc::now()) {
            tracing::info!(task_name = name, next_run = %next_run, "Scheduled");
        }

        tracing::debug!("Starting cron loop");
        loop {
            self.tick(&worker_id, &mut next_run_map, Utc::now()).await;

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    #[tracing::instrument(name = "cron.tick", skip_all, fields(cron_worker.id = %worker_id))]
    pub(crate) async fn tick(
        &self,
        worker_id: &uuid::Uuid,
        next_run_map: &mut HashMap<&'static str, DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        for job in &self.registry.jobs {
            if let Err(err) = job.tick(self.state.clone(), next_run_map, now).await {
                tracing::error!(task_name = job.name, error = %err, "Cron job failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use chrono_tz::UTC;

    use super::*;
    use crate::{cron::Daily, jobs::Job};

    #[derive(Clone, Default)]
    struct TestState {
        runs: Arc<AtomicUsize>,
    }

    impl AS for TestState {
        fn version(&self) -> &str {
            "test"
        }
    }

    #[derive(Debug, Clone)]
    struct CountRuns {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Job<TestState> for CountRuns {
        const NAME: &'static str = "CountRuns";

        async fn run(&self, app_state: TestState) -> crate::Result<()> {
            app_state.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(color_eyre::eyre::eyre!("boom"));
            }
            Ok(())
        }
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn worker(fail: bool) -> (Worker<TestState>, TestState) {
        let state = TestState::default();
        let mut registry = CronRegistry::new();
        registry.register_job(CountRuns { fail }, Daily::midnight(UTC));

        (Worker::new(state.clone(), registry), state)
    }

    #[tokio::test]
    async fn test_does_not_run_on_startup() {
        let (worker, state) = worker(false);
        let id = uuid::Uuid::new_v4();
        let mut next_runs = HashMap::new();

        worker
            .tick(&id, &mut next_runs, utc("2024-05-01T12:00:00Z"))
            .await;
        worker
            .tick(&id, &mut next_runs, utc("2024-05-01T23:59:30Z"))
            .await;

        assert_eq!(state.runs.load(Ordering::SeqCst), 0);
        assert_eq!(next_runs["CountRuns"], utc("2024-05-02T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_runs_once_per_day() {
        let (worker, state) = worker(false);
        let id = uuid::Uuid::new_v4();
        let mut next_runs = HashMap::new();

        worker
            .tick(&id, &mut next_runs, utc("2024-05-01T12:00:00Z"))
            .await;
        worker
            .tick(&id, &mut next_runs, utc("2024-05-02T00:00:10Z"))
            .await;
        worker
            .tick(&id, &mut next_runs, utc("2024-05-02T00:00:40Z"))
            .await;

        assert_eq!(state.runs.load(Ordering::SeqCst), 1);
        assert_eq!(next_runs["CountRuns"], utc("2024-05-03T00:00:00Z"));

        worker
            .tick(&id, &mut next_runs, utc("2024-05-03T00:00:05Z"))
            .await;

        assert_eq!(state.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_job_is_not_retried_until_tomorrow() {
        let (worker, state) = worker(true);
        let id = uuid::Uuid::new_v4();
        let mut next_runs = HashMap::new();

        worker
            .tick(&id, &mut next_runs, utc("2024-05-01T12:00:00Z"))
            .await;
        worker
            .tick(&id, &mut next_runs, utc("2024-05-02T00:00:10Z"))
            .await;
        worker
            .tick(&id, &mut next_runs, utc("2024-05-02T00:00:40Z"))
            .await;

        assert_eq!(state.runs.load(Ordering::SeqCst), 1);
        assert_eq!(next_runs["CountRuns"], utc("2024-05-03T00:00:00Z"));
    }
}
