use cja::cron::Daily;
use db::setup_db_pool;
use tracing::instrument;

use crate::{config::VideoStatsConfig, video_stats::PgVideoStore, youtube::YouTubeClient};

#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: &'static str,
}

impl VersionInfo {
    fn from_env() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Everything the video stats job needs, built once at startup.
#[derive(Clone)]
pub(crate) struct AppState {
    pub store: PgVideoStore,
    pub youtube: YouTubeClient,
    pub schedule: Daily,
    pub versions: VersionInfo,
}

impl AppState {
    #[instrument(name = "AppState::from_config", skip_all, err)]
    pub async fn from_config(config: &VideoStatsConfig) -> cja::Result<Self> {
        let pool = setup_db_pool(&config.database_url).await?;

        Ok(Self {
            store: PgVideoStore::new(pool),
            youtube: YouTubeClient::new(&config.youtube_api_key, &config.youtube_api_base),
            schedule: Daily::midnight(config.timezone),
            versions: VersionInfo::from_env(),
        })
    }
}

impl cja::app_state::AppState for AppState {
    fn version(&self) -> &str {
        self.versions.version
    }
}
