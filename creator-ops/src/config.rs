use std::{num::NonZeroU64, path::PathBuf, str::FromStr};

use chrono_tz::Tz;

use crate::youtube::YOUTUBE_API_BASE;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum ConfigError {
    #[error("Missing {0}, needed for this command")]
    Missing(&'static str),
    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|err| ConfigError::Invalid {
                name,
                reason: err.to_string(),
            })
        })
        .transpose()
}

fn from_process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Clone)]
pub(crate) struct NotifierConfig {
    pub discord_token: String,
    pub guild_id: NonZeroU64,
    pub roster_path: PathBuf,
    pub sent_path: PathBuf,
    pub message_path: Option<PathBuf>,
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("guild_id", &self.guild_id)
            .field("roster_path", &self.roster_path)
            .field("sent_path", &self.sent_path)
            .field("message_path", &self.message_path)
            .finish_non_exhaustive()
    }
}

impl NotifierConfig {
    #[tracing::instrument(name = "NotifierConfig::from_env", err)]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(from_process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let discord_token = required(&lookup, "DISCORD_TOKEN")?;
        let guild_id = parsed::<NonZeroU64>(&lookup, "NOTIFY_GUILD_ID")?
            .ok_or(ConfigError::Missing("NOTIFY_GUILD_ID"))?;

        Ok(Self {
            discord_token,
            guild_id,
            roster_path: lookup("NOTIFY_ROSTER_PATH")
                .map_or_else(|| PathBuf::from("roster.txt"), PathBuf::from),
            sent_path: lookup("NOTIFY_SENT_PATH")
                .map_or_else(|| PathBuf::from("sent.json"), PathBuf::from),
            message_path: lookup("NOTIFY_MESSAGE_PATH").map(PathBuf::from),
        })
    }
}

#[derive(Clone)]
pub(crate) struct VideoStatsConfig {
    pub database_url: String,
    pub youtube_api_key: String,
    pub youtube_api_base: String,
    /// Both the daily trigger and "today" for day buckets use this zone.
    pub timezone: Tz,
}

impl std::fmt::Debug for VideoStatsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoStatsConfig")
            .field("youtube_api_base", &self.youtube_api_base)
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

impl VideoStatsConfig {
    #[tracing::instrument(name = "VideoStatsConfig::from_env", err)]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(from_process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            youtube_api_key: required(&lookup, "YOUTUBE_API_KEY")?,
            youtube_api_base: lookup("YOUTUBE_API_BASE")
                .map_or_else(|| YOUTUBE_API_BASE.to_string(), |base| {
                    base.trim_end_matches('/').to_string()
                }),
            timezone: parsed::<Tz>(&lookup, "VIDEO_STATS_TIMEZONE")?.unwrap_or(Tz::UTC),
        })
    }
}
