use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize};

use crate::video_stats::{VideoPlatform, VideoResource};

pub(crate) const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

#[derive(Debug, thiserror::Error)]
pub(crate) enum YouTubeError {
    #[error("Request to YouTube {resource} failed")]
    Request {
        resource: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("YouTube {resource} returned {status}: {body}")]
    Status {
        resource: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("YouTube returned a viewCount that isn't a number: {0:?}")]
    InvalidViewCount(String),
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Video {
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    published_at: DateTime<Utc>,
    channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
    custom_url: Option<String>,
}

/// Turns a channel's `customUrl` into an `@handle`.
fn normalize_handle(custom_url: Option<String>) -> Option<String> {
    let custom_url = custom_url?;
    let custom_url = custom_url.trim();

    if custom_url.is_empty() {
        None
    } else if custom_url.starts_with('@') {
        Some(custom_url.to_string())
    } else {
        Some(format!("@{custom_url}"))
    }
}

/// Client for the YouTube Data API, authenticated with an API key
#[derive(Clone)]
pub(crate) struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        resource: &'static str,
        part: &str,
        id: &str,
    ) -> Result<Vec<T>, YouTubeError> {
        let url = format!("{}/{resource}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("part", part), ("id", id), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| YouTubeError::Request { resource, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YouTubeError::Status {
                resource,
                status,
                body,
            });
        }

        let body: ListResponse<T> = response
            .json()
            .await
            .map_err(|source| YouTubeError::Request { resource, source })?;

        Ok(body.items)
    }
}

#[async_trait::async_trait]
impl VideoPlatform for YouTubeClient {
    #[tracing::instrument(name = "youtube.video", skip(self), err)]
    async fn video(&self, video_id: &str) -> cja::Result<Option<VideoResource>> {
        let Some(video) = self
            .list::<Video>("videos", "snippet,statistics", video_id)
            .await?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let views = match video.statistics.view_count {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| YouTubeError::InvalidViewCount(raw))?,
            None => 0,
        };

        Ok(Some(VideoResource {
            title: video.snippet.title,
            date_published: video.snippet.published_at.date_naive(),
            views,
            channel_id: video.snippet.channel_id,
        }))
    }

    #[tracing::instrument(name = "youtube.channel_handle", skip(self), err)]
    async fn channel_handle(&self, channel_id: &str) -> cja::Result<Option<String>> {
        let channel = self
            .list::<Channel>("channels", "snippet", channel_id)
            .await?
            .into_iter()
            .next();

        Ok(channel.and_then(|channel| normalize_handle(channel.snippet.custom_url)))
    }
}
