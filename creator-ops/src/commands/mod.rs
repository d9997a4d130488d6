use cja::Result;
use clap::Subcommand;

pub(crate) mod notify_members;
pub(crate) mod video_stats;

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// Track creator videos, updating stats every day at midnight
    TrackVideos,
    /// Run a single video stats pass now and exit
    UpdateVideoStats,
    /// DM the sponsorship form reminder to every roster member not yet reminded
    NotifyMembers,
}

impl Default for Command {
    fn default() -> Self {
        Self::TrackVideos
    }
}

impl Command {
    pub(crate) async fn run(&self) -> Result<()> {
        match &self {
            Command::TrackVideos => video_stats::track_videos().await,
            Command::UpdateVideoStats => video_stats::update_video_stats().await,
            Command::NotifyMembers => notify_members::notify_members().await,
        }
    }
}
