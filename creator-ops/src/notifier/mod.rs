use std::{collections::BTreeSet, num::NonZeroU64};

use cja::Result;
use tracing::{error, info, instrument, warn};

mod notified_set;
mod roster;

pub(crate) use notified_set::NotifiedSet;
pub(crate) use roster::{MessageTemplate, Roster};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GuildMember {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SendError {
    #[error("Recipient doesn't accept direct messages from us")]
    Blocked,
    #[error("Couldn't deliver direct message: {0}")]
    Transport(String),
}

#[async_trait::async_trait]
pub(crate) trait MessagingPlatform: Send + Sync {
    /// Every member of the guild, across all pages.
    async fn guild_members(&self, guild_id: NonZeroU64) -> Result<Vec<GuildMember>>;

    async fn send_direct_message(&self, member_id: u64, text: &str) -> Result<(), SendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotifyOutcome {
    Sent,
    Blocked,
    Failed,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Resolution {
    pub resolved: Vec<GuildMember>,
    pub unresolved: BTreeSet<String>,
}

/// Matches roster handles against member usernames, case-sensitively. Every
/// handle ends up either resolved to exactly one member or unresolved.
pub(crate) fn resolve(
    roster: &Roster,
    members: impl IntoIterator<Item = GuildMember>,
) -> Resolution {
    let mut unresolved: BTreeSet<String> = roster.handles().iter().cloned().collect();
    let mut resolved = Vec::new();

    for member in members {
        if unresolved.remove(&member.name) {
            resolved.push(member);
        }
    }

    Resolution {
        resolved,
        unresolved,
    }
}

#[instrument(name = "notifier.notify", skip(platform, message), fields(member.id = member.id, member.name = %member.name))]
pub(crate) async fn notify(
    platform: &impl MessagingPlatform,
    member: &GuildMember,
    message: &MessageTemplate,
) -> NotifyOutcome {
    match platform
        .send_direct_message(member.id, &message.render(member.id))
        .await
    {
        Ok(()) => {
            info!("Sent reminder");
            NotifyOutcome::Sent
        }
        Err(SendError::Blocked) => {
            warn!("Can't DM member, DMs disabled or bot blocked");
            NotifyOutcome::Blocked
        }
        Err(err) => {
            error!(error = %err, "Error sending reminder");
            NotifyOutcome::Failed
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub sent: usize,
    pub blocked: usize,
    pub failed: usize,
    pub already_notified: usize,
    pub unresolved: BTreeSet<String>,
}

impl RunSummary {
    pub fn log(&self) {
        info!(
            sent = self.sent,
            blocked = self.blocked,
            failed = self.failed,
            already_notified = self.already_notified,
            unresolved = self.unresolved.len(),
            "Reminder run complete"
        );

        for handle in &self.unresolved {
            warn!(handle = %handle, "Unresolved username");
        }
    }
}

/// Sends the reminder to every roster member who hasn't had it yet.
///
/// Members are processed one at a time. Each id is written to the notified
/// set before its message goes out, so a member is messaged at most once
/// across runs even if sending fails or the process dies mid-run.
#[instrument(name = "notifier.run", skip_all, fields(guild.id = guild_id.get(), roster.len = roster.handles().len()), err)]
pub(crate) async fn notify_roster(
    platform: &impl MessagingPlatform,
    guild_id: NonZeroU64,
    roster: &Roster,
    message: &MessageTemplate,
    notified: &mut NotifiedSet,
) -> Result<RunSummary> {
    info!("Fetching members");
    let members = platform.guild_members(guild_id).await?;
    info!(members = members.len(), "Fetched members");

    let Resolution {
        resolved,
        unresolved,
    } = resolve(roster, members);

    let mut summary = RunSummary {
        unresolved,
        ..RunSummary::default()
    };

    for member in &resolved {
        if notified.contains(member.id) {
            summary.already_notified += 1;
            continue;
        }

        notified.mark_notified(member.id).await?;

        match notify(platform, member, message).await {
            NotifyOutcome::Sent => summary.sent += 1,
            NotifyOutcome::Blocked => summary.blocked += 1,
            NotifyOutcome::Failed => summary.failed += 1,
        }
    }

    Ok(summary)
}
