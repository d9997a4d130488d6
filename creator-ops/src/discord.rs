use std::{future::Future, num::NonZeroU64, sync::Arc};

use cja::Result;
use color_eyre::eyre::WrapErr;
use serenity::all::{CreateMessage, GuildId, Http, UserId};

use crate::notifier::{GuildMember, MessagingPlatform, SendError};

/// Discord caps the member list endpoint at this many per page.
const MEMBER_PAGE_SIZE: u16 = 1000;

const FORBIDDEN: u16 = 403;

/// Discord answers 403 when the member has DMs closed or has blocked the bot.
fn is_blocked(status: Option<u16>) -> bool {
    status == Some(FORBIDDEN)
}

impl From<serenity::Error> for SendError {
    fn from(err: serenity::Error) -> Self {
        let status = match &err {
            serenity::Error::Http(http_err) => http_err.status_code().map(u16::from),
            _ => None,
        };

        if is_blocked(status) {
            Self::Blocked
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Walks the member list a page at a time, each page starting after the last
/// id of the one before. A short page is the last.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<GuildMember>>
where
    F: FnMut(Option<u64>) -> Fut,
    Fut: Future<Output = Result<Vec<GuildMember>>>,
{
    let mut members = Vec::new();
    let mut after: Option<u64> = None;

    loop {
        let page = fetch_page(after).await?;
        let page_len = page.len();

        after = page.last().map(|member| member.id);
        members.extend(page);
        tracing::debug!(page_len, total = members.len(), "Fetched page of members");

        if page_len < usize::from(MEMBER_PAGE_SIZE) {
            break;
        }
    }

    Ok(members)
}

/// REST-only Discord client. The notifier never needs the gateway, so there
/// is no connection to hold open once the run is done.
#[derive(Clone)]
pub(crate) struct DiscordClient {
    http: Arc<Http>,
}

impl DiscordClient {
    /// Fails if Discord rejects the token.
    #[tracing::instrument(name = "DiscordClient::connect", skip_all, err)]
    pub async fn connect(token: &str) -> Result<Self> {
        let http = Arc::new(Http::new(token));

        let me = http
            .get_current_user()
            .await
            .wrap_err("Couldn't authenticate with Discord, check DISCORD_TOKEN")?;
        tracing::info!(bot.id = %me.id, bot.name = %me.name, "Bot is ready");

        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl MessagingPlatform for DiscordClient {
    #[tracing::instrument(name = "discord.guild_members", skip(self), err)]
    async fn guild_members(&self, guild_id: NonZeroU64) -> Result<Vec<GuildMember>> {
        let guild_id = GuildId::new(guild_id.get());

        collect_pages(|after| async move {
            let page = self
                .http
                .get_guild_members(guild_id, Some(u64::from(MEMBER_PAGE_SIZE)), after)
                .await
                .wrap_err_with(|| format!("Couldn't list members of guild {guild_id}"))?;

            Ok(page
                .into_iter()
                .map(|member| GuildMember {
                    id: member.user.id.get(),
                    name: member.user.name,
                })
                .collect())
        })
        .await
    }

    async fn send_direct_message(&self, member_id: u64, text: &str) -> Result<(), SendError> {
        let channel = UserId::new(member_id)
            .create_dm_channel(self.http.as_ref())
            .await?;

        channel
            .id
            .send_message(self.http.as_ref(), CreateMessage::new().content(text))
            .await?;

        Ok(())
    }
}
