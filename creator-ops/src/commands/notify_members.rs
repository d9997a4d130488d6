use cja::Result;

use crate::{
    config::NotifierConfig,
    discord::DiscordClient,
    notifier::{notify_roster, MessageTemplate, NotifiedSet, Roster},
};

pub(crate) async fn notify_members() -> Result<()> {
    let config = NotifierConfig::from_env()?;

    run(&config).await
}

#[tracing::instrument(name = "notify_members", skip_all, fields(guild.id = config.guild_id.get()), err)]
async fn run(config: &NotifierConfig) -> Result<()> {
    let roster = Roster::load(&config.roster_path).await?;
    let message = MessageTemplate::load(config.message_path.as_deref()).await?;
    let mut notified = NotifiedSet::load(&config.sent_path).await?;
    tracing::info!(
        roster = roster.handles().len(),
        already_notified = notified.ids().len(),
        "Loaded roster"
    );

    let discord = DiscordClient::connect(&config.discord_token).await?;

    let summary = notify_roster(
        &discord,
        config.guild_id,
        &roster,
        &message,
        &mut notified,
    )
    .await?;
    summary.log();

    Ok(())
}
