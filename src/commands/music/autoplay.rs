//! Defines the `/autoplay` and `/status` commands for the music autoplay feature.

use super::*;

/// Enables, disables, or toggles the music autoplay feature for the guild.
///
/// When autoplay is enabled, the bot will automatically queue a related song
/// when the current queue becomes empty. If the `enabled` argument is omitted,
/// the command toggles the current autoplay state.
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn autoplay(
    ctx: Context<'_>,
    #[description = "Enable or disable autoplay"] enabled: Option<bool>,
) -> CommandResult {
    let result = set_autoplay(ctx, enabled).await;
    respond(ctx, result, embedded_messages::autoplay_status).await
}

/// Shows whether autoplay is enabled for the guild.
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn status(ctx: Context<'_>) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.autoplay_status().await,
        Err(err) => Err(err),
    };
    respond(ctx, result, embedded_messages::autoplay_status).await
}

async fn set_autoplay(ctx: Context<'_>, enabled: Option<bool>) -> MusicResult<bool> {
    let session = session_for(ctx)?;

    match enabled {
        Some(wanted) if session.autoplay_status().await? == wanted => Ok(wanted),
        _ => session.toggle_autoplay().await,
    }
}
