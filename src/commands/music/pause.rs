use super::*;

/// Pause the current track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.pause().await,
        Err(err) => Err(err),
    };
    respond(ctx, result, |_| embedded_messages::paused()).await
}

/// Resume the paused track
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn resume(ctx: Context<'_>) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.resume().await,
        Err(err) => Err(err),
    };
    respond(ctx, result, |_| embedded_messages::resumed()).await
}
