use super::*;

/// Stop the music, clear the queue, and leave the voice channel
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.stop().await,
        Err(err) => Err(err),
    };
    respond(ctx, result, |_| embedded_messages::stopped()).await
}
