use super::*;

/// Skip the currently playing song
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.skip().await,
        Err(err) => Err(err),
    };
    respond(ctx, result, |title| embedded_messages::skipped(title.as_deref())).await
}
