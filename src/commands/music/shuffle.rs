use super::*;

/// Shuffle the upcoming tracks
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn shuffle(ctx: Context<'_>) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.shuffle().await,
        Err(err) => Err(err),
    };
    respond(ctx, result, embedded_messages::shuffled).await
}
