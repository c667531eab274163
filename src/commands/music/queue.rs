use super::*;

/// View the current music queue
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.snapshot().await,
        Err(err) => Err(err),
    };
    respond(ctx, result, |snapshot| {
        CreateReply::default().embed(embedded_messages::music_queue(&snapshot))
    })
    .await
}
