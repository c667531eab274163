use super::*;

/// Leave the voice channel
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn leave(ctx: Context<'_>) -> CommandResult {
    let result = leave_channel(ctx).await;
    respond(ctx, result, |_| embedded_messages::left_voice_channel()).await
}

async fn leave_channel(ctx: Context<'_>) -> MusicResult<()> {
    let session = session_for(ctx)?;
    if !session.snapshot().await?.connected {
        return Err(MusicError::InvalidState(
            "Not connected to a voice channel".to_string(),
        ));
    }
    session.stop().await
}
