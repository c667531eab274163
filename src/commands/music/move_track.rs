use super::*;

/// Move a queued track to another position
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "move",
    category = "Music"
)]
pub async fn move_track(
    ctx: Context<'_>,
    #[description = "Current position of the track (1-based)"] from: usize,
    #[description = "New position of the track (1-based)"] to: usize,
) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.move_to(from, to).await,
        Err(err) => Err(err),
    };
    respond(ctx, result, |item| embedded_messages::track_moved(&item, to)).await
}
