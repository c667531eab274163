use super::*;

/// Remove a track from the queue by its position
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Position of the track to remove (1-based)"] position: usize,
) -> CommandResult {
    let result = match session_for(ctx) {
        Ok(session) => session.remove(position).await,
        Err(err) => Err(err),
    };
    respond(ctx, result, |item| {
        embedded_messages::track_removed(&item, position)
    })
    .await
}
