//! The `/playlist` command group: per-user named lists of track references.
//!
//! Each edit loads the invoking user's playlists, applies one of the pure
//! operations in `utils::playlists`, and saves the whole mapping back.

use super::*;
use crate::commands::music::utils::queue_manager::QueueItem;
use crate::utils::database::Playlists;
use crate::utils::playlists as ops;
use tracing::info;

/// Manage and play your saved playlists
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    category = "Music",
    subcommands(
        "create",
        "delete",
        "list",
        "add",
        "remove",
        "move_track",
        "shuffle",
        "play"
    ),
    subcommand_required
)]
pub async fn playlist(_: Context<'_>) -> CommandResult {
    Ok(())
}

/// Load the author's playlists, apply `edit`, and save on success.
async fn edit_playlists<T>(
    ctx: Context<'_>,
    edit: impl FnOnce(&mut Playlists) -> MusicResult<T>,
) -> MusicResult<T> {
    let store = &ctx.data().playlists;
    let user_id = ctx.author().id;

    let mut playlists = store.load(user_id).await?;
    let value = edit(&mut playlists)?;
    store.save(user_id, &playlists).await?;
    Ok(value)
}

/// Create a new, empty playlist
#[poise::command(slash_command, prefix_command)]
pub async fn create(
    ctx: Context<'_>,
    #[description = "Playlist name"]
    #[rest]
    name: String,
) -> CommandResult {
    let result = edit_playlists(ctx, |playlists| ops::create(playlists, &name)).await;
    respond(ctx, result, |_| {
        embedded_messages::playlist_updated("Playlist Created", format!("Created **{}**", name.trim()))
    })
    .await
}

/// Delete one of your playlists
#[poise::command(slash_command, prefix_command)]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "Playlist name"]
    #[rest]
    name: String,
) -> CommandResult {
    let result = edit_playlists(ctx, |playlists| ops::delete(playlists, &name)).await;
    respond(ctx, result, |tracks| {
        embedded_messages::playlist_updated(
            "Playlist Deleted",
            format!("Deleted **{}** ({} tracks)", name.trim(), tracks.len()),
        )
    })
    .await
}

/// List your playlists, or the tracks of one of them
#[poise::command(slash_command, prefix_command)]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Playlist to show"] name: Option<String>,
) -> CommandResult {
    let result = ctx
        .data()
        .playlists
        .load(ctx.author().id)
        .await
        .map_err(MusicError::from);
    respond(ctx, result, |playlists| {
        embedded_messages::playlists(&playlists, name.as_deref().map(str::trim))
    })
    .await
}

/// Add a track to a playlist
#[poise::command(slash_command, prefix_command)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Playlist name"] name: String,
    #[description = "URL or search query"]
    #[rest]
    reference: String,
) -> CommandResult {
    let result = edit_playlists(ctx, |playlists| ops::add(playlists, &name, &reference)).await;
    respond(ctx, result, |len| {
        embedded_messages::playlist_updated(
            "Track Added",
            format!("Added `{}` to **{}** at #{}", reference.trim(), name, len),
        )
    })
    .await
}

/// Remove a track from a playlist
#[poise::command(slash_command, prefix_command)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Playlist name"] name: String,
    #[description = "Position of the track to remove (1-based)"] position: usize,
) -> CommandResult {
    let result = edit_playlists(ctx, |playlists| ops::remove(playlists, &name, position)).await;
    respond(ctx, result, |reference| {
        embedded_messages::playlist_updated(
            "Track Removed",
            format!("Removed `{}` from **{}**", reference, name),
        )
    })
    .await
}

/// Move a track within a playlist
#[poise::command(slash_command, prefix_command, rename = "move")]
pub async fn move_track(
    ctx: Context<'_>,
    #[description = "Playlist name"] name: String,
    #[description = "Current position (1-based)"] from: usize,
    #[description = "New position (1-based)"] to: usize,
) -> CommandResult {
    let result =
        edit_playlists(ctx, |playlists| ops::move_track(playlists, &name, from, to)).await;
    respond(ctx, result, |reference| {
        embedded_messages::playlist_updated(
            "Track Moved",
            format!("Moved `{}` to #{} in **{}**", reference, to, name),
        )
    })
    .await
}

/// Shuffle a playlist
#[poise::command(slash_command, prefix_command)]
pub async fn shuffle(
    ctx: Context<'_>,
    #[description = "Playlist name"]
    #[rest]
    name: String,
) -> CommandResult {
    let result = edit_playlists(ctx, |playlists| ops::shuffle(playlists, &name)).await;
    respond(ctx, result, |len| {
        embedded_messages::playlist_updated(
            "Playlist Shuffled",
            format!("Shuffled {} tracks in **{}**", len, name.trim()),
        )
    })
    .await
}

/// Queue every track of a playlist
#[poise::command(slash_command, prefix_command)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Playlist name"]
    #[rest]
    name: String,
) -> CommandResult {
    let result = queue_playlist(ctx, &name).await;
    respond(ctx, result, |(count, started)| {
        embedded_messages::playlist_queued(name.trim(), count, started)
    })
    .await
}

async fn queue_playlist(ctx: Context<'_>, name: &str) -> MusicResult<(usize, bool)> {
    let origin = origin_for(ctx)?;
    let session = session_for(ctx)?;

    let playlists = ctx.data().playlists.load(ctx.author().id).await?;
    let requester = ctx.author().name.clone();
    // Copies: the session never sees the stored playlist itself.
    let items: Vec<QueueItem> = ops::tracks(&playlists, name)?
        .iter()
        .map(|reference| QueueItem::new(reference.as_str()).requested_by(requester.as_str()))
        .collect();

    let count = items.len();
    info!(
        "Queueing playlist '{}' ({} tracks) for {}",
        name.trim(),
        count,
        requester
    );
    let outcome = session.enqueue_all(items, origin).await?;
    Ok((count, outcome.started))
}
