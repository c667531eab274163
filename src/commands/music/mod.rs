pub mod autoplay;
pub mod leave;
pub mod move_track;
pub mod pause;
pub mod play;
pub mod playlist;
pub mod queue;
pub mod remove;
pub mod shuffle;
pub mod skip;
pub mod stop;

pub mod audio_sources;
pub mod utils;

use crate::{CommandResult, Context};
use poise::CreateReply;
use std::sync::Arc;
use tracing::warn;
use utils::{
    embedded_messages,
    guild_session::{GuildSession, Origin},
    music_manager::{MusicError, MusicManager, MusicResult},
    reply::ChannelReplySink,
};

/// The session of the guild the command was issued in.
fn session_for(ctx: Context<'_>) -> MusicResult<GuildSession> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    Ok(ctx.data().registry.get_or_create(guild_id))
}

/// The invoking user's voice channel plus a sink for notices in this text channel.
fn origin_for(ctx: Context<'_>) -> MusicResult<Origin> {
    let guild_id = ctx.guild_id().ok_or(MusicError::NotInGuild)?;
    let voice_channel =
        MusicManager::get_user_voice_channel(ctx.serenity_context(), guild_id, ctx.author().id)?;
    let replies = ChannelReplySink::new(ctx.serenity_context().http.clone(), ctx.channel_id());

    Ok(Origin::new(voice_channel, Arc::new(replies)))
}

/// Send `on_success(value)`, or an error embed for an expected failure.
async fn respond<T>(
    ctx: Context<'_>,
    result: MusicResult<T>,
    on_success: impl FnOnce(T) -> CreateReply,
) -> CommandResult {
    let reply = match result {
        Ok(value) => on_success(value),
        Err(err) => {
            warn!("/{} failed: {}", ctx.command().qualified_name, err);
            embedded_messages::error(&err)
        }
    };

    ctx.send(reply).await?;
    Ok(())
}
