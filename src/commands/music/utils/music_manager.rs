use dashmap::DashMap;
use futures::future::join_all;
use poise::serenity_prelude as serenity;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId};
use thiserror::Error;
use tracing::{debug, info};

use crate::commands::music::audio_sources::ResolutionError;
use crate::utils::database::StorageError;

use super::guild_session::{GuildSession, SessionDeps};

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("Failed to join voice channel: {0}")]
    ConnectError(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("{0}")]
    InvalidState(String),

    #[error("Position {position} is out of range (queue has {len} items)")]
    IndexOutOfRange { position: usize, len: usize },

    #[error("Playlist storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("No playlist named '{0}'")]
    PlaylistNotFound(String),

    #[error("A playlist named '{0}' already exists")]
    PlaylistExists(String),

    #[error("Playlist '{0}' is empty")]
    EmptyPlaylist(String),

    #[error("The music session for this server has shut down")]
    SessionClosed,
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Owns exactly one [`GuildSession`] per guild.
///
/// Lookup and creation go through a single `DashMap` entry, so concurrent
/// first use of a guild still yields one session.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, GuildSession>,
    deps: SessionDeps,
}

impl SessionRegistry {
    pub fn new(deps: SessionDeps) -> Self {
        Self {
            sessions: DashMap::new(),
            deps,
        }
    }

    /// The session for `guild_id`, spawning it on first use.
    pub fn get_or_create(&self, guild_id: GuildId) -> GuildSession {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                info!("Creating music session for guild {}", guild_id);
                GuildSession::spawn(guild_id, self.deps.clone())
            })
            .clone()
    }

    /// The session for `guild_id` if one was ever created.
    pub fn get(&self, guild_id: GuildId) -> Option<GuildSession> {
        self.sessions.get(&guild_id).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Stop every session: queues cleared, voice connections closed.
    pub async fn shutdown(&self) {
        let sessions: Vec<GuildSession> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        info!("Stopping {} music session(s)", sessions.len());
        join_all(sessions.iter().map(|session| async move {
            if let Err(e) = session.stop().await {
                debug!("Session for guild {} already closed: {}", session.guild_id(), e);
            }
        }))
        .await;

        self.sessions.clear();
    }
}

/// Voice-state helpers that need the serenity cache.
pub struct MusicManager;

impl MusicManager {
    /// Get the voice channel a user is currently connected to
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: serenity::UserId,
    ) -> MusicResult<ChannelId> {
        // Get the guild
        let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

        // Get the voice state of the user
        let voice_state = guild
            .voice_states
            .get(&user_id)
            .ok_or(MusicError::UserNotInVoiceChannel)?;

        voice_state
            .channel_id
            .ok_or(MusicError::UserNotInVoiceChannel)
    }
}
