//! The voice transport as seen by a guild session.
//!
//! A session never touches songbird directly. It asks an [`AudioTransport`]
//! for a [`VoiceConnection`] and hands every `play` a [`CompletionHandle`],
//! which posts the end of playback back onto the session's own mailbox.

use crate::commands::music::audio_sources::track_metadata::ResolvedTrack;
use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::guild_session::SessionMessage;
use super::music_manager::MusicResult;

/// Opens voice connections.
#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Join `channel_id`. If the guild is already connected elsewhere the
    /// existing call moves, and the old connection must not be disconnected.
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Box<dyn VoiceConnection>>;
}

/// One guild's live voice connection, exclusively owned by that guild's session.
///
/// All controls are no-ops when they do not apply (pausing nothing, stopping
/// twice); the session decides whether that is worth reporting.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    fn channel_id(&self) -> ChannelId;

    /// Start streaming `track`. `on_complete` must be fired exactly once, on
    /// natural end, on `stop`, or with an error if the stream cannot play.
    async fn play(&mut self, track: &ResolvedTrack, on_complete: CompletionHandle);

    async fn pause(&mut self);

    async fn resume(&mut self);

    async fn stop(&mut self);

    async fn disconnect(&mut self);
}

/// Fires the completion signal of one `play` call.
///
/// Consumed by [`CompletionHandle::complete`]; if it is dropped without
/// being fired it reports an error, so a session can never wait forever on a
/// track nobody will finish.
pub struct CompletionHandle {
    play_id: u64,
    mailbox: Option<UnboundedSender<SessionMessage>>,
}

impl CompletionHandle {
    pub(crate) fn new(play_id: u64, mailbox: UnboundedSender<SessionMessage>) -> Self {
        Self {
            play_id,
            mailbox: Some(mailbox),
        }
    }

    /// Report that playback ended, with the transport's error if it failed.
    pub fn complete(mut self, error: Option<String>) {
        self.fire(error);
    }

    fn fire(&mut self, error: Option<String>) {
        if let Some(mailbox) = self.mailbox.take() {
            debug!("Playback {} finished (error: {:?})", self.play_id, error);
            // The session may already be gone; nothing left to notify then.
            let _ = mailbox.send(SessionMessage::PlaybackFinished {
                play_id: self.play_id,
                error,
            });
        }
    }
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        if self.mailbox.is_some() {
            self.fire(Some("playback ended without a completion signal".to_string()));
        }
    }
}

impl std::fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("play_id", &self.play_id)
            .field("fired", &self.mailbox.is_none())
            .finish()
    }
}
