//! [`AudioTransport`] on top of songbird.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::HttpRequest;
use songbird::tracks::TrackHandle;
use songbird::{Call, Event, Songbird, TrackEvent};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::commands::music::audio_sources::track_metadata::ResolvedTrack;

use super::event_handlers::TrackEndNotifier;
use super::music_manager::{MusicError, MusicResult};
use super::transport::{AudioTransport, CompletionHandle, VoiceConnection};

/// Joins voice through the songbird manager registered with the client.
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http: reqwest::Client,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>, http: reqwest::Client) -> Self {
        Self { manager, http }
    }
}

#[async_trait]
impl AudioTransport for SongbirdTransport {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Box<dyn VoiceConnection>> {
        let call = self.manager.join(guild_id, channel_id).await.map_err(|e| {
            error!(
                "Failed to join voice channel {} for guild {}: {}",
                channel_id, guild_id, e
            );
            MusicError::ConnectError(e.to_string())
        })?;

        info!("Joined voice channel {} in guild {}", channel_id, guild_id);
        Ok(Box::new(SongbirdConnection {
            guild_id,
            channel_id,
            manager: self.manager.clone(),
            call,
            http: self.http.clone(),
            current: None,
        }))
    }
}

struct SongbirdConnection {
    guild_id: GuildId,
    channel_id: ChannelId,
    manager: Arc<Songbird>,
    call: Arc<SerenityMutex<Call>>,
    http: reqwest::Client,
    current: Option<TrackHandle>,
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    async fn play(&mut self, track: &ResolvedTrack, on_complete: CompletionHandle) {
        let input = HttpRequest::new(self.http.clone(), track.stream_url.clone());

        // Replaces anything still attached to the call.
        let handle = self.call.lock().await.play_only_input(input.into());

        let notifier = TrackEndNotifier::new(self.guild_id, on_complete);
        for event in [TrackEvent::End, TrackEvent::Error] {
            if let Err(e) = handle.add_event(Event::Track(event), notifier.clone()) {
                // The track is already gone; dropping the notifier reports it.
                warn!(
                    "Failed to watch track for guild {}: {}",
                    self.guild_id, e
                );
            }
        }

        debug!("Streaming '{}' in guild {}", track.title, self.guild_id);
        self.current = Some(handle);
    }

    async fn pause(&mut self) {
        if let Some(handle) = &self.current {
            if let Err(e) = handle.pause() {
                debug!("Pause ignored for guild {}: {}", self.guild_id, e);
            }
        }
    }

    async fn resume(&mut self) {
        if let Some(handle) = &self.current {
            if let Err(e) = handle.play() {
                debug!("Resume ignored for guild {}: {}", self.guild_id, e);
            }
        }
    }

    async fn stop(&mut self) {
        if let Some(handle) = self.current.take() {
            if let Err(e) = handle.stop() {
                debug!("Stop ignored for guild {}: {}", self.guild_id, e);
            }
        }
    }

    async fn disconnect(&mut self) {
        self.current = None;
        match self.manager.remove(self.guild_id).await {
            Ok(()) => info!("Left voice channel in guild {}", self.guild_id),
            Err(e) => debug!("Guild {} was not connected: {}", self.guild_id, e),
        }
    }
}
