use std::sync::Arc;

use poise::serenity_prelude as serenity;
use serenity::GuildId;
use serenity::async_trait;
use songbird::tracks::PlayMode;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::transport::CompletionHandle;

/// Event handler for when a track ends or errors.
///
/// The same notifier is registered for both `TrackEvent::End` and
/// `TrackEvent::Error`; whichever arrives first takes the completion handle,
/// so the session hears about each track exactly once.
#[derive(Clone)]
pub struct TrackEndNotifier {
    guild_id: GuildId,
    completion: Arc<Mutex<Option<CompletionHandle>>>,
}

impl TrackEndNotifier {
    pub fn new(guild_id: GuildId, completion: CompletionHandle) -> Self {
        Self {
            guild_id,
            completion: Arc::new(Mutex::new(Some(completion))),
        }
    }
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(tracks) = ctx {
            let error = tracks.iter().find_map(|(state, _)| match &state.playing {
                PlayMode::Errored(e) => Some(e.to_string()),
                _ => None,
            });

            if let Some(completion) = self.completion.lock().await.take() {
                match &error {
                    Some(e) => warn!("Track failed for guild {}: {}", self.guild_id, e),
                    None => info!("Track ended for guild {}", self.guild_id),
                }
                completion.complete(error);
            }
        }
        None
    }
}
