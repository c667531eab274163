//! Mock implementations for external dependencies
//! This module contains the fake voice transport, resolver and reply sink
//! the session tests drive.

use async_trait::async_trait;
use mockall::mock;
use poise::serenity_prelude::{ChannelId, GuildId};
use rusty_dj::commands::music::audio_sources::{
    AudioSourceResult, ResolutionError, Resolver, track_metadata::ResolvedTrack,
};
use rusty_dj::commands::music::utils::{
    music_manager::{MusicError, MusicResult},
    queue_manager::QueueItem,
    reply::{Reply, ReplySink},
    transport::{AudioTransport, CompletionHandle, VoiceConnection},
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::fixtures::track_for;

/// What the fake transport was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(ChannelId),
    Played(String),
    Paused,
    Resumed,
    Stopped,
    Disconnected,
}

struct Shared {
    events: UnboundedSender<TransportEvent>,
    pending: Mutex<Vec<CompletionHandle>>,
    failing_connects: AtomicUsize,
}

impl Shared {
    fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }

    fn take_pending(&self) -> Vec<CompletionHandle> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }
}

/// In-memory voice transport. Tracks never end on their own; tests end
/// them with [`FakeTransport::finish_track`].
#[derive(Clone)]
pub struct FakeTransport {
    shared: Arc<Shared>,
}

impl FakeTransport {
    pub fn new() -> (Self, UnboundedReceiver<TransportEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let transport = Self {
            shared: Arc::new(Shared {
                events,
                pending: Mutex::new(Vec::new()),
                failing_connects: AtomicUsize::new(0),
            }),
        };
        (transport, rx)
    }

    /// Make the next `count` connection attempts fail.
    pub fn fail_next_connects(&self, count: usize) {
        self.shared.failing_connects.store(count, Ordering::SeqCst);
    }

    /// Simulate the current track reaching its end. Returns `false` when
    /// nothing was playing.
    pub fn finish_track(&self) -> bool {
        let pending = self.shared.take_pending();
        let finished = !pending.is_empty();
        for handle in pending {
            handle.complete(None);
        }
        finished
    }

    /// Simulate the stream breaking mid-track.
    pub fn fail_track(&self, error: &str) -> bool {
        let pending = self.shared.take_pending();
        let failed = !pending.is_empty();
        for handle in pending {
            handle.complete(Some(error.to_string()));
        }
        failed
    }
}

#[async_trait]
impl AudioTransport for FakeTransport {
    async fn connect(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> MusicResult<Box<dyn VoiceConnection>> {
        let should_fail = self
            .shared
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(MusicError::ConnectError(
                "voice gateway unavailable".to_string(),
            ));
        }

        self.shared.emit(TransportEvent::Connected(channel_id));
        Ok(Box::new(FakeConnection {
            channel_id,
            shared: self.shared.clone(),
        }))
    }
}

struct FakeConnection {
    channel_id: ChannelId,
    shared: Arc<Shared>,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    async fn play(&mut self, track: &ResolvedTrack, on_complete: CompletionHandle) {
        self.shared.pending.lock().unwrap().push(on_complete);
        self.shared.emit(TransportEvent::Played(track.title.clone()));
    }

    async fn pause(&mut self) {
        self.shared.emit(TransportEvent::Paused);
    }

    async fn resume(&mut self) {
        self.shared.emit(TransportEvent::Resumed);
    }

    async fn stop(&mut self) {
        for handle in self.shared.take_pending() {
            handle.complete(None);
        }
        self.shared.emit(TransportEvent::Stopped);
    }

    async fn disconnect(&mut self) {
        self.shared.emit(TransportEvent::Disconnected);
    }
}

/// Resolves every reference to [`track_for`] except the ones marked as broken.
#[derive(Default)]
pub struct FakeResolver {
    broken: HashSet<String>,
    resolved: AtomicUsize,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broken(mut self, reference: &str) -> Self {
        self.broken.insert(reference.to_string());
        self
    }

    pub fn resolve_count(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn resolve(&self, reference: &str) -> AudioSourceResult<ResolvedTrack> {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(reference) {
            return Err(ResolutionError::new(reference, "video unavailable"));
        }
        Ok(track_for(reference))
    }

    async fn recommend(&self, seed: &ResolvedTrack) -> AudioSourceResult<QueueItem> {
        Err(ResolutionError::new(&seed.title, "no related tracks found"))
    }
}

/// Resolves every reference to [`track_for`] but holds each recommendation
/// until [`HeldRecommendation::release`] is called.
#[derive(Default)]
pub struct HeldRecommendation {
    released: Notify,
    asked: AtomicUsize,
}

impl HeldRecommendation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let one held recommendation answer.
    pub fn release(&self) {
        self.released.notify_one();
    }

    pub fn recommend_count(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for HeldRecommendation {
    async fn resolve(&self, reference: &str) -> AudioSourceResult<ResolvedTrack> {
        Ok(track_for(reference))
    }

    async fn recommend(&self, _seed: &ResolvedTrack) -> AudioSourceResult<QueueItem> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.released.notified().await;
        Ok(QueueItem::new("recommended").with_title("Recommended"))
    }
}

mock! {
    pub Resolver {}

    #[async_trait]
    impl Resolver for Resolver {
        async fn resolve(&self, reference: &str) -> AudioSourceResult<ResolvedTrack>;
        async fn recommend(&self, seed: &ResolvedTrack) -> AudioSourceResult<QueueItem>;
    }
}

/// Records the title (or text) of every notice a session sends.
pub struct RecordingSink {
    notices: UnboundedSender<String>,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<String>) {
        let (notices, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { notices }), rx)
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn respond(&self, reply: Reply) {
        let text = match reply {
            Reply::Text(text) => text,
            Reply::Embed(embed) => serde_json::to_value(&embed)
                .ok()
                .and_then(|value| value["title"].as_str().map(str::to_string))
                .unwrap_or_default(),
        };
        let _ = self.notices.send(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_resolver() {
        let resolver = FakeResolver::new().with_broken("bad-url");

        assert_eq!(resolver.resolve("good-url").await.unwrap().title, "good-url");
        assert_eq!(
            resolver.resolve("bad-url").await.unwrap_err().reason,
            "video unavailable"
        );
        assert_eq!(resolver.resolve_count(), 2);
    }

    #[tokio::test]
    async fn test_fake_transport_connect_failures() {
        let (transport, mut events) = FakeTransport::new();
        transport.fail_next_connects(1);

        let guild = GuildId::new(1);
        let channel = ChannelId::new(2);
        assert!(transport.connect(guild, channel).await.is_err());
        assert!(transport.connect(guild, channel).await.is_ok());
        assert_eq!(events.recv().await, Some(TransportEvent::Connected(channel)));
        assert!(!transport.finish_track());
    }
}
