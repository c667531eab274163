//! Common test utilities, fixtures, and mocks
//! This module contains shared functionality used across different test categories

pub mod fixtures;
pub mod mocks;

use rusty_dj::commands::music::audio_sources::Resolver;
use rusty_dj::commands::music::utils::guild_session::{
    GuildSession, Origin, PlayerState, SessionDeps, SessionSettings,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;

use fixtures::{guild_id, voice_channel};
use mocks::{FakeTransport, RecordingSink, TransportEvent};

/// How long a test waits for something that should happen promptly.
const STEP: Duration = Duration::from_secs(5);

/// A session wired to fakes, plus the receivers that observe it.
pub struct Harness {
    pub session: GuildSession,
    pub transport: FakeTransport,
    pub events: UnboundedReceiver<TransportEvent>,
    pub notices: UnboundedReceiver<String>,
    pub origin: Origin,
}

impl Harness {
    pub fn new(resolver: Arc<dyn Resolver>, settings: SessionSettings) -> Self {
        crate::test_utils::init();

        let (transport, events) = FakeTransport::new();
        let deps = SessionDeps {
            resolver,
            transport: Arc::new(transport.clone()),
            settings,
        };
        let (sink, notices) = RecordingSink::new();

        Self {
            session: GuildSession::spawn(guild_id(), deps),
            transport,
            events,
            notices,
            origin: Origin::new(voice_channel(), sink),
        }
    }

    /// The next transport event, failing the test if none arrives.
    pub async fn next_event(&mut self) -> TransportEvent {
        tokio::time::timeout(STEP, self.events.recv())
            .await
            .expect("timed out waiting for a transport event")
            .expect("transport event channel closed")
    }

    /// Skip connection events and return the title of the next played track.
    pub async fn next_played(&mut self) -> String {
        loop {
            match self.next_event().await {
                TransportEvent::Played(title) => return title,
                TransportEvent::Connected(_) => continue,
                other => panic!("expected a track to start, got {:?}", other),
            }
        }
    }

    pub fn assert_no_event(&mut self) {
        assert_eq!(self.events.try_recv(), Err(TryRecvError::Empty));
    }

    /// The next notice title, failing the test if none arrives.
    pub async fn next_notice(&mut self) -> String {
        tokio::time::timeout(STEP, self.notices.recv())
            .await
            .expect("timed out waiting for a notice")
            .expect("notice channel closed")
    }

    /// Wait until the session publishes `state`.
    pub async fn wait_for_state(&self, state: PlayerState) {
        let mut watch = self.session.watch_state();
        tokio::time::timeout(STEP, watch.wait_for(|current| *current == state))
            .await
            .expect("timed out waiting for session state")
            .expect("session state channel closed");
    }
}
