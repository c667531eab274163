use futures::future::join_all;
use poise::serenity_prelude::GuildId;
use rusty_dj::commands::music::utils::{
    guild_session::{PlayerState, SessionDeps},
    music_manager::SessionRegistry,
    queue_manager::QueueItem,
};
use std::sync::Arc;

use crate::common::fixtures::{guild_id, settings};
use crate::common::mocks::{FakeResolver, FakeTransport};

fn registry() -> SessionRegistry {
    crate::test_utils::init();
    let (transport, _events) = FakeTransport::new();
    SessionRegistry::new(SessionDeps {
        resolver: Arc::new(FakeResolver::new()),
        transport: Arc::new(transport),
        settings: settings(false),
    })
}

/// Tests that concurrent lookups for one guild all land on a single session.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_yields_one_session() {
    // Arrange
    let registry = Arc::new(registry());

    // Act
    let handles = (0..32).map(|_| {
        let registry = registry.clone();
        tokio::spawn(async move { registry.get_or_create(guild_id()) })
    });
    let sessions: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    // Assert
    assert_eq!(registry.len(), 1);
    let first = &sessions[0];
    assert!(sessions.iter().all(|session| session.same_session(first)));
    assert!(registry.get(guild_id()).unwrap().same_session(first));
}

#[tokio::test]
async fn test_guilds_get_separate_sessions() {
    let registry = registry();

    let first = registry.get_or_create(GuildId::new(1));
    let second = registry.get_or_create(GuildId::new(2));

    assert!(!first.same_session(&second));
    assert_eq!(first.guild_id(), GuildId::new(1));
    assert_eq!(registry.len(), 2);
    assert!(registry.get(GuildId::new(3)).is_none());

    // Queues are independent
    first
        .enqueue(QueueItem::new("A"), Default::default())
        .await
        .unwrap();
    assert_eq!(first.snapshot().await.unwrap().upcoming.len(), 1);
    assert!(second.snapshot().await.unwrap().upcoming.is_empty());
}

/// Tests that shutdown stops every session and empties the registry.
#[tokio::test]
async fn test_shutdown_clears_registry() {
    let registry = registry();
    let session = registry.get_or_create(guild_id());
    session
        .enqueue(QueueItem::new("A"), Default::default())
        .await
        .unwrap();

    registry.shutdown().await;

    assert!(registry.is_empty());
    assert!(registry.get(guild_id()).is_none());
    let snapshot = session.snapshot().await.unwrap();
    assert_eq!(snapshot.state, PlayerState::Idle);
    assert!(snapshot.upcoming.is_empty());

    // The worker ends once the last handle is gone.
    let mut state = session.watch_state();
    state.borrow_and_update();
    drop(session);
    assert!(state.changed().await.is_err());
}
