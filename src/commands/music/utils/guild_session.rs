//! The per-guild playback state machine.
//!
//! Every guild gets one worker task that owns the queue, the voice
//! connection and the idle timer. The public [`GuildSession`] is only a
//! handle: each call becomes a [`SessionMessage`] on the worker's mailbox and
//! waits for the answer on a oneshot channel. Slow work (resolving a
//! reference, joining voice) runs in a spawned task that posts its result
//! back to the same mailbox, so the worker never blocks on the network and
//! every state change for a guild happens in one place, in order.

use poise::serenity_prelude as serenity;
use serenity::model::id::{ChannelId, GuildId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::commands::music::audio_sources::{
    AudioSourceResult, ResolutionError, Resolver, track_metadata::ResolvedTrack,
};
use crate::config::Config;

use super::embedded_messages;
use super::idle_timer::IdleTimer;
use super::music_manager::{MusicError, MusicResult};
use super::queue_manager::{PlaybackQueue, QueueItem};
use super::reply::{Reply, ReplySink};
use super::transport::{AudioTransport, CompletionHandle, VoiceConnection};

/// Where a session is in its playback cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing playing. The voice connection may still be open.
    Idle,
    /// Resolving the next reference or joining voice.
    Connecting,
    Playing,
    Paused,
}

/// Tunables shared by every session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub idle_timeout: Duration,
    pub resolve_timeout: Duration,
    pub autoplay_default: bool,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            idle_timeout: config.idle_timeout,
            resolve_timeout: config.resolve_timeout,
            autoplay_default: config.autoplay_default,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(300),
            resolve_timeout: Duration::from_secs(45),
            autoplay_default: true,
        }
    }
}

/// The collaborators a session drives.
#[derive(Clone)]
pub struct SessionDeps {
    pub resolver: Arc<dyn Resolver>,
    pub transport: Arc<dyn AudioTransport>,
    pub settings: SessionSettings,
}

/// Read-only view of a session, detached from its internal storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: PlayerState,
    pub now_playing: Option<ResolvedTrack>,
    pub upcoming: Vec<QueueItem>,
    pub autoplay: bool,
    pub connected: bool,
    /// Channel of the open voice connection.
    pub voice_channel: Option<ChannelId>,
    pub idle_timer_active: bool,
}

/// Context supplied by the command layer along with new work: the voice
/// channel to join and where to post notices. `None` keeps the previous value.
#[derive(Clone, Default)]
pub struct Origin {
    pub voice_channel: Option<ChannelId>,
    pub replies: Option<Arc<dyn ReplySink>>,
}

impl Origin {
    pub fn new(voice_channel: ChannelId, replies: Arc<dyn ReplySink>) -> Self {
        Self {
            voice_channel: Some(voice_channel),
            replies: Some(replies),
        }
    }
}

/// What happened to an enqueue request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// 1-based queue position of the first added item.
    pub position: usize,
    /// Queue length right after the items were added.
    pub queue_len: usize,
    /// Whether the request woke an idle session up.
    pub started: bool,
}

type Respond<T> = oneshot::Sender<T>;

pub(crate) enum SessionMessage {
    Enqueue {
        items: Vec<QueueItem>,
        origin: Origin,
        respond: Respond<EnqueueOutcome>,
    },
    Pause {
        respond: Respond<MusicResult<()>>,
    },
    Resume {
        respond: Respond<MusicResult<()>>,
    },
    Skip {
        respond: Respond<MusicResult<Option<String>>>,
    },
    Stop {
        respond: Respond<()>,
    },
    Remove {
        position: usize,
        respond: Respond<MusicResult<QueueItem>>,
    },
    Move {
        from: usize,
        to: usize,
        respond: Respond<MusicResult<QueueItem>>,
    },
    Shuffle {
        respond: Respond<usize>,
    },
    Snapshot {
        respond: Respond<SessionSnapshot>,
    },
    ToggleAutoplay {
        respond: Respond<bool>,
    },
    AutoplayStatus {
        respond: Respond<bool>,
    },
    Prepared {
        advance_id: u64,
        item: QueueItem,
        outcome: PrepareOutcome,
    },
    Recommended {
        advance_id: u64,
        result: AudioSourceResult<QueueItem>,
    },
    PlaybackFinished {
        play_id: u64,
        error: Option<String>,
    },
    IdleElapsed {
        timer_id: u64,
    },
}

impl fmt::Debug for SessionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enqueue { items, .. } => write!(f, "Enqueue({} items)", items.len()),
            Self::Pause { .. } => f.write_str("Pause"),
            Self::Resume { .. } => f.write_str("Resume"),
            Self::Skip { .. } => f.write_str("Skip"),
            Self::Stop { .. } => f.write_str("Stop"),
            Self::Remove { position, .. } => write!(f, "Remove({})", position),
            Self::Move { from, to, .. } => write!(f, "Move({} -> {})", from, to),
            Self::Shuffle { .. } => f.write_str("Shuffle"),
            Self::Snapshot { .. } => f.write_str("Snapshot"),
            Self::ToggleAutoplay { .. } => f.write_str("ToggleAutoplay"),
            Self::AutoplayStatus { .. } => f.write_str("AutoplayStatus"),
            Self::Prepared { advance_id, .. } => write!(f, "Prepared({})", advance_id),
            Self::Recommended { advance_id, .. } => write!(f, "Recommended({})", advance_id),
            Self::PlaybackFinished { play_id, error } => {
                write!(f, "PlaybackFinished({}, {:?})", play_id, error)
            }
            Self::IdleElapsed { timer_id } => write!(f, "IdleElapsed({})", timer_id),
        }
    }
}

/// Result of resolving (and, if needed, connecting for) one queue item.
pub(crate) enum PrepareOutcome {
    Ready {
        track: ResolvedTrack,
        connection: Option<Box<dyn VoiceConnection>>,
    },
    ResolveFailed(ResolutionError),
    ConnectFailed(MusicError),
}

/// Handle to one guild's session. Cheap to clone; all clones talk to the
/// same worker.
#[derive(Clone)]
pub struct GuildSession {
    guild_id: GuildId,
    mailbox: UnboundedSender<SessionMessage>,
    state: watch::Receiver<PlayerState>,
}

impl GuildSession {
    /// Start the worker for `guild_id`. Must be called inside a tokio runtime.
    pub fn spawn(guild_id: GuildId, deps: SessionDeps) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(PlayerState::Idle);

        let worker = SessionWorker::new(guild_id, deps, mailbox.downgrade(), inbox, state_tx);
        tokio::spawn(worker.run());

        Self {
            guild_id,
            mailbox,
            state,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Whether both handles drive the same worker.
    pub fn same_session(&self, other: &GuildSession) -> bool {
        self.mailbox.same_channel(&other.mailbox)
    }

    /// The latest published state.
    pub fn state(&self) -> PlayerState {
        *self.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn watch_state(&self) -> watch::Receiver<PlayerState> {
        self.state.clone()
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(Respond<T>) -> SessionMessage,
    ) -> MusicResult<T> {
        let (respond, response) = oneshot::channel();
        self.mailbox
            .send(message(respond))
            .map_err(|_| MusicError::SessionClosed)?;
        response.await.map_err(|_| MusicError::SessionClosed)
    }

    /// Append one reference; starts playback if the session is idle.
    pub async fn enqueue(&self, item: QueueItem, origin: Origin) -> MusicResult<EnqueueOutcome> {
        self.enqueue_all(vec![item], origin).await
    }

    /// Append several references in order, as one operation.
    pub async fn enqueue_all(
        &self,
        items: Vec<QueueItem>,
        origin: Origin,
    ) -> MusicResult<EnqueueOutcome> {
        self.request(|respond| SessionMessage::Enqueue {
            items,
            origin,
            respond,
        })
        .await
    }

    pub async fn pause(&self) -> MusicResult<()> {
        self.request(|respond| SessionMessage::Pause { respond })
            .await?
    }

    pub async fn resume(&self) -> MusicResult<()> {
        self.request(|respond| SessionMessage::Resume { respond })
            .await?
    }

    /// Stop the current track; the next one starts when the transport
    /// reports completion. Returns the skipped title.
    pub async fn skip(&self) -> MusicResult<Option<String>> {
        self.request(|respond| SessionMessage::Skip { respond })
            .await?
    }

    /// Clear everything and leave voice. Always succeeds on a live session.
    pub async fn stop(&self) -> MusicResult<()> {
        self.request(|respond| SessionMessage::Stop { respond })
            .await
    }

    pub async fn remove(&self, position: usize) -> MusicResult<QueueItem> {
        self.request(|respond| SessionMessage::Remove { position, respond })
            .await?
    }

    pub async fn move_to(&self, from: usize, to: usize) -> MusicResult<QueueItem> {
        self.request(|respond| SessionMessage::Move { from, to, respond })
            .await?
    }

    /// Shuffle the upcoming tracks, returning how many there are.
    pub async fn shuffle(&self) -> MusicResult<usize> {
        self.request(|respond| SessionMessage::Shuffle { respond })
            .await
    }

    pub async fn snapshot(&self) -> MusicResult<SessionSnapshot> {
        self.request(|respond| SessionMessage::Snapshot { respond })
            .await
    }

    /// Flip the autoplay flag, returning the new value.
    pub async fn toggle_autoplay(&self) -> MusicResult<bool> {
        self.request(|respond| SessionMessage::ToggleAutoplay { respond })
            .await
    }

    pub async fn autoplay_status(&self) -> MusicResult<bool> {
        self.request(|respond| SessionMessage::AutoplayStatus { respond })
            .await
    }
}

struct SessionWorker {
    guild_id: GuildId,
    deps: SessionDeps,
    mailbox: WeakUnboundedSender<SessionMessage>,
    inbox: UnboundedReceiver<SessionMessage>,
    state_tx: watch::Sender<PlayerState>,
    notices: UnboundedSender<(Arc<dyn ReplySink>, Reply)>,

    queue: PlaybackQueue,
    state: PlayerState,
    now_playing: Option<ResolvedTrack>,
    connection: Option<Box<dyn VoiceConnection>>,
    autoplay: bool,
    last_played: Option<ResolvedTrack>,
    idle_timer: IdleTimer,
    voice_channel: Option<ChannelId>,
    replies: Option<Arc<dyn ReplySink>>,

    next_play_id: u64,
    active_play: Option<u64>,
    next_advance_id: u64,
    pending_advance: Option<u64>,
    /// Set once autoplay has been asked for the current drained queue.
    recommendation_spent: bool,
    /// The pending advance is an autoplay lookup rather than a queued item.
    recommending: bool,
}

impl SessionWorker {
    fn new(
        guild_id: GuildId,
        deps: SessionDeps,
        mailbox: WeakUnboundedSender<SessionMessage>,
        inbox: UnboundedReceiver<SessionMessage>,
        state_tx: watch::Sender<PlayerState>,
    ) -> Self {
        let autoplay = deps.settings.autoplay_default;
        Self {
            guild_id,
            deps,
            mailbox,
            inbox,
            state_tx,
            notices: spawn_notice_forwarder(),
            queue: PlaybackQueue::new(),
            state: PlayerState::Idle,
            now_playing: None,
            connection: None,
            autoplay,
            last_played: None,
            idle_timer: IdleTimer::new(),
            voice_channel: None,
            replies: None,
            next_play_id: 0,
            active_play: None,
            next_advance_id: 0,
            pending_advance: None,
            recommendation_spent: false,
            recommending: false,
        }
    }

    async fn run(mut self) {
        debug!("Session worker started for guild {}", self.guild_id);

        while let Some(message) = self.inbox.recv().await {
            self.handle(message).await;
        }

        // Every handle is gone; release voice if we still hold it.
        if let Some(mut connection) = self.connection.take() {
            connection.stop().await;
            connection.disconnect().await;
        }
        debug!("Session worker stopped for guild {}", self.guild_id);
    }

    async fn handle(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Enqueue {
                items,
                origin,
                respond,
            } => {
                let outcome = self.enqueue(items, origin);
                let _ = respond.send(outcome);
            }
            SessionMessage::Pause { respond } => {
                let result = self.pause().await;
                let _ = respond.send(result);
            }
            SessionMessage::Resume { respond } => {
                let result = self.resume().await;
                let _ = respond.send(result);
            }
            SessionMessage::Skip { respond } => {
                let result = self.skip().await;
                let _ = respond.send(result);
            }
            SessionMessage::Stop { respond } => {
                self.stop().await;
                let _ = respond.send(());
            }
            SessionMessage::Remove { position, respond } => {
                let _ = respond.send(self.queue.remove_at(position));
            }
            SessionMessage::Move { from, to, respond } => {
                let _ = respond.send(self.queue.move_to(from, to));
            }
            SessionMessage::Shuffle { respond } => {
                self.queue.shuffle();
                let _ = respond.send(self.queue.len());
            }
            SessionMessage::Snapshot { respond } => {
                let _ = respond.send(self.snapshot());
            }
            SessionMessage::ToggleAutoplay { respond } => {
                self.autoplay = !self.autoplay;
                info!(
                    "Autoplay {} for guild {}",
                    if self.autoplay { "enabled" } else { "disabled" },
                    self.guild_id
                );
                let _ = respond.send(self.autoplay);
            }
            SessionMessage::AutoplayStatus { respond } => {
                let _ = respond.send(self.autoplay);
            }
            SessionMessage::Prepared {
                advance_id,
                item,
                outcome,
            } => self.on_prepared(advance_id, item, outcome).await,
            SessionMessage::Recommended { advance_id, result } => {
                self.on_recommended(advance_id, result)
            }
            SessionMessage::PlaybackFinished { play_id, error } => {
                self.on_playback_finished(play_id, error)
            }
            SessionMessage::IdleElapsed { timer_id } => self.on_idle_elapsed(timer_id).await,
        }
    }

    fn set_state(&mut self, state: PlayerState) {
        if self.state != state {
            debug!(
                "Guild {} state {:?} -> {:?}",
                self.guild_id, self.state, state
            );
        }
        self.state = state;
        self.state_tx.send_replace(state);
    }

    fn notify(&self, reply: impl Into<Reply>) {
        if let Some(replies) = &self.replies {
            let _ = self.notices.send((replies.clone(), reply.into()));
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            now_playing: self.now_playing.clone(),
            upcoming: self.queue.snapshot(),
            autoplay: self.autoplay,
            connected: self.connection.is_some(),
            voice_channel: self.connection.as_ref().map(|connection| connection.channel_id()),
            idle_timer_active: self.idle_timer.is_active(),
        }
    }

    fn enqueue(&mut self, items: Vec<QueueItem>, origin: Origin) -> EnqueueOutcome {
        if let Some(channel) = origin.voice_channel {
            self.voice_channel = Some(channel);
        }
        if let Some(replies) = origin.replies {
            self.replies = Some(replies);
        }

        let position = self.queue.len() + 1;
        let mut queue_len = self.queue.len();
        for item in items {
            queue_len = self.queue.enqueue(item);
        }
        self.idle_timer.cancel();

        // Queued tracks win over a lookup that has not answered yet; its
        // answer arrives stale and is dropped.
        if self.recommending && !self.queue.is_empty() {
            info!(
                "Guild {} got new tracks, dropping the pending autoplay lookup",
                self.guild_id
            );
            self.pending_advance = None;
            self.recommending = false;
        }

        let started =
            self.active_play.is_none() && self.pending_advance.is_none() && !self.queue.is_empty();
        if started {
            self.recommendation_spent = false;
            self.advance();
        }

        debug!(
            "Guild {} enqueued at #{}, queue length {}",
            self.guild_id, position, queue_len
        );
        EnqueueOutcome {
            position,
            queue_len,
            started,
        }
    }

    /// Move to the next thing to play. Never awaits: resolution and connection
    /// run in a spawned task that reports back with `Prepared`.
    fn advance(&mut self) {
        if self.pending_advance.is_some() || self.active_play.is_some() {
            return;
        }

        if self.queue.is_empty() {
            self.on_queue_drained();
            return;
        }

        if self.connection.is_none() && self.voice_channel.is_none() {
            warn!(
                "Guild {} has queued tracks but no voice channel to join",
                self.guild_id
            );
            self.notify(embedded_messages::session_error(
                &MusicError::UserNotInVoiceChannel,
            ));
            self.set_state(PlayerState::Idle);
            return;
        }

        let (Some(mailbox), Some(item)) = (self.mailbox.upgrade(), self.queue.dequeue()) else {
            self.set_state(PlayerState::Idle);
            return;
        };

        let advance_id = self.begin_advance();
        // Join when disconnected; move when the requester is in another channel.
        let connect_to = match (&self.connection, self.voice_channel) {
            (Some(connection), Some(channel)) if connection.channel_id() != channel => {
                Some(channel)
            }
            (Some(_), _) => None,
            (None, channel) => channel,
        };
        info!(
            "Guild {} preparing '{}'",
            self.guild_id,
            item.display_title()
        );

        let guild_id = self.guild_id;
        let resolver = self.deps.resolver.clone();
        let transport = self.deps.transport.clone();
        let timeout = self.deps.settings.resolve_timeout;
        tokio::spawn(async move {
            let outcome = prepare(
                resolver.as_ref(),
                transport.as_ref(),
                guild_id,
                connect_to,
                timeout,
                &item.reference,
            )
            .await;
            let _ = mailbox.send(SessionMessage::Prepared {
                advance_id,
                item,
                outcome,
            });
        });
    }

    fn begin_advance(&mut self) -> u64 {
        self.next_advance_id += 1;
        self.pending_advance = Some(self.next_advance_id);
        self.recommending = false;
        self.idle_timer.cancel();
        self.set_state(PlayerState::Connecting);
        self.next_advance_id
    }

    fn on_queue_drained(&mut self) {
        if self.autoplay && !self.recommendation_spent {
            if let (Some(seed), Some(mailbox)) = (self.last_played.clone(), self.mailbox.upgrade())
            {
                self.recommendation_spent = true;
                let advance_id = self.begin_advance();
                self.recommending = true;
                info!(
                    "Guild {} queue drained, looking for a track related to '{}'",
                    self.guild_id, seed.title
                );

                let resolver = self.deps.resolver.clone();
                let timeout = self.deps.settings.resolve_timeout;
                tokio::spawn(async move {
                    let result = match tokio::time::timeout(timeout, resolver.recommend(&seed)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ResolutionError::new(&seed.title, "recommendation timed out")),
                    };
                    let _ = mailbox.send(SessionMessage::Recommended { advance_id, result });
                });
                return;
            }
        }

        self.go_idle();
    }

    /// Nothing left to do: become `Idle` and, while still connected, arm the
    /// idle disconnect.
    fn go_idle(&mut self) {
        self.now_playing = None;
        self.set_state(PlayerState::Idle);

        if self.connection.is_none() {
            return;
        }

        let timeout = self.deps.settings.idle_timeout;
        if let Some(mailbox) = self.mailbox.upgrade() {
            self.idle_timer.start(timeout, move |timer_id| {
                let _ = mailbox.send(SessionMessage::IdleElapsed { timer_id });
            });
        }
        info!(
            "Guild {} is idle, leaving voice in {:?} unless new tracks arrive",
            self.guild_id, timeout
        );
        self.notify(embedded_messages::queue_finished(timeout));
    }

    async fn on_prepared(&mut self, advance_id: u64, item: QueueItem, outcome: PrepareOutcome) {
        if self.pending_advance != Some(advance_id) {
            debug!(
                "Guild {} discarding stale preparation {}",
                self.guild_id, advance_id
            );
            if let PrepareOutcome::Ready {
                connection: Some(mut connection),
                ..
            } = outcome
            {
                if self.connection.is_none() && self.pending_advance.is_some() {
                    self.connection = Some(connection);
                } else if self.connection.is_none() {
                    connection.disconnect().await;
                }
            }
            return;
        }
        self.pending_advance = None;

        match outcome {
            PrepareOutcome::ResolveFailed(err) => {
                warn!("Guild {}: {}", self.guild_id, err);
                self.notify(embedded_messages::resolution_failed(&err));
                self.advance();
            }
            PrepareOutcome::ConnectFailed(err) => {
                error!("Guild {} failed to connect: {}", self.guild_id, err);
                self.queue.push_front(item);
                self.set_state(PlayerState::Idle);
                self.notify(embedded_messages::connect_failed(&err));
            }
            PrepareOutcome::Ready {
                mut track,
                connection,
            } => {
                if let Some(connection) = connection {
                    let channel = connection.channel_id();
                    // The transport moves an existing call in place, so the
                    // replaced handle is dropped without disconnecting.
                    if let Some(previous) = self.connection.replace(connection) {
                        info!(
                            "Guild {} moved from channel {} to {}",
                            self.guild_id,
                            previous.channel_id(),
                            channel
                        );
                    }
                }
                if track.requested_by.is_none() {
                    track.requested_by = item.requested_by.clone();
                }
                self.start_playback(item, track).await;
            }
        }
    }

    async fn start_playback(&mut self, item: QueueItem, track: ResolvedTrack) {
        let Some(mailbox) = self.mailbox.upgrade() else {
            return;
        };
        let Some(connection) = self.connection.as_mut() else {
            // Lost the connection while resolving; keep the item for a retry.
            self.queue.push_front(item);
            self.set_state(PlayerState::Idle);
            return;
        };

        self.next_play_id += 1;
        let play_id = self.next_play_id;
        connection
            .play(&track, CompletionHandle::new(play_id, mailbox))
            .await;
        self.active_play = Some(play_id);

        info!(
            "Guild {} now playing '{}' (play {})",
            self.guild_id, track.title, play_id
        );
        self.idle_timer.cancel();
        self.recommendation_spent = false;
        self.notify(embedded_messages::now_playing(&track));
        self.last_played = Some(track.clone());
        self.now_playing = Some(track);
        self.set_state(PlayerState::Playing);
    }

    fn on_recommended(&mut self, advance_id: u64, result: AudioSourceResult<QueueItem>) {
        if self.pending_advance != Some(advance_id) {
            debug!(
                "Guild {} discarding stale recommendation {}",
                self.guild_id, advance_id
            );
            return;
        }
        self.pending_advance = None;
        self.recommending = false;

        match result {
            Ok(item) => {
                self.notify(embedded_messages::recommended(&item));
                self.queue.enqueue(item);
                self.advance();
            }
            Err(err) => {
                info!("Guild {} autoplay found nothing: {}", self.guild_id, err);
                self.go_idle();
            }
        }
    }

    fn on_playback_finished(&mut self, play_id: u64, error: Option<String>) {
        if self.active_play != Some(play_id) {
            debug!(
                "Guild {} ignoring completion of stale play {}",
                self.guild_id, play_id
            );
            return;
        }
        self.active_play = None;

        if let Some(error) = error {
            warn!("Guild {} playback {} failed: {}", self.guild_id, play_id, error);
        }
        self.now_playing = None;
        self.advance();
    }

    async fn on_idle_elapsed(&mut self, timer_id: u64) {
        if !self.idle_timer.claim(timer_id) {
            debug!(
                "Guild {} ignoring cancelled idle timer {}",
                self.guild_id, timer_id
            );
            return;
        }

        if let Some(mut connection) = self.connection.take() {
            info!("Guild {} idle timeout reached, leaving voice", self.guild_id);
            connection.disconnect().await;
            self.notify(embedded_messages::idle_disconnected());
        }
    }

    async fn pause(&mut self) -> MusicResult<()> {
        match (self.state, self.connection.as_mut()) {
            (PlayerState::Playing, Some(connection)) => {
                connection.pause().await;
                self.set_state(PlayerState::Paused);
                Ok(())
            }
            _ => Err(MusicError::InvalidState("Nothing is playing".to_string())),
        }
    }

    async fn resume(&mut self) -> MusicResult<()> {
        match (self.state, self.connection.as_mut()) {
            (PlayerState::Paused, Some(connection)) => {
                connection.resume().await;
                self.set_state(PlayerState::Playing);
                Ok(())
            }
            _ => Err(MusicError::InvalidState("Nothing is paused".to_string())),
        }
    }

    async fn skip(&mut self) -> MusicResult<Option<String>> {
        match (self.state, self.connection.as_mut()) {
            (PlayerState::Playing | PlayerState::Paused, Some(connection)) => {
                connection.stop().await;
                let title = self.now_playing.as_ref().map(|track| track.title.clone());
                info!("Guild {} skipped {:?}", self.guild_id, title);
                Ok(title)
            }
            _ => Err(MusicError::InvalidState("Nothing is playing".to_string())),
        }
    }

    async fn stop(&mut self) {
        self.idle_timer.cancel();
        let cleared = self.queue.clear();
        self.pending_advance = None;
        self.active_play = None;
        self.now_playing = None;
        self.recommendation_spent = false;
        self.recommending = false;

        if let Some(mut connection) = self.connection.take() {
            connection.stop().await;
            connection.disconnect().await;
        }
        self.set_state(PlayerState::Idle);
        info!(
            "Guild {} stopped, {} queued tracks cleared",
            self.guild_id, cleared
        );
    }
}

/// Resolve `reference` and, when `connect_to` is set, join that channel.
async fn prepare(
    resolver: &dyn Resolver,
    transport: &dyn AudioTransport,
    guild_id: GuildId,
    connect_to: Option<ChannelId>,
    timeout: Duration,
    reference: &str,
) -> PrepareOutcome {
    let track = match tokio::time::timeout(timeout, resolver.resolve(reference)).await {
        Ok(Ok(track)) => track,
        Ok(Err(err)) => return PrepareOutcome::ResolveFailed(err),
        Err(_) => {
            return PrepareOutcome::ResolveFailed(ResolutionError::new(
                reference,
                format!("timed out after {:?}", timeout),
            ));
        }
    };

    let connection = match connect_to {
        Some(channel_id) => {
            match tokio::time::timeout(timeout, transport.connect(guild_id, channel_id)).await {
                Ok(Ok(connection)) => Some(connection),
                Ok(Err(err)) => return PrepareOutcome::ConnectFailed(err),
                Err(_) => {
                    return PrepareOutcome::ConnectFailed(MusicError::ConnectError(format!(
                        "timed out after {:?}",
                        timeout
                    )));
                }
            }
        }
        None => None,
    };

    PrepareOutcome::Ready { track, connection }
}

/// Deliver notices in order without making the worker wait on Discord.
fn spawn_notice_forwarder() -> UnboundedSender<(Arc<dyn ReplySink>, Reply)> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(Arc<dyn ReplySink>, Reply)>();
    tokio::spawn(async move {
        while let Some((sink, reply)) = rx.recv().await {
            sink.respond(reply).await;
        }
    });
    tx
}
