//! Library root for the Rusty DJ bot: per-guild playback scheduling, the
//! commands that drive it, and the small amount of persistence it needs.

use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod utils;

use commands::music::utils::music_manager::SessionRegistry;
use config::Config;
use utils::database::PlaylistStore;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// User data shared by every command invocation.
pub struct Data {
    /// One playback session per guild.
    pub registry: Arc<SessionRegistry>,
    /// Durable per-user playlists.
    pub playlists: Arc<dyn PlaylistStore>,
    pub config: Config,
}
