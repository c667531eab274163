//! This module aggregates all the command modules for the bot.

/// Commands related to music playback and saved playlists.
pub mod music;
