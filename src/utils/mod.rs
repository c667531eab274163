//! This module aggregates various utility submodules used throughout the application.

/// Utilities for interacting with the application's SQLite database.
pub mod database;
/// Pure editing operations on a user's playlists.
pub mod playlists;
