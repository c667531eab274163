//! Editing operations on a user's loaded playlists.
//!
//! Pure functions over [`Playlists`]; callers load, edit, then save. Track
//! positions are 1-based like the queue's.

use rand::seq::SliceRandom;

use crate::commands::music::utils::music_manager::{MusicError, MusicResult};
use crate::utils::database::Playlists;

fn validate_name(name: &str) -> MusicResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MusicError::InvalidState(
            "Playlist names cannot be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn playlist_mut<'a>(playlists: &'a mut Playlists, name: &str) -> MusicResult<&'a mut Vec<String>> {
    let name = validate_name(name)?;
    playlists
        .get_mut(&name)
        .ok_or(MusicError::PlaylistNotFound(name))
}

fn index_of(tracks: &[String], position: usize) -> MusicResult<usize> {
    if position == 0 || position > tracks.len() {
        return Err(MusicError::IndexOutOfRange {
            position,
            len: tracks.len(),
        });
    }
    Ok(position - 1)
}

/// Create an empty playlist.
pub fn create(playlists: &mut Playlists, name: &str) -> MusicResult<()> {
    let name = validate_name(name)?;
    if playlists.contains_key(&name) {
        return Err(MusicError::PlaylistExists(name));
    }
    playlists.insert(name, Vec::new());
    Ok(())
}

/// Delete a playlist, returning its tracks.
pub fn delete(playlists: &mut Playlists, name: &str) -> MusicResult<Vec<String>> {
    let name = validate_name(name)?;
    playlists
        .remove(&name)
        .ok_or(MusicError::PlaylistNotFound(name))
}

/// Append a reference, returning the playlist's new length.
pub fn add(playlists: &mut Playlists, name: &str, reference: &str) -> MusicResult<usize> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(MusicError::InvalidState(
            "Give me a URL or something to search for".to_string(),
        ));
    }

    let tracks = playlist_mut(playlists, name)?;
    tracks.push(reference.to_string());
    Ok(tracks.len())
}

/// Remove the reference at a 1-based position.
pub fn remove(playlists: &mut Playlists, name: &str, position: usize) -> MusicResult<String> {
    let tracks = playlist_mut(playlists, name)?;
    let index = index_of(tracks, position)?;
    Ok(tracks.remove(index))
}

/// Move a reference between 1-based positions, keeping the others in order.
pub fn move_track(
    playlists: &mut Playlists,
    name: &str,
    from: usize,
    to: usize,
) -> MusicResult<String> {
    let tracks = playlist_mut(playlists, name)?;
    let from_index = index_of(tracks, from)?;
    let to_index = index_of(tracks, to)?;

    let reference = tracks.remove(from_index);
    tracks.insert(to_index, reference.clone());
    Ok(reference)
}

/// Shuffle a playlist in place, returning its length.
pub fn shuffle(playlists: &mut Playlists, name: &str) -> MusicResult<usize> {
    let tracks = playlist_mut(playlists, name)?;
    tracks.shuffle(&mut rand::rng());
    Ok(tracks.len())
}

/// The references of a playlist that is about to be queued.
pub fn tracks<'a>(playlists: &'a Playlists, name: &str) -> MusicResult<&'a [String]> {
    let name = validate_name(name)?;
    match playlists.get(&name) {
        Some(tracks) if tracks.is_empty() => Err(MusicError::EmptyPlaylist(name)),
        Some(tracks) => Ok(tracks),
        None => Err(MusicError::PlaylistNotFound(name)),
    }
}
