//! This module defines the trait and implementations for fetching songs related
//! to a previously played track, used by the autoplay fallback.

/// Implementation using the SerpAPI (Google Search Results API).
pub mod serp_api;
/// Implementation using `yt-dlp` to extract related videos.
pub mod ytdl;

use crate::commands::music::audio_sources::{SourceError, track_metadata::ResolvedTrack};
use crate::commands::music::utils::queue_manager::QueueItem;
use serenity::async_trait;

/// Name recorded as the requester of tracks picked by autoplay.
pub const AUTOPLAY_REQUESTER: &str = "Autoplay";

/// How many candidates a single fetcher returns at most.
pub const MAX_RELATED: usize = 5;

/// A specialized `Result` type for related song fetching operations.
pub type RelatedSongsResult = Result<Vec<QueueItem>, SourceError>;

/// Defines the common interface for fetching tracks related to a seed track.
#[async_trait]
pub trait RelatedSongsFetcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Candidate references related to `seed`, best match first. An empty list
    /// means "nothing found", not an error.
    async fn fetch_related_songs(&self, seed: &ResolvedTrack) -> RelatedSongsResult;
}

/// Build the queue item for a related-track candidate.
pub(crate) fn autoplay_item(url: String, title: Option<String>) -> QueueItem {
    let item = QueueItem::new(url).requested_by(AUTOPLAY_REQUESTER);
    match title {
        Some(title) => item.with_title(title),
        None => item,
    }
}

/// Derive a loose search term from a title, for when no related list exists.
/// `"Artist - Song"` becomes `"Artist music"`; otherwise the first two words.
pub(crate) fn search_term_from_title(title: &str) -> String {
    if let Some((artist, _)) = title.split_once(" - ") {
        return format!("{} music", artist.trim());
    }

    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() > 2 {
        words[0..2].join(" ")
    } else {
        "music".to_string()
    }
}
