use super::music_manager::MusicError;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

/// A raw, unresolved track reference waiting in a guild's queue.
///
/// The reference is only turned into a playable stream when it reaches the
/// front of the queue, since stream locators expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    /// URL or free-text search query, exactly as the user supplied it.
    pub reference: String,
    /// Display title, when one is already known (e.g. autoplay picks).
    pub title: Option<String>,
    pub requested_by: Option<String>,
}

impl QueueItem {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            title: None,
            requested_by: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn requested_by(mut self, name: impl Into<String>) -> Self {
        self.requested_by = Some(name.into());
        self
    }

    /// The title if known, otherwise the raw reference.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.reference)
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, MusicError>;

/// Ordered collection of pending tracks for one guild.
///
/// Positions in the public API are 1-based, matching what users see in the
/// queue listing.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    items: VecDeque<QueueItem>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track, returning the new queue length.
    pub fn enqueue(&mut self, item: QueueItem) -> usize {
        self.items.push_back(item);
        self.items.len()
    }

    /// Put a track back at the front, e.g. after a failed voice connection.
    pub fn push_front(&mut self, item: QueueItem) {
        self.items.push_front(item);
    }

    pub fn dequeue(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    /// Remove the track at a 1-based position.
    pub fn remove_at(&mut self, position: usize) -> QueueResult<QueueItem> {
        let index = self.index_of(position)?;
        self.items
            .remove(index)
            .ok_or(MusicError::IndexOutOfRange {
                position,
                len: self.items.len(),
            })
    }

    /// Move the track at `from` so that it ends up at `to` (both 1-based).
    /// Every other track keeps its relative order.
    pub fn move_to(&mut self, from: usize, to: usize) -> QueueResult<QueueItem> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;

        let item = self
            .items
            .remove(from_index)
            .ok_or(MusicError::IndexOutOfRange {
                position: from,
                len: self.items.len(),
            })?;
        self.items.insert(to_index, item.clone());

        Ok(item)
    }

    pub fn shuffle(&mut self) {
        self.items.make_contiguous().shuffle(&mut rand::rng());
    }

    /// Owned copy of the pending tracks, front first.
    pub fn snapshot(&self) -> Vec<QueueItem> {
        self.items.iter().cloned().collect()
    }

    /// Drop every pending track, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn index_of(&self, position: usize) -> QueueResult<usize> {
        if position == 0 || position > self.items.len() {
            return Err(MusicError::IndexOutOfRange {
                position,
                len: self.items.len(),
            });
        }
        Ok(position - 1)
    }
}
