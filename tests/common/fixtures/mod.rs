//! Test fixtures for the Rusty DJ bot
//! This module contains sample ids, references and tracks used in tests

use fake::Fake;
use fake::faker::lorem::en::Words;
use poise::serenity_prelude::{ChannelId, GuildId};
use rusty_dj::commands::music::audio_sources::track_metadata::{ResolvedTrack, SourceKind};
use rusty_dj::commands::music::utils::guild_session::SessionSettings;
use std::time::Duration;

/// Sample guild ID for testing
pub const SAMPLE_GUILD_ID: u64 = 111222333;

/// Sample voice channel ID for testing
pub const SAMPLE_VOICE_CHANNEL_ID: u64 = 987654321;

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

pub fn guild_id() -> GuildId {
    GuildId::new(SAMPLE_GUILD_ID)
}

pub fn voice_channel() -> ChannelId {
    ChannelId::new(SAMPLE_VOICE_CHANNEL_ID)
}

/// A random free-text reference, like a user's search query.
pub fn search_reference() -> String {
    let words: Vec<String> = Words(2..5).fake();
    words.join(" ")
}

/// The track a fake resolver produces for `reference`.
pub fn track_for(reference: &str) -> ResolvedTrack {
    ResolvedTrack {
        title: reference.to_string(),
        stream_url: format!("https://cdn.test/{}", reference.replace(' ', "-")),
        page_url: Some(format!("https://video.test/{}", reference.replace(' ', "-"))),
        source: SourceKind::Generic,
        duration: Some(Duration::from_secs(180)),
        thumbnail: None,
        requested_by: None,
    }
}

pub fn settings(autoplay: bool) -> SessionSettings {
    SessionSettings {
        idle_timeout: IDLE_TIMEOUT,
        resolve_timeout: Duration::from_secs(10),
        autoplay_default: autoplay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_data() {
        assert!(!search_reference().is_empty());
        assert_eq!(guild_id().get(), SAMPLE_GUILD_ID);
        assert_eq!(track_for("a b").stream_url, "https://cdn.test/a-b");
    }
}
