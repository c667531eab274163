use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::CreateEmbed;
use std::time::Duration;

use crate::commands::music::audio_sources::{ResolutionError, track_metadata::ResolvedTrack};
use crate::utils::database::Playlists;

use super::{
    format_duration,
    guild_session::{PlayerState, SessionSnapshot},
    music_manager::MusicError,
    queue_manager::QueueItem,
};

const GREEN: u32 = 0x00ff00;
const RED: u32 = 0xff0000;
const YELLOW: u32 = 0xffcc00;

/// Discord rejects embed descriptions longer than this, in characters.
const DESCRIPTION_LIMIT: usize = 4096;
/// Entries shown in a listing before the rest is summarised.
const MAX_LISTED: usize = 20;
/// Room kept free after a queue listing for the voice-channel line.
const QUEUE_FOOTER_ROOM: usize = 64;

/// Markdown link for a track, or its bare title when no page is known.
fn track_link(track: &ResolvedTrack) -> String {
    match &track.page_url {
        Some(url) => format!("[{}]({})", track.title, url),
        None => track.title.clone(),
    }
}

/// Markdown link for a queued reference.
fn item_link(item: &QueueItem) -> String {
    if item.title.is_some() && item.reference.starts_with("http") {
        format!("[{}]({})", item.display_title(), item.reference)
    } else {
        item.display_title().to_string()
    }
}

/// Keycap number for the first ten queue positions, a bullet after that.
fn queue_number(index: usize) -> String {
    match index {
        0..=8 => format!("{}\u{FE0F}\u{20E3}", index + 1),
        9 => "🔟".to_string(),
        _ => "•".to_string(),
    }
}

/// One line per entry, stopping at `MAX_LISTED` entries or `budget`
/// characters, with a closing count of whatever was left out.
fn capped_listing(lines: Vec<String>, budget: usize) -> String {
    let total = lines.len();
    let summary = format!("…and {} more", total);
    let budget = budget.saturating_sub(summary.chars().count());

    let mut listing = String::new();
    let mut used = 0;
    let mut shown = 0;
    for line in lines.into_iter().take(MAX_LISTED) {
        let len = line.chars().count() + 1;
        if used + len > budget {
            break;
        }
        listing.push_str(&line);
        listing.push('\n');
        used += len;
        shown += 1;
    }

    if shown < total {
        listing.push_str(&format!("…and {} more", total - shown));
    }
    listing
}

fn error_embed(description: impl Into<String>) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Error")
        .description(description)
        .color(RED)
}

/// Create an embed for when a song is now playing
pub fn now_playing(track: &ResolvedTrack) -> CreateEmbed {
    let duration_str = track
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string());

    let mut embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(track_link(track))
        .field("Duration", format!("`{}`", duration_str), true)
        .color(GREEN);

    if let Some(requested_by) = &track.requested_by {
        embed = embed.field("Requested by", requested_by, true);
    }
    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail);
    }

    embed
}

/// Create an embed for a queued reference that could not be resolved
pub fn resolution_failed(err: &ResolutionError) -> CreateEmbed {
    CreateEmbed::new()
        .title("⚠️ Skipped Track")
        .description(format!("`{}` could not be played: {}", err.reference, err.reason))
        .color(YELLOW)
}

/// Create an embed for a track picked by autoplay
pub fn recommended(item: &QueueItem) -> CreateEmbed {
    CreateEmbed::new()
        .title("🔄 Autoplay")
        .description(format!("Up next: {}", item_link(item)))
        .color(GREEN)
}

/// Create an embed for when the queue has run out
pub fn queue_finished(idle_timeout: Duration) -> CreateEmbed {
    CreateEmbed::new()
        .title("📭 Queue Finished")
        .description(format!(
            "Nothing left to play. I will leave the voice channel in {}",
            format_duration(idle_timeout)
        ))
        .color(GREEN)
}

/// Create an embed for when joining the voice channel failed
pub fn connect_failed(err: &MusicError) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Connection Failed")
        .description(format!("{}. The queue was kept, use play to retry", err))
        .color(RED)
}

/// Create an embed for when the bot left after being idle
pub fn idle_disconnected() -> CreateEmbed {
    CreateEmbed::new()
        .title("👋 Left Voice Channel")
        .description("Left the voice channel after being idle")
        .color(GREEN)
}

/// Create an embed for a session problem that is not tied to a command
pub fn session_error(err: &MusicError) -> CreateEmbed {
    error_embed(err.to_string())
}

/// Create the reply for a reference added to the queue
pub fn added_to_queue(item: &QueueItem, position: usize, started: bool) -> CreateReply {
    let embed = if started {
        CreateEmbed::new()
            .title("🔎 Loading")
            .description(format!("Fetching {}", item_link(item)))
            .color(GREEN)
    } else {
        CreateEmbed::new()
            .title("🎵 Added to Queue")
            .description(item_link(item))
            .field("Position", format!("`#{}`", position), true)
            .color(GREEN)
    };

    CreateReply::default().embed(embed)
}

/// Create the reply for several references queued by one command
pub fn added_many_to_queue(count: usize, position: usize, started: bool) -> CreateReply {
    let mut description = format!("Added {} tracks starting at `#{}`", count, position);
    if started {
        description.push_str("\nStarting playback");
    }

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🎵 Added to Queue")
            .description(description)
            .color(GREEN),
    )
}

/// Create an embed for the music queue
pub fn music_queue(snapshot: &SessionSnapshot) -> CreateEmbed {
    let mut description = String::new();

    match (&snapshot.now_playing, snapshot.state) {
        (Some(track), state) => {
            let heading = if state == PlayerState::Paused {
                "**⏸️ Paused**\n"
            } else {
                "**🎵 Now Playing**\n"
            };
            description.push_str(heading);
            description.push_str(&format!("**{}**", track_link(track)));
            if let Some(duration) = track.duration {
                description.push_str(&format!(" `{}`", format_duration(duration)));
            }
            description.push_str("\n\n");
        }
        (None, PlayerState::Connecting) => description.push_str("**🔎 Loading next track**\n\n"),
        (None, _) => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    if snapshot.upcoming.is_empty() {
        description.push_str("**📭 Queue is empty**");
    } else {
        description.push_str(&format!(
            "**📋 Queue - {} tracks**\n",
            snapshot.upcoming.len()
        ));
        let lines = snapshot
            .upcoming
            .iter()
            .enumerate()
            .map(|(index, item)| format!("{} {}", queue_number(index), item_link(item)))
            .collect();
        let budget = DESCRIPTION_LIMIT
            .saturating_sub(description.chars().count() + QUEUE_FOOTER_ROOM);
        description.push_str(&capped_listing(lines, budget));
    }

    if let Some(channel) = snapshot.voice_channel {
        description.push_str(&format!("\n🔊 Connected to <#{}>", channel));
    }

    CreateEmbed::new()
        .title("🎵 Music Queue")
        .description(description)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Autoplay: {}",
            if snapshot.autoplay { "on" } else { "off" }
        )))
        .color(GREEN)
}

/// Create the reply for an expected command failure
pub fn error(err: &MusicError) -> CreateReply {
    let ephemeral = matches!(
        err,
        MusicError::UserNotInVoiceChannel | MusicError::NotInGuild
    );
    CreateReply::default()
        .embed(error_embed(err.to_string()))
        .ephemeral(ephemeral)
}

/// Create an embed for when a track is paused
pub fn paused() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏸️ Paused")
            .description("Playback paused")
            .color(GREEN),
    )
}

/// Create an embed for when a track is resumed
pub fn resumed() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("▶️ Resumed")
            .description("Playback resumed")
            .color(GREEN),
    )
}

/// Create an embed for when a track is skipped
pub fn skipped(title: Option<&str>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏭️ Skipped")
            .description(match title {
                Some(title) => format!("Skipped {}", title),
                None => "Skipped the current track".to_string(),
            })
            .color(GREEN),
    )
}

/// Create an embed for when the bot stops playing music
pub fn stopped() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏹️ Stopped")
            .description("Playback stopped and queue cleared")
            .color(GREEN),
    )
}

/// Create an embed for when the bot leaves a voice channel
pub fn left_voice_channel() -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("👋 Left Voice Channel")
            .description("Successfully disconnected and cleared the queue")
            .color(GREEN),
    )
}

/// Create an embed for when autoplay is enabled or disabled
pub fn autoplay_status(enabled: bool) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(if enabled {
                "🔄 Autoplay Enabled"
            } else {
                "⏹️ Autoplay Disabled"
            })
            .description(if enabled {
                "I will automatically play related songs when the queue is empty"
            } else {
                "I will stop playing when the queue is empty"
            })
            .color(if enabled { GREEN } else { RED }),
    )
}

/// Create an embed for when a track is removed from the queue
pub fn track_removed(item: &QueueItem, position: usize) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🗑️ Track Removed")
            .description(format!(
                "Removed {} from position #{}",
                item_link(item),
                position
            ))
            .color(GREEN),
    )
}

pub fn track_moved(item: &QueueItem, to: usize) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("↕️ Track Moved")
            .description(format!("Moved {} to position #{}", item_link(item), to))
            .color(GREEN),
    )
}

pub fn shuffled(count: usize) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("🔀 Shuffled")
            .description(format!("Shuffled {} tracks", count))
            .color(GREEN),
    )
}

/// Create the reply for a playlist copied into the queue
pub fn playlist_queued(name: &str, count: usize, started: bool) -> CreateReply {
    let mut description = format!("Added {} tracks from **{}** to the queue", count, name);
    if started {
        description.push_str("\nStarting playback");
    }

    CreateReply::default().embed(
        CreateEmbed::new()
            .title("📜 Playlist Queued")
            .description(description)
            .color(GREEN),
    )
}

/// Create the reply for a successful playlist edit
pub fn playlist_updated(title: &str, description: impl Into<String>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(format!("📜 {}", title))
            .description(description)
            .color(GREEN),
    )
}

/// Create the listing of a user's playlists, or of one playlist's tracks
pub fn playlists(playlists: &Playlists, name: Option<&str>) -> CreateReply {
    let embed = match name.and_then(|name| playlists.get(name).map(|tracks| (name, tracks))) {
        Some((name, tracks)) if !tracks.is_empty() => {
            let lines = tracks
                .iter()
                .enumerate()
                .map(|(index, reference)| format!("`{}.` {}", index + 1, reference))
                .collect();
            CreateEmbed::new()
                .title(format!("📜 {}", name))
                .description(capped_listing(lines, DESCRIPTION_LIMIT))
        }
        Some((name, _)) => CreateEmbed::new()
            .title(format!("📜 {}", name))
            .description("This playlist is empty"),
        None if playlists.is_empty() => CreateEmbed::new()
            .title("📜 Your Playlists")
            .description("You have no playlists yet"),
        None => {
            let lines = playlists
                .iter()
                .map(|(name, tracks)| format!("**{}** - {} tracks", name, tracks.len()))
                .collect();
            CreateEmbed::new()
                .title("📜 Your Playlists")
                .description(capped_listing(lines, DESCRIPTION_LIMIT))
        }
    };

    CreateReply::default().embed(embed.color(GREEN)).ephemeral(true)
}
