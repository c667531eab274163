//! Implements the `RelatedSongsFetcher` trait using the `yt-dlp` command-line tool.
//! Prefers the extractor's own `related_videos` list and falls back to a
//! search derived from the seed's title.

use crate::commands::music::audio_sources::track_metadata::{ResolvedTrack, YtDlpInfo};
use crate::commands::music::audio_sources::youtube::YoutubeApi;
use crate::commands::music::audio_sources::ytdlp::YtDlp;
use crate::commands::music::utils::queue_manager::QueueItem;
use serenity::async_trait;
use tracing::{debug, warn};

use super::{
    MAX_RELATED, RelatedSongsFetcher, RelatedSongsResult, autoplay_item, search_term_from_title,
};

pub struct YtDlpFetcher {
    ytdlp: YtDlp,
}

impl YtDlpFetcher {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self { ytdlp }
    }

    /// Related videos listed in the seed's own metadata, if the extractor provides any.
    async fn listed_related(&self, seed: &ResolvedTrack) -> Vec<QueueItem> {
        let Some(page_url) = &seed.page_url else {
            return Vec::new();
        };

        match self.ytdlp.info(page_url, &["--skip-download"]).await {
            Ok(info) => related_from_info(&info, page_url),
            Err(e) => {
                warn!("Failed to fetch metadata for {}: {}", page_url, e);
                Vec::new()
            }
        }
    }

    async fn searched_related(&self, seed: &ResolvedTrack) -> RelatedSongsResult {
        let search_term = search_term_from_title(&seed.title);
        debug!("Searching related tracks with term '{}'", search_term);

        let output = self
            .ytdlp
            .dump_json(
                &format!("ytsearch{}:{}", MAX_RELATED, search_term),
                &["--flat-playlist"],
            )
            .await?;

        Ok(related_from_search(&output, seed.page_url.as_deref()))
    }
}

#[async_trait]
impl RelatedSongsFetcher for YtDlpFetcher {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn fetch_related_songs(&self, seed: &ResolvedTrack) -> RelatedSongsResult {
        let listed = self.listed_related(seed).await;
        if !listed.is_empty() {
            return Ok(listed);
        }

        self.searched_related(seed).await
    }
}

/// Candidates from the `related_videos` field, skipping the seed itself.
fn related_from_info(info: &YtDlpInfo, seed_url: &str) -> Vec<QueueItem> {
    info.related_videos
        .iter()
        .filter_map(|video| {
            let url = YoutubeApi::watch_url(video.id.as_deref()?);
            (url != seed_url).then(|| autoplay_item(url, video.title.clone()))
        })
        .take(MAX_RELATED)
        .collect()
}

/// Candidates from `--flat-playlist` search output (one JSON object per line).
fn related_from_search(output: &str, seed_url: Option<&str>) -> Vec<QueueItem> {
    output
        .lines()
        .filter_map(|line| serde_json::from_str::<YtDlpInfo>(line).ok())
        .filter_map(|entry| {
            let url = entry.webpage_url.or(entry.url)?;
            // Skip the seed and anything that is not a single video (channels, playlists)
            if Some(url.as_str()) == seed_url || YoutubeApi::extract_video_id(&url).is_none() {
                return None;
            }
            Some(autoplay_item(url, entry.title))
        })
        .take(MAX_RELATED)
        .collect()
}
