use crate::commands::music::audio_sources::{SourceError, track_metadata::ResolvedTrack};
use crate::commands::music::audio_sources::youtube::YoutubeApi;
use crate::commands::music::utils::queue_manager::QueueItem;
use serenity::async_trait;
use serpapi_search_rust::serp_api_search::SerpApiSearch;
use std::collections::HashMap;

use super::{MAX_RELATED, RelatedSongsFetcher, RelatedSongsResult, autoplay_item};

/// SerpAPI implementation for fetching related songs. Only YouTube seeds are supported.
pub struct SerpApiFetcher {
    api_key: String,
}

impl SerpApiFetcher {
    pub fn new(api_key: String) -> Self {
        Self { api_key }
    }
}

#[async_trait]
impl RelatedSongsFetcher for SerpApiFetcher {
    fn name(&self) -> &'static str {
        "serpapi"
    }

    async fn fetch_related_songs(&self, seed: &ResolvedTrack) -> RelatedSongsResult {
        let Some(video_id) = seed
            .page_url
            .as_deref()
            .and_then(YoutubeApi::extract_video_id)
        else {
            return Ok(Vec::new());
        };

        let mut params: HashMap<String, String> = HashMap::new();
        params.insert("v".to_string(), video_id.clone());

        let search = SerpApiSearch::new("youtube_video".to_string(), params, self.api_key.clone());

        let results = search
            .json()
            .await
            .map_err(|e| SourceError::SerpApi(e.to_string()))?;

        Ok(parse_related_videos(results.get("related_videos"), &video_id))
    }
}

/// Turn SerpAPI's `related_videos` array into queue items.
fn parse_related_videos(related: Option<&serde_json::Value>, seed_id: &str) -> Vec<QueueItem> {
    let Some(videos) = related.and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    videos
        .iter()
        .filter_map(|video| {
            let title = video.get("title").and_then(|t| t.as_str())?;
            let link = video.get("link").and_then(|l| l.as_str())?;
            let id = YoutubeApi::extract_video_id(link)?;
            (id != seed_id).then(|| autoplay_item(YoutubeApi::watch_url(&id), Some(title.to_string())))
        })
        .take(MAX_RELATED)
        .collect()
}
