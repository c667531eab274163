//! Defines `ResolvedTrack`, the playable form of a queued reference, and the
//! subset of `yt-dlp --dump-json` output it is built from.

use serde::Deserialize;
use std::time::Duration;

use super::SourceError;

/// Which extractor family produced a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Generic,
    Youtube,
    Bilibili,
}

impl SourceKind {
    /// Map a yt-dlp `extractor_key` onto a source kind.
    pub fn from_extractor(key: &str) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        if key.starts_with("youtube") {
            Some(Self::Youtube)
        } else if key.starts_with("bilibili") {
            Some(Self::Bilibili)
        } else {
            None
        }
    }
}

/// A reference resolved to a concrete stream. Transient: it is dropped once
/// playback of the item ends.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTrack {
    pub title: String,
    /// Direct media URL handed to the voice transport.
    pub stream_url: String,
    /// Canonical web page of the track, used as the seed for recommendations.
    pub page_url: Option<String>,
    pub source: SourceKind,
    pub duration: Option<Duration>,
    pub thumbnail: Option<String>,
    pub requested_by: Option<String>,
}

/// One JSON object printed by `yt-dlp -j`.
#[derive(Debug, Default, Deserialize)]
pub struct YtDlpInfo {
    pub title: Option<String>,
    /// Direct media URL of the selected format.
    pub url: Option<String>,
    pub webpage_url: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub extractor_key: Option<String>,
    #[serde(default)]
    pub entries: Vec<YtDlpInfo>,
    #[serde(default)]
    pub related_videos: Vec<RelatedVideo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelatedVideo {
    pub id: Option<String>,
    pub title: Option<String>,
}

impl YtDlpInfo {
    /// Parse the first JSON line of yt-dlp output.
    pub fn parse(output: &str) -> Result<Self, SourceError> {
        let line = output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or(SourceError::NoMetadata)?;

        Ok(serde_json::from_str(line)?)
    }

    /// Turn the metadata into a playable track. Result sets (search results,
    /// playlists) are reduced to their first entry.
    pub fn into_track(self, fallback_kind: SourceKind) -> Result<ResolvedTrack, SourceError> {
        let info = match self.entries.into_iter().next() {
            Some(first) => first,
            None => YtDlpInfo {
                entries: Vec::new(),
                ..self
            },
        };

        let stream_url = info
            .url
            .filter(|url| !url.is_empty())
            .ok_or(SourceError::NoStream)?;

        let source = info
            .extractor_key
            .as_deref()
            .and_then(SourceKind::from_extractor)
            .unwrap_or(fallback_kind);

        Ok(ResolvedTrack {
            title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
            stream_url,
            page_url: info.webpage_url,
            source,
            duration: info
                .duration
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64),
            thumbnail: info.thumbnail,
            requested_by: None,
        })
    }
}
