//! This module turns raw track references into playable streams.
//! It normalizes the URL shapes of the supported platforms, runs `yt-dlp`
//! for the actual lookup, and asks the related-song fetchers for autoplay
//! recommendations.

/// Submodule for Bilibili short links and video ids.
pub mod bilibili;
/// Submodule for finding related songs, used by autoplay.
pub mod related_songs;
/// Submodule defining `ResolvedTrack` and the yt-dlp metadata model.
pub mod track_metadata;
/// Submodule for YouTube URL normalization.
pub mod youtube;
/// Submodule wrapping the `yt-dlp` binary.
pub mod ytdlp;

use crate::commands::music::utils::queue_manager::QueueItem;
use bilibili::BilibiliApi;
use related_songs::{RelatedSongsFetcher, serp_api::SerpApiFetcher, ytdl::YtDlpFetcher};
use serenity::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};
use track_metadata::{ResolvedTrack, SourceKind};
use url::Url;
use youtube::YoutubeApi;
use ytdlp::YtDlp;

/// A reference could not be turned into a playable track.
///
/// Non-fatal for a session: the item is skipped and the queue moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not resolve '{reference}': {reason}")]
pub struct ResolutionError {
    pub reference: String,
    pub reason: String,
}

impl ResolutionError {
    pub fn new(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

/// A specialized `Result` type for operations within the `audio_sources` module.
pub type AudioSourceResult<T> = Result<T, ResolutionError>;

/// Failures of the tools and services behind the resolver.
///
/// These stay inside `audio_sources`; a session only ever sees them as the
/// reason of a [`ResolutionError`].
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// yt-dlp exited unsuccessfully; holds its last stderr line.
    #[error("{0}")]
    ToolFailed(String),

    #[error("yt-dlp returned no metadata")]
    NoMetadata,

    #[error("Failed to parse video metadata: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no playable stream in metadata")]
    NoStream,

    #[error("Failed to expand short link {url}: {source}")]
    ShortLink {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("SerpAPI request failed: {0}")]
    SerpApi(String),
}

/// What a session needs from the outside world to find something to play.
///
/// Both operations are side-effect free and may be retried.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a URL or search text to a playable stream.
    async fn resolve(&self, reference: &str) -> AudioSourceResult<ResolvedTrack>;

    /// Pick a track related to `seed` for autoplay.
    async fn recommend(&self, seed: &ResolvedTrack) -> AudioSourceResult<QueueItem>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as a URL.
    /// Does not validate if the URL is actually reachable or supported.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok()
    }
}

/// A reference after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Url { url: String, kind: SourceKind },
    Search(String),
}

impl Lookup {
    /// Normalize a user-supplied reference. Only Bilibili short links touch
    /// the network.
    pub async fn from_reference(http: &reqwest::Client, reference: &str) -> Self {
        let reference = reference.trim();

        if BilibiliApi::is_bare_id(reference) {
            if let Some(url) = BilibiliApi::canonical_url(reference) {
                return Self::Url {
                    url,
                    kind: SourceKind::Bilibili,
                };
            }
        }

        if !AudioSource::is_url(reference) {
            return Self::Search(reference.to_string());
        }

        if YoutubeApi::is_youtube_url(reference) {
            return Self::Url {
                url: YoutubeApi::canonical_url(reference).unwrap_or_else(|| reference.to_string()),
                kind: SourceKind::Youtube,
            };
        }

        if BilibiliApi::is_bilibili_url(reference) {
            return Self::Url {
                url: BilibiliApi::normalize(http, reference).await,
                kind: SourceKind::Bilibili,
            };
        }

        Self::Url {
            url: reference.to_string(),
            kind: SourceKind::Generic,
        }
    }

    /// The argument handed to yt-dlp and the kind assumed when its output
    /// does not name an extractor.
    fn target(&self) -> (String, SourceKind) {
        match self {
            Self::Url { url, kind } => (url.clone(), *kind),
            Self::Search(query) => (format!("ytsearch1:{}", query), SourceKind::Youtube),
        }
    }
}

/// `Resolver` backed by `yt-dlp`, with SerpAPI as an optional extra source of
/// recommendations.
pub struct YtDlpResolver {
    ytdlp: YtDlp,
    http: reqwest::Client,
    related: Vec<Box<dyn RelatedSongsFetcher>>,
}

impl YtDlpResolver {
    pub fn new(ytdlp: YtDlp, http: reqwest::Client, serp_api_key: Option<String>) -> Self {
        let mut related: Vec<Box<dyn RelatedSongsFetcher>> = Vec::new();
        if let Some(key) = serp_api_key {
            related.push(Box::new(SerpApiFetcher::new(key)));
        }
        related.push(Box::new(YtDlpFetcher::new(ytdlp.clone())));

        Self {
            ytdlp,
            http,
            related,
        }
    }
}

#[async_trait]
impl Resolver for YtDlpResolver {
    async fn resolve(&self, reference: &str) -> AudioSourceResult<ResolvedTrack> {
        if reference.trim().is_empty() {
            return Err(ResolutionError::new(reference, "empty reference"));
        }

        let lookup = Lookup::from_reference(&self.http, reference).await;
        debug!("Resolving '{}' as {:?}", reference, lookup);

        let (target, kind) = lookup.target();
        let info = self
            .ytdlp
            .info(&target, &["-f", "bestaudio/best"])
            .await
            .map_err(|e| ResolutionError::new(reference, e.to_string()))?;

        info.into_track(kind)
            .map_err(|e| ResolutionError::new(reference, e.to_string()))
    }

    async fn recommend(&self, seed: &ResolvedTrack) -> AudioSourceResult<QueueItem> {
        for fetcher in &self.related {
            match fetcher.fetch_related_songs(seed).await {
                Ok(candidates) => {
                    let pick = candidates
                        .into_iter()
                        .find(|item| Some(&item.reference) != seed.page_url.as_ref());
                    if let Some(item) = pick {
                        info!(
                            "{} recommended '{}' after '{}'",
                            fetcher.name(),
                            item.display_title(),
                            seed.title
                        );
                        return Ok(item);
                    }
                    debug!("{} had no related tracks for '{}'", fetcher.name(), seed.title);
                }
                Err(e) => warn!("{} failed for '{}': {}", fetcher.name(), seed.title, e),
            }
        }

        Err(ResolutionError::new(&seed.title, "no related tracks found"))
    }
}
