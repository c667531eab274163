//! YouTube reference handling: recognising the many URL shapes YouTube uses
//! and reducing them to one canonical watch URL.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Video ids are 11 characters of `[A-Za-z0-9_-]`.
static VIDEO_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]{11}$").expect("valid video id regex"));

const YOUTUBE_HOSTS: [&str; 4] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

pub struct YoutubeApi;

impl YoutubeApi {
    /// Checks if the input is a URL on one of YouTube's hosts.
    pub fn is_youtube_url(query: &str) -> bool {
        match Url::parse(query) {
            Ok(url) => url
                .host_str()
                .is_some_and(|host| host == "youtu.be" || YOUTUBE_HOSTS.contains(&host)),
            Err(_) => false,
        }
    }

    /// Extracts the video id from watch, short-link, shorts, embed and `/v/` URLs.
    pub fn extract_video_id(input: &str) -> Option<String> {
        let url = Url::parse(input).ok()?;
        let host = url.host_str()?;

        let candidate = if host == "youtu.be" {
            url.path_segments()?.next().map(str::to_string)
        } else if YOUTUBE_HOSTS.contains(&host) {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("shorts" | "embed" | "v" | "live") => segments.next().map(str::to_string),
                _ => None,
            }
        } else {
            None
        }?;

        VIDEO_ID_REGEX
            .is_match(&candidate)
            .then_some(candidate)
    }

    /// Canonical watch URL for any recognised YouTube video link.
    pub fn canonical_url(input: &str) -> Option<String> {
        Self::extract_video_id(input).map(|id| Self::watch_url(&id))
    }

    pub fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }
}
