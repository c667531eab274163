//! Bilibili reference handling: `b23.tv` short links, `BV…` ids and legacy
//! `av<number>` ids.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

use super::SourceError;

static BV_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(BV[a-zA-Z0-9]{10})").expect("valid BV regex"));

static AV_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[/=])av(\d+)").expect("valid av regex"));

static BARE_BV_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^BV[a-zA-Z0-9]{10}$").expect("valid bare BV regex"));

pub struct BilibiliApi;

impl BilibiliApi {
    pub fn is_bilibili_url(input: &str) -> bool {
        match Url::parse(input) {
            Ok(url) => url.host_str().is_some_and(|host| {
                host == "b23.tv" || host == "bilibili.com" || host.ends_with(".bilibili.com")
            }),
            Err(_) => false,
        }
    }

    pub fn is_short_link(input: &str) -> bool {
        Url::parse(input)
            .ok()
            .and_then(|url| url.host_str().map(|host| host == "b23.tv"))
            .unwrap_or(false)
    }

    /// A reference that is nothing but a `BV…` id.
    pub fn is_bare_id(input: &str) -> bool {
        BARE_BV_REGEX.is_match(input.trim())
    }

    /// Canonical video URL for anything carrying a BV or av id.
    pub fn canonical_url(input: &str) -> Option<String> {
        if let Some(bv) = BV_REGEX.captures(input).and_then(|c| c.get(1)) {
            return Some(format!("https://www.bilibili.com/video/{}", bv.as_str()));
        }

        AV_REGEX
            .captures(input)
            .and_then(|c| c.get(1))
            .map(|av| format!("https://www.bilibili.com/video/av{}", av.as_str()))
    }

    /// Follow a short link's redirects and return the final URL.
    pub async fn expand_short_link(
        http: &reqwest::Client,
        url: &str,
    ) -> Result<String, SourceError> {
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::ShortLink {
                url: url.to_string(),
                source,
            })?;

        let expanded = response.url().to_string();
        debug!("Expanded {} to {}", url, expanded);
        Ok(expanded)
    }

    /// Normalize any Bilibili reference. Short links are expanded first; a link
    /// whose id cannot be found is returned unchanged for yt-dlp to try.
    pub async fn normalize(http: &reqwest::Client, input: &str) -> String {
        let expanded = if Self::is_short_link(input) {
            match Self::expand_short_link(http, input).await {
                Ok(url) => url,
                Err(e) => {
                    warn!("{}", e);
                    input.to_string()
                }
            }
        } else {
            input.to_string()
        };

        Self::canonical_url(&expanded).unwrap_or(expanded)
    }
}
