//! Stream provider trait and common types.
//!
//! A [`StreamProvider`] turns a catalog `(category, id)` pair into a
//! [`ResolvedStream`]: a final manifest URL plus what the DRM-capable
//! player needs to fetch a license.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::license::{create_license_key, KeyType};

/// Catalog section a content id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Episodes,
    Movies,
    Channels,
}

impl Category {
    /// Path segment used by the video configuration endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Episodes => "episodes",
            Category::Movies => "movies",
            Category::Channels => "channels",
        }
    }

    /// Episodes belong to a program whose title is shown alongside.
    pub fn has_program(self) -> bool {
        matches!(self, Category::Episodes)
    }

    /// Live channels have no duration.
    pub fn has_duration(self) -> bool {
        !matches!(self, Category::Channels)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "episodes" | "episode" => Ok(Category::Episodes),
            "movies" | "movie" => Ok(Category::Movies),
            "channels" | "channel" => Ok(Category::Channels),
            other => Err(format!(
                "unknown category '{other}' (expected episodes, movies or channels)"
            )),
        }
    }
}

/// Streaming format of a manifest URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Dash,
    Hls,
    Unknown,
}

impl ManifestKind {
    /// Name the player expects for its manifest type property.
    pub fn as_str(self) -> &'static str {
        match self {
            ManifestKind::Dash => "mpd",
            ManifestKind::Hls => "hls",
            ManifestKind::Unknown => "unknown",
        }
    }
}

/// Fully resolved playback target for a single content id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStream {
    /// Parent program title (episodes only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_title: Option<String>,
    pub title: String,
    /// Duration in seconds (`None` for live channels).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    pub manifest_url: String,
    pub license_url: String,
    /// `Cookie` header value for manifest and segment requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookies: Option<String>,
}

impl ResolvedStream {
    pub fn manifest_kind(&self) -> ManifestKind {
        let path = self
            .manifest_url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        if path.ends_with(".mpd") {
            ManifestKind::Dash
        } else if path.ends_with(".m3u8") {
            ManifestKind::Hls
        } else {
            ManifestKind::Unknown
        }
    }

    /// License key descriptor for this stream's license URL.
    pub fn license_key(
        &self,
        key_type: KeyType,
        headers: &[(&str, &str)],
        key_value: Option<&str>,
    ) -> Result<String> {
        create_license_key(&self.license_url, key_type, headers, key_value)
    }
}

/// Trait for services that resolve catalog ids into playable streams.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Short lowercase provider name (e.g., `"anvato"`).
    fn name(&self) -> &'static str;

    /// Resolve `id` in `category` into a playable stream.
    async fn resolve(&self, category: Category, id: &str) -> Result<ResolvedStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(url: &str) -> ResolvedStream {
        ResolvedStream {
            program_title: None,
            title: "t".into(),
            duration_seconds: None,
            manifest_url: url.into(),
            license_url: "https://lic.test/wv".into(),
            session_cookies: None,
        }
    }

    #[test]
    fn category_parse_and_display() {
        assert_eq!("episodes".parse::<Category>().unwrap(), Category::Episodes);
        assert_eq!("Movie".parse::<Category>().unwrap(), Category::Movies);
        assert_eq!(Category::Channels.to_string(), "channels");
        assert!("podcasts".parse::<Category>().is_err());
    }

    #[test]
    fn category_field_selection() {
        assert!(Category::Episodes.has_program());
        assert!(!Category::Movies.has_program());
        assert!(Category::Movies.has_duration());
        assert!(!Category::Channels.has_duration());
    }

    #[test]
    fn manifest_kind_from_url() {
        assert_eq!(stream("https://x/a.mpd?t=1").manifest_kind(), ManifestKind::Dash);
        assert_eq!(stream("https://x/master.M3U8").manifest_kind(), ManifestKind::Hls);
        assert_eq!(stream("https://x/play").manifest_kind(), ManifestKind::Unknown);
    }

    #[test]
    fn license_key_uses_license_url() {
        let key = stream("https://x/a.mpd")
            .license_key(KeyType::R, &[], None)
            .unwrap();
        assert_eq!(key, "https://lic.test/wv||R{SSM}|");
    }

    #[test]
    fn serializes_without_absent_fields() {
        let json = serde_json::to_value(stream("https://x/a.mpd")).unwrap();
        assert!(json.get("program_title").is_none());
        assert_eq!(json["license_url"], "https://lic.test/wv");
    }
}
