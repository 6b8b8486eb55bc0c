//! Final manifest location lookup.
//!
//! The published manifest URL may answer with the real location instead
//! of the manifest itself, either as an XML `<Location>` element or as a
//! JSON object with `master_m3u8`. Only one such hop is taken.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static LOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<Location>\s*(.*?)\s*</Location>").expect("valid location regex")
});

/// What a manifest response says about the final URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestRewrite {
    /// XML body with a `<Location>` element.
    RedirectFound(String),
    /// JSON body with a `master_m3u8` field.
    MasterPlaylistFound(String),
    /// Anything else: the requested URL is already final.
    NoRewrite,
}

impl ManifestRewrite {
    pub fn parse(text: &str) -> Self {
        if let Some(location) = LOCATION_REGEX
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| unescape_xml(m.as_str()))
            .filter(|l| !l.is_empty())
        {
            return Self::RedirectFound(location);
        }

        let trimmed = text.trim_start();
        if trimmed.starts_with('{') {
            let json: Option<Value> = serde_json::from_str(trimmed).ok();
            if let Some(url) = json
                .as_ref()
                .and_then(|v| v.get("master_m3u8"))
                .and_then(Value::as_str)
                .filter(|u| !u.is_empty())
            {
                return Self::MasterPlaylistFound(url.to_string());
            }
        }

        Self::NoRewrite
    }

    /// Final manifest URL, falling back to `original`.
    pub fn resolve(self, original: &str) -> String {
        match self {
            Self::RedirectFound(url) | Self::MasterPlaylistFound(url) => url,
            Self::NoRewrite => original.to_string(),
        }
    }
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "https://tkx.test/embed/abc";

    #[test]
    fn xml_location() {
        let rewrite = ManifestRewrite::parse("<MPD><Location>https://x/final.mpd</Location></MPD>");
        assert_eq!(
            rewrite,
            ManifestRewrite::RedirectFound("https://x/final.mpd".into())
        );
        assert_eq!(rewrite.resolve(ORIGINAL), "https://x/final.mpd");
    }

    #[test]
    fn xml_location_is_unescaped() {
        let rewrite = ManifestRewrite::parse(
            "<?xml version=\"1.0\"?>\n<MPD>\n  <Location>\n https://x/m.mpd?a=1&amp;b=2 </Location>\n</MPD>",
        );
        assert_eq!(rewrite.resolve(ORIGINAL), "https://x/m.mpd?a=1&b=2");
    }

    #[test]
    fn json_master_playlist() {
        let rewrite = ManifestRewrite::parse(r#"{"master_m3u8":"https://y/final.m3u8"}"#);
        assert_eq!(
            rewrite,
            ManifestRewrite::MasterPlaylistFound("https://y/final.m3u8".into())
        );
        assert_eq!(rewrite.resolve(ORIGINAL), "https://y/final.m3u8");
    }

    #[test]
    fn unrelated_text_keeps_original() {
        for text in ["#EXTM3U\n#EXT-X-VERSION:3", "", r#"{"other":1}"#, "<MPD></MPD>"] {
            let rewrite = ManifestRewrite::parse(text);
            assert_eq!(rewrite, ManifestRewrite::NoRewrite, "text: {text}");
            assert_eq!(rewrite.resolve(ORIGINAL), ORIGINAL);
        }
    }

    #[test]
    fn empty_location_is_no_rewrite() {
        assert_eq!(
            ManifestRewrite::parse("<Location> </Location>"),
            ManifestRewrite::NoRewrite
        );
    }
}
