//! Video configuration response from the first-party API.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{PlayError, Result};
use crate::stream::provider::Category;

/// Credentials for starting a playback session on the delivery platform.
///
/// Built fresh for every resolution and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub video_id: String,
    pub access_key: String,
    pub session_token: Option<String>,
}

/// Title information shown by the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    pub program_title: Option<String>,
    pub title: String,
    pub duration_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct VideoConfig {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    program: Option<Program>,
    /// Seconds; some categories send it as a string.
    #[serde(default)]
    duration: Option<Value>,
    #[serde(default, alias = "providers")]
    streams: Vec<StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct Program {
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, alias = "videoId")]
    video_id: Option<String>,
    #[serde(default, alias = "accessKey")]
    access_key: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl VideoConfig {
    pub fn parse(body: &str) -> Result<Self> {
        serde_json::from_str(body)
            .map_err(|e| PlayError::protocol(format!("invalid video configuration: {e}")))
    }

    /// Descriptor of the first stream entry of type `kind`.
    pub fn find_descriptor(&self, kind: &str) -> Result<ProviderDescriptor> {
        let entry = self
            .streams
            .iter()
            .find(|s| s.kind.eq_ignore_ascii_case(kind))
            .ok_or_else(|| PlayError::protocol("no handleable stream"))?;

        let video_id = non_empty(entry.video_id.as_deref())
            .ok_or_else(|| PlayError::protocol("stream entry has no video id"))?;
        let access_key = non_empty(entry.access_key.as_deref())
            .ok_or_else(|| PlayError::protocol("stream entry has no access key"))?;

        Ok(ProviderDescriptor {
            video_id,
            access_key,
            session_token: non_empty(entry.token.as_deref()),
        })
    }

    /// Title fields for `category`; `fallback_title` is used when none is sent.
    pub fn metadata(&self, category: Category, fallback_title: &str) -> StreamMetadata {
        let program_title = if category.has_program() {
            self.program
                .as_ref()
                .and_then(|p| non_empty(p.title.as_deref()))
        } else {
            None
        };

        let duration_seconds = if category.has_duration() {
            self.duration.as_ref().and_then(|d| match d {
                Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
        } else {
            None
        };

        StreamMetadata {
            program_title,
            title: non_empty(self.title.as_deref()).unwrap_or_else(|| fallback_title.to_string()),
            duration_seconds,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
