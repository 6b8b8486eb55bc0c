//! Playback session negotiation with the delivery platform.
//!
//! The session endpoint answers with JSONP: `callbackName({...})`. The
//! wrapper is stripped before the JSON is parsed.

use std::sync::LazyLock;

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ProviderConfig;
use crate::error::{classify_message, PlayError, Result};
use crate::stream::video_config::ProviderDescriptor;

/// `name( ... )` with an optional trailing semicolon.
static JSONP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*([A-Za-z_$][\w$.]*)\s*\((.*)\)\s*;?\s*$").expect("valid jsonp regex")
});

/// Session token sent when the video configuration carries none.
const DEFAULT_SESSION_TOKEN: &str = "default";

/// One session-description request, with its tracking identifiers.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    video_id: String,
    access_key: String,
    session_token: String,
    request_id: String,
    tracking_id: String,
    timestamp: i64,
}

impl SessionRequest {
    pub fn new(descriptor: &ProviderDescriptor) -> Self {
        Self {
            video_id: descriptor.video_id.clone(),
            access_key: descriptor.access_key.clone(),
            session_token: descriptor
                .session_token
                .clone()
                .unwrap_or_else(|| DEFAULT_SESSION_TOKEN.to_string()),
            request_id: random_hex(32),
            tracking_id: random_hex(32),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Query parameters for the session endpoint.
    pub fn query(&self) -> [(&'static str, &str); 3] {
        [
            ("anvack", self.access_key.as_str()),
            ("anvtrid", self.tracking_id.as_str()),
            ("rtyp", "fp"),
        ]
    }

    /// JSON body describing the device and the content.
    pub fn payload(&self, config: &ProviderConfig) -> Value {
        json!({
            "api": {
                "anvrid": self.request_id,
                "anvts": self.timestamp,
                "anvstk2": self.session_token,
            },
            "content": {
                "mcp_video_id": self.video_id,
                "mcp_id": config.mcp_id,
                "width": config.width,
                "height": config.height,
            },
            "user": {
                "device": config.device,
                "device_type": config.device_type,
                "sdkver": config.sdk_version,
                "mobile": false,
            },
        })
    }
}

/// Manifest and license locations published for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedUrl {
    pub manifest_url: String,
    pub license_url: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    published_urls: Vec<PublishedEntry>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishedEntry {
    #[serde(default)]
    embed_url: Option<String>,
    #[serde(default)]
    license_url: Option<String>,
}

/// Return the argument of `callback( ... )`, or `None` if `body` is not wrapped.
pub fn unwrap_callback<'a>(body: &'a str, callback: &str) -> Option<&'a str> {
    let caps = JSONP_REGEX.captures(body)?;
    if &caps[1] != callback {
        return None;
    }
    caps.get(2).map(|m| m.as_str())
}

/// Parse a session response into its first published URL pair.
pub fn parse_session(body: &str, callback: &str) -> Result<PublishedUrl> {
    let json = unwrap_callback(body, callback).unwrap_or_else(|| body.trim());
    let response: SessionResponse = serde_json::from_str(json)
        .map_err(|e| PlayError::protocol(format!("invalid session response: {e}")))?;

    let Some(first) = response.published_urls.into_iter().next() else {
        let reason = response
            .error
            .map(|e| match e {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .or(response.message)
            .unwrap_or_default();
        return Err(classify_message(&reason)
            .unwrap_or_else(|| PlayError::protocol("session response has no published urls")));
    };

    let manifest_url = first
        .embed_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| PlayError::protocol("published url has no manifest"))?;
    let license_url = first
        .license_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| PlayError::protocol("published url has no license url"))?;

    Ok(PublishedUrl {
        manifest_url,
        license_url,
    })
}

fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}
