//! Service configuration loaded from `~/.config/playkey/config.toml`.
//!
//! Endpoints, client ids, API keys and device identity live here instead of
//! in code so they can be rotated or pointed at a test server.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::stream::Category;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub auth: AuthEndpoints,
    pub api: ApiConfig,
    pub provider: ProviderConfig,
    pub http: HttpConfig,
}

/// Authorization-code login endpoints and the markers used to read their replies.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthEndpoints {
    pub authorize_url: String,
    pub login_url: String,
    pub token_url: String,
    pub client_id: String,
    /// Custom-scheme callback; never fetched, only read back from `Location`.
    pub redirect_uri: String,
    pub scope: String,
    pub username_field: String,
    pub password_field: String,
    /// Body text the login page shows for an unknown email.
    pub invalid_email_marker: String,
    /// Body text the login page shows for a wrong password.
    pub invalid_password_marker: String,
    /// JSON field of the token response that holds the signed token.
    pub token_field: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: "https://login.example.tv/oauth/authorize".into(),
            login_url: "https://login.example.tv/login".into(),
            token_url: "https://login.example.tv/oauth/token".into(),
            client_id: "playkey".into(),
            redirect_uri: "playkey://auth/callback".into(),
            scope: "openid profile".into(),
            username_field: "email".into(),
            password_field: "password".into(),
            invalid_email_marker: "error-invalid-email".into(),
            invalid_password_marker: "error-invalid-password".into(),
            token_field: "id_token".into(),
        }
    }
}

/// First-party API used for video configuration and authenticated calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Path template with `{category}` and `{id}` placeholders.
    pub video_config_path: String,
    pub api_key_header: String,
    pub api_key: String,
    pub sdk_header: String,
    pub sdk_value: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.example.tv/v1".into(),
            video_config_path: "/{category}/{id}/videoconfig".into(),
            api_key_header: "x-api-key".into(),
            api_key: String::new(),
            sdk_header: "x-sdk".into(),
            sdk_value: "web".into(),
        }
    }
}

impl ApiConfig {
    pub fn video_config_url(&self, category: Category, id: &str) -> String {
        let path = self
            .video_config_path
            .replace("{category}", category.as_str())
            .replace("{id}", &urlencoding::encode(id));
        self.url(&path)
    }

    /// Join `path` onto the base URL, tolerating slashes on either side.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Headers every first-party call carries.
    pub fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = Vec::with_capacity(2);
        if !self.api_key.is_empty() {
            headers.push((self.api_key_header.as_str(), self.api_key.as_str()));
        }
        if !self.sdk_value.is_empty() {
            headers.push((self.sdk_header.as_str(), self.sdk_value.as_str()));
        }
        headers
    }
}

/// Third-party delivery platform and the device identity presented to it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Value of `type` in the video configuration that this crate can play.
    pub kind: String,
    /// Session endpoint template with a `{video_id}` placeholder.
    pub session_url: String,
    pub callback: String,
    pub mcp_id: String,
    pub device: String,
    pub device_type: String,
    pub sdk_version: String,
    pub width: u32,
    pub height: u32,
    pub user_agent: String,
    pub origin: String,
    pub referer: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: "anvato".into(),
            session_url: "https://tkx.mp.lura.live/rest/v2/mcp/video/{video_id}".into(),
            callback: "anvatoVideoJSONLoaded".into(),
            mcp_id: String::new(),
            device: "web".into(),
            device_type: "web".into(),
            sdk_version: "5.0.39".into(),
            width: 1920,
            height: 1080,
            user_agent: HttpConfig::default().user_agent,
            origin: String::new(),
            referer: String::new(),
        }
    }
}

impl ProviderConfig {
    pub fn session_url(&self, video_id: &str) -> String {
        self.session_url
            .replace("{video_id}", &urlencoding::encode(video_id))
    }

    /// Headers for provider session and manifest requests.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        [
            ("User-Agent", self.user_agent.as_str()),
            ("Origin", self.origin.as_str()),
            ("Referer", self.referer.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }
}

/// Transport settings applied to every call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Off by default: the upstream chain is not in the bundled root store.
    pub verify_tls: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".into(),
            verify_tls: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file yields built-in defaults; an explicit path
    /// must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path(), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::from_toml(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Return the path to the default config file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playkey")
        .join("config.toml")
}
