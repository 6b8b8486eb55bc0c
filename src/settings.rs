//! Settings storage: credentials, proxy, and small persisted values.
//!
//! The [`Settings`] trait is the seam between the auth/stream layers and
//! whatever owns user preferences. [`FileSettings`] keeps them in a JSON
//! file inside the profile directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tracing::debug;

use crate::error::Result;

pub const KEY_USERNAME: &str = "username";
pub const KEY_PASSWORD: &str = "password";
pub const KEY_PROXY_URL: &str = "proxy_url";
pub const KEY_PROXY_USERNAME: &str = "proxy_username";
pub const KEY_PROXY_PASSWORD: &str = "proxy_password";
pub const KEY_CREDENTIALS_HASH: &str = "credentials_hash";

const SETTINGS_FILE: &str = "settings.json";

/// Account credentials for the first-party login.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// Hex MD5 of `username + password`, persisted to detect credential changes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Md5::new();
        hasher.update(self.username.as_bytes());
        hasher.update(self.password.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Outbound proxy applied to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Source of user settings.
pub trait Settings {
    fn value(&self, key: &str) -> Option<String>;

    fn set_value(&mut self, key: &str, value: &str) -> Result<()>;

    /// Per-profile directory holding the token cache.
    fn profile_dir(&self) -> &Path;

    fn credentials(&self) -> Credentials {
        Credentials {
            username: self.value(KEY_USERNAME).unwrap_or_default(),
            password: self.value(KEY_PASSWORD).unwrap_or_default(),
        }
    }

    fn proxy(&self) -> Option<ProxyConfig> {
        let url = self.value(KEY_PROXY_URL).filter(|u| !u.is_empty())?;
        Some(ProxyConfig {
            url,
            username: self.value(KEY_PROXY_USERNAME).filter(|v| !v.is_empty()),
            password: self.value(KEY_PROXY_PASSWORD).filter(|v| !v.is_empty()),
        })
    }
}

/// JSON key/value settings file at `<profile_dir>/settings.json`.
#[derive(Debug)]
pub struct FileSettings {
    dir: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettings {
    /// Open the settings in `dir`. A missing file is an empty store.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let path = dir.join(SETTINGS_FILE);
        let values = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = values.len(), "Loaded settings");
        Ok(Self { dir, values })
    }

    /// `<data_dir>/playkey`, falling back to the working directory.
    pub fn default_profile_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("playkey")
    }

    fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(self.dir.join(SETTINGS_FILE), content)?;
        Ok(())
    }
}

impl Settings for FileSettings {
    fn value(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn profile_dir(&self) -> &Path {
        &self.dir
    }
}
