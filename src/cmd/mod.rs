pub mod api;
pub mod auth;
pub mod configure;
pub mod license;
pub mod resolve;

use std::path::{Path, PathBuf};

use anyhow::Result;

use playkey::{AuthSession, FileSettings, ServiceConfig, SessionClient, Settings};

/// Config and profile shared by every subcommand.
pub struct Context {
    pub config: ServiceConfig,
    pub profile: PathBuf,
}

impl Context {
    pub fn new(config: Option<&Path>, profile: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            config: ServiceConfig::load(config)?,
            profile: profile.unwrap_or_else(FileSettings::default_profile_dir),
        })
    }

    pub fn settings(&self) -> Result<FileSettings> {
        Ok(FileSettings::open(&self.profile)?)
    }

    /// HTTP client honoring the profile's proxy setting.
    pub fn client(&self, settings: &FileSettings) -> Result<SessionClient> {
        Ok(SessionClient::new(&self.config.http, settings.proxy().as_ref())?)
    }

    pub fn session(&self) -> Result<AuthSession<FileSettings>> {
        let settings = self.settings()?;
        let client = self.client(&settings)?;
        Ok(AuthSession::new(self.config.auth.clone(), settings, client)?)
    }
}

/// Parse repeated `NAME=VALUE` header arguments.
pub fn parse_headers(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|h| {
            let (name, value) = h
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("header must be NAME=VALUE: {h}"))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

pub fn as_pairs(headers: &[(String, String)]) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers() {
        let headers = parse_headers(&["User-Agent=ua/1.0".into(), "X-A = b=c".into()]).unwrap();
        assert_eq!(
            headers,
            vec![
                ("User-Agent".to_string(), "ua/1.0".to_string()),
                ("X-A".to_string(), "b=c".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_header_without_equals() {
        assert!(parse_headers(&["Accept".into()]).is_err());
    }
}
