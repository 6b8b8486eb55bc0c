//! Authentication Module
//!
//! Obtains the bearer token used by first-party API calls:
//! - Authorization-code login driven without a browser
//! - In-memory and per-profile file caching of the token
//! - Invalidation when the stored credentials change
//!
//! The login provider finishes by redirecting to a custom-scheme callback.
//! Redirects are never followed automatically during the credential POST;
//! the authorization code is read from the callback `Location` header.

use std::path::{Path, PathBuf};

use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::LOCATION;
use reqwest::{Response, Url};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::AuthEndpoints;
use crate::error::{PlayError, Result};
use crate::http_client::SessionClient;
use crate::settings::{Credentials, Settings, KEY_CREDENTIALS_HASH};

const TOKEN_FILE: &str = "token";

/// Length of the generated OAuth `state` and `nonce`.
const NONCE_LEN: usize = 22;

/// HTTP(S) hops tolerated between the credential POST and the callback.
const MAX_LOGIN_REDIRECTS: usize = 5;

/// Token persisted as raw text in the profile directory.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(profile_dir: &Path) -> Self {
        Self {
            path: profile_dir.join(TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached token, or `None` when the file is missing or blank.
    pub fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Owner of the first-party bearer token.
///
/// Lifecycle: absent → login → valid → cleared → login. There is at most
/// one token in memory, and none is produced while either credential is
/// empty.
pub struct AuthSession<S: Settings> {
    config: AuthEndpoints,
    settings: S,
    client: SessionClient,
    cache: TokenCache,
    token: Option<String>,
}

impl<S: Settings> AuthSession<S> {
    /// Create a session, clearing the cached token if the credentials
    /// changed since it was written.
    pub fn new(config: AuthEndpoints, settings: S, client: SessionClient) -> Result<Self> {
        let cache = TokenCache::new(settings.profile_dir());
        let mut session = Self {
            config,
            settings,
            client,
            cache,
            token: None,
        };

        let fingerprint = session.settings.credentials().fingerprint();
        if session.settings.value(KEY_CREDENTIALS_HASH).as_deref() != Some(fingerprint.as_str()) {
            info!("Credentials changed, clearing cached token");
            session.clear_token()?;
            session
                .settings
                .set_value(KEY_CREDENTIALS_HASH, &fingerprint)?;
        }

        Ok(session)
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Return the bearer token, logging in if nothing is cached.
    ///
    /// Fails with [`PlayError::NoCredentials`] when either credential is empty.
    pub async fn token(&mut self) -> Result<String> {
        let credentials = self.settings.credentials();
        if !credentials.is_complete() {
            return Err(PlayError::NoCredentials);
        }

        if let Some(ref token) = self.token {
            return Ok(token.clone());
        }

        if let Some(token) = self.cache.read()? {
            debug!(token = %mask(&token), "Using cached token");
            self.token = Some(token.clone());
            return Ok(token);
        }

        let token = self.login_with(&credentials).await?;
        self.cache.write(&token)?;
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Forget the token in memory and on disk.
    pub fn clear_token(&mut self) -> Result<()> {
        self.token = None;
        self.cache.delete()?;
        debug!(path = %self.cache.path().display(), "Token cleared");
        Ok(())
    }

    /// Run the full authorization-code login and return a fresh token.
    pub async fn login(&self) -> Result<String> {
        let credentials = self.settings.credentials();
        if !credentials.is_complete() {
            return Err(PlayError::NoCredentials);
        }
        self.login_with(&credentials).await
    }

    #[instrument(skip_all, fields(user = %credentials.username))]
    async fn login_with(&self, credentials: &Credentials) -> Result<String> {
        info!("Logging in");

        self.open_authorization().await?;
        let code = self.submit_credentials(credentials).await?;
        let token = self.exchange_code(&code).await?;

        info!(token = %mask(&token), "Login successful");
        Ok(token)
    }

    /// Step 1: visit the authorize endpoint so the provider sets its session cookies.
    async fn open_authorization(&self) -> Result<()> {
        let state = random_token(NONCE_LEN);
        let nonce = random_token(NONCE_LEN);

        let response = self
            .client
            .inner()
            .get(&self.config.authorize_url)
            .query(&[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("state", state.as_str()),
                ("nonce", nonce.as_str()),
            ])
            .send()
            .await?;

        debug!(status = %response.status(), "Authorization session opened");
        Ok(())
    }

    /// Step 2: post credentials and walk redirects until the custom-scheme callback.
    async fn submit_credentials(&self, credentials: &Credentials) -> Result<String> {
        let mut url = Url::parse(&self.config.login_url)
            .map_err(|e| PlayError::LoginError(format!("invalid_login_url: {e}")))?;

        let mut response = self
            .client
            .no_redirect()
            .post(url.clone())
            .form(&[
                (self.config.username_field.as_str(), credentials.username.as_str()),
                (self.config.password_field.as_str(), credentials.password.as_str()),
            ])
            .send()
            .await?;

        for _ in 0..=MAX_LOGIN_REDIRECTS {
            if !response.status().is_redirection() {
                return Err(self.login_failure(response).await);
            }

            let target = redirect_target(&url, &response)?;
            if !matches!(target.scheme(), "http" | "https") {
                return extract_code(&target);
            }

            debug!(%target, "Following login redirect");
            response = self.client.no_redirect().get(target.clone()).send().await?;
            url = target;
        }

        warn!("Login redirect chain too long");
        Err(PlayError::LoginError("too_many_redirects".into()))
    }

    /// Classify a non-redirect reply to the credential POST.
    async fn login_failure(&self, response: Response) -> PlayError {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return e.into(),
        };

        let markers = [
            &self.config.invalid_email_marker,
            &self.config.invalid_password_marker,
        ];
        if markers.iter().any(|m| !m.is_empty() && body.contains(m.as_str())) {
            warn!("Login rejected credentials");
            PlayError::InvalidLogin
        } else {
            warn!(%status, "Unexpected login response");
            PlayError::LoginError(format!("HTTP {}", status.as_u16()))
        }
    }

    /// Step 3: trade the authorization code for the signed token.
    async fn exchange_code(&self, code: &str) -> Result<String> {
        let response = self
            .client
            .inner()
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Token exchange failed");
            return Err(PlayError::LoginError(format!("HTTP {}", status.as_u16())));
        }

        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body)
            .map_err(|_| PlayError::LoginError("invalid_token_response".into()))?;

        json.get(&self.config.token_field)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PlayError::LoginError("missing_token".into()))
    }
}

fn redirect_target(base: &Url, response: &Response) -> Result<Url> {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PlayError::LoginError("missing_location".into()))?;

    base.join(location)
        .map_err(|_| PlayError::LoginError("invalid_redirect".into()))
}

/// Pull the `code` query parameter out of the callback URL.
fn extract_code(callback: &Url) -> Result<String> {
    callback
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| {
            warn!("Login callback carried no authorization code");
            PlayError::LoginError("missing_code".into())
        })
}

/// Random mixed-case alphanumeric string.
pub(crate) fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// First few characters of a secret, for logs.
pub(crate) fn mask(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_token_shape() {
        let token = random_token(NONCE_LEN);
        assert_eq!(token.len(), 22);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, random_token(NONCE_LEN));
    }

    #[test]
    fn extract_code_from_custom_scheme() {
        let url = Url::parse("playkey://auth/callback?state=s1&code=abc123").unwrap();
        assert_eq!(extract_code(&url).unwrap(), "abc123");
    }

    #[test]
    fn extract_code_missing_is_login_error() {
        let url = Url::parse("playkey://auth/callback?error=access_denied").unwrap();
        match extract_code(&url) {
            Err(PlayError::LoginError(code)) => assert_eq!(code, "missing_code"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn token_cache_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path());
        assert_eq!(cache.read().unwrap(), None);

        cache.write("tok-1").unwrap();
        assert_eq!(cache.read().unwrap().as_deref(), Some("tok-1"));

        cache.delete().unwrap();
        assert_eq!(cache.read().unwrap(), None);
        // Deleting twice is fine
        cache.delete().unwrap();
    }

    #[test]
    fn blank_token_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path());
        cache.write("  \n").unwrap();
        assert_eq!(cache.read().unwrap(), None);
    }

    #[test]
    fn mask_hides_tail() {
        assert_eq!(mask("eyJhbGciOiJSUzI1NiJ9.payload"), "eyJhbG...");
    }
}
