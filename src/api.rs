//! Authenticated first-party API calls.
//!
//! Attaches the bearer token from [`AuthSession`] and clears it when the
//! service rejects it, so the next call logs in again.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::AuthSession;
use crate::config::ApiConfig;
use crate::error::{check_status, PlayError, Result};
use crate::settings::Settings;

pub struct ApiClient<S: Settings> {
    config: ApiConfig,
    session: AuthSession<S>,
}

impl<S: Settings> ApiClient<S> {
    pub fn new(config: ApiConfig, session: AuthSession<S>) -> Self {
        Self { config, session }
    }

    pub fn session(&self) -> &AuthSession<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AuthSession<S> {
        &mut self.session
    }

    /// `GET` a path below the API base and parse the JSON body.
    pub async fn get_json(&mut self, path: &str) -> Result<Value> {
        let token = self.session.token().await?;
        let url = self.config.url(path);
        debug!(%url, "Authenticated GET");

        let mut request = self.session.client().inner().get(&url).bearer_auth(&token);
        for (name, value) in self.config.headers() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            warn!("Token rejected, clearing it");
            self.session.clear_token()?;
            return Err(PlayError::Unauthorized);
        }

        let body = response.text().await?;
        check_status(path, status, &body)?;

        serde_json::from_str(&body)
            .map_err(|e| PlayError::protocol(format!("invalid JSON from {path}: {e}")))
    }
}
