//! Error types shared by the auth and stream resolution layers.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced to the caller (CLI or any other UI layer).
#[derive(Error, Debug)]
pub enum PlayError {
    /// Username or password is empty. Expected and skippable, not shown as an error.
    #[error("No credentials configured")]
    NoCredentials,

    #[error("Invalid username or password")]
    InvalidLogin,

    #[error("Login failed: {0}")]
    LoginError(String),

    /// An authenticated endpoint rejected the bearer token.
    #[error("Authentication rejected by the service")]
    Unauthorized,

    #[error("Content is not available in your region")]
    Geoblocked,

    #[error("Content is unavailable")]
    Unavailable,

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// `D` license keys must carry the literal `D{SSM}` placeholder.
    #[error("License key value is missing the D{{SSM}} placeholder")]
    MissingPlaceholder,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used to choose how a failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Wrong or absent credentials; recoverable by prompting the user.
    Credential,
    /// Geoblocking or removed content; terminal for the current action.
    Entitlement,
    /// Unexpected response shape or caller misuse.
    Protocol,
    /// Network or filesystem failure. Presented like a protocol error.
    Transport,
}

impl PlayError {
    pub(crate) fn protocol(detail: impl Into<String>) -> Self {
        Self::Protocol(detail.into())
    }

    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoCredentials | Self::InvalidLogin | Self::Unauthorized => ErrorClass::Credential,
            Self::Geoblocked | Self::Unavailable => ErrorClass::Entitlement,
            Self::LoginError(_) | Self::Protocol(_) | Self::MissingPlaceholder | Self::Json(_) => {
                ErrorClass::Protocol
            }
            Self::Http(_) | Self::Io(_) => ErrorClass::Transport,
        }
    }

    /// Short message for end users.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoCredentials => "Enter your username and password in the settings first".into(),
            Self::InvalidLogin => "Login failed, check your username and password".into(),
            Self::LoginError(code) => format!("Login failed ({code}), try again later"),
            Self::Unauthorized => "Your session has expired, please try again".into(),
            Self::Geoblocked => "This content is not available in your region".into(),
            Self::Unavailable => "This content is no longer available".into(),
            Self::MissingPlaceholder => self.to_string(),
            Self::Protocol(_) | Self::Json(_) => {
                "Playback failed, the service returned an unexpected response".into()
            }
            Self::Http(_) | Self::Io(_) => "Playback failed, check your network connection".into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayError>;

const GEO_MARKERS: &[&str] = &[
    "geoblock",
    "geo-block",
    "geo_block",
    "georestrict",
    "geo-restrict",
    "geo restrict",
    "not available in your region",
];

const NOT_FOUND_MARKERS: &[&str] = &["not found", "not_found", "notfound"];

/// Map an explicit entitlement signal in a message or body to an error.
pub(crate) fn classify_message(text: &str) -> Option<PlayError> {
    let lower = text.to_lowercase();
    if GEO_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(PlayError::Geoblocked)
    } else if NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(PlayError::Unavailable)
    } else {
        None
    }
}

/// Check the status of a response to `step`, classifying failures.
///
/// 403/451 are geoblocking, 404/410 are unavailable content; other
/// non-2xx replies are classified by body markers, else a protocol error.
pub(crate) fn check_status(step: &str, status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status.as_u16() {
        403 | 451 => PlayError::Geoblocked,
        404 | 410 => PlayError::Unavailable,
        code => classify_message(body)
            .unwrap_or_else(|| PlayError::Protocol(format!("{step} returned HTTP {code}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_are_grouped() {
        assert_eq!(PlayError::NoCredentials.class(), ErrorClass::Credential);
        assert_eq!(PlayError::InvalidLogin.class(), ErrorClass::Credential);
        assert_eq!(PlayError::Unauthorized.class(), ErrorClass::Credential);
    }

    #[test]
    fn entitlement_and_protocol_errors_are_distinct() {
        assert_eq!(PlayError::Geoblocked.class(), ErrorClass::Entitlement);
        assert_eq!(PlayError::Unavailable.class(), ErrorClass::Entitlement);
        assert_eq!(
            PlayError::LoginError("HTTP 500".into()).class(),
            ErrorClass::Protocol
        );
        assert_eq!(PlayError::protocol("x").class(), ErrorClass::Protocol);
    }

    #[test]
    fn login_error_message_carries_code() {
        let msg = PlayError::LoginError("missing_code".into()).user_message();
        assert!(msg.contains("missing_code"));
        assert_ne!(
            PlayError::InvalidLogin.user_message(),
            PlayError::LoginError("x".into()).user_message()
        );
    }

    #[test]
    fn status_mapping() {
        assert!(check_status("config", StatusCode::OK, "").is_ok());
        assert!(matches!(
            check_status("config", StatusCode::FORBIDDEN, ""),
            Err(PlayError::Geoblocked)
        ));
        assert!(matches!(
            check_status("config", StatusCode::NOT_FOUND, ""),
            Err(PlayError::Unavailable)
        ));
        match check_status("config", StatusCode::INTERNAL_SERVER_ERROR, "boom") {
            Err(PlayError::Protocol(detail)) => assert_eq!(detail, "config returned HTTP 500"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn body_markers_classify_other_statuses() {
        assert!(matches!(
            check_status("session", StatusCode::BAD_REQUEST, r#"{"error":"GEO_BLOCKED"}"#),
            Err(PlayError::Geoblocked)
        ));
        assert!(matches!(
            check_status("session", StatusCode::BAD_REQUEST, "Video not found"),
            Err(PlayError::Unavailable)
        ));
        assert!(classify_message("all good").is_none());
    }

    #[test]
    fn placeholder_error_displays_literal_braces() {
        assert!(PlayError::MissingPlaceholder.to_string().contains("D{SSM}"));
    }
}
