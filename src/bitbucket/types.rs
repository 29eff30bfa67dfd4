use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Placeholder message when the server never answered.
pub const NO_MESSAGE: &str = "! no messages !";

pub const INVALID_URL_MESSAGE: &str =
    "The Bitbucket URL provided is not valid, aborting notification";

/// Status reported to Bitbucket for the merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuildStatus {
    Success,
    Failure,
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Success => f.write_str("SUCCESS"),
            BuildStatus::Failure => f.write_str("FAILURE"),
        }
    }
}

/// Why a notification could not be sent or its answer could not be read.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL '{url}': only http and https with a host are allowed")]
    UnsupportedUrl { url: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Result of exactly one notification attempt.
#[derive(Debug)]
pub struct NotificationOutcome {
    /// HTTP status code, `-1` when no response was obtained.
    pub status_code: i32,
    pub message: String,
    pub error: Option<NotifyError>,
}

impl NotificationOutcome {
    pub fn new(status_code: i32, message: impl Into<String>, error: Option<NotifyError>) -> Self {
        Self {
            status_code,
            message: message.into(),
            error,
        }
    }

    /// `exception` part of the console lines, `null` when there is none.
    pub fn error_description(&self) -> String {
        self.error
            .as_ref()
            .map_or_else(|| "null".to_string(), ToString::to_string)
    }
}

/// Body Bitbucket answers with.
#[derive(Debug, Deserialize)]
pub(super) struct NotifyResponse {
    pub message: String,
}
