use log::{error, trace};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::credentials::Credentials;

use super::types::{
    NotificationOutcome, NotifyError, NotifyResponse, INVALID_URL_MESSAGE, NO_MESSAGE,
};

const DEFAULT_USER_AGENT: &str = concat!("ubuild/", env!("CARGO_PKG_VERSION"));

/// Sends unbreakable build notifications to Bitbucket.
///
/// Holds settings only: the HTTP client is created for each notification and
/// dropped when it returns.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    user_agent: String,
    timeout: Option<Duration>,
}

impl Default for NotificationClient {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl NotificationClient {
    /// # Arguments
    ///
    /// * `user_agent` - Overrides the default `ubuild/<version>` agent
    /// * `timeout` - Whole-request timeout; `None` keeps the transport default
    pub fn new(user_agent: Option<String>, timeout: Option<Duration>) -> Self {
        Self {
            user_agent: user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout,
        }
    }

    /// Performs exactly one `POST` of `payload` to `url`.
    ///
    /// Never fails: an invalid URL, a transport error or an unreadable answer
    /// all end up in the returned outcome. A status code received from the
    /// server is kept even when its body cannot be parsed.
    pub async fn notify(
        &self,
        url: &str,
        payload: &str,
        credentials: &Credentials,
    ) -> NotificationOutcome {
        let target = match parse_target(url) {
            Ok(target) => target,
            Err(e) => return NotificationOutcome::new(-1, INVALID_URL_MESSAGE, Some(e)),
        };

        let client = match self.build_client() {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to create HTTP client: {e}");
                return NotificationOutcome::new(-1, NO_MESSAGE, Some(e.into()));
            }
        };

        // basic_auth sets the header on this very request, no challenge round-trip
        let request = client
            .post(target)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .basic_auth(&credentials.username, Some(&credentials.password))
            .body(payload.as_bytes().to_vec());

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Issue while notifying Bitbucket: {e}");
                let status_code = e.status().map_or(-1, |s| i32::from(s.as_u16()));
                return NotificationOutcome::new(status_code, NO_MESSAGE, Some(e.into()));
            }
        };

        let status_code = i32::from(response.status().as_u16());
        trace!("status Code: {status_code}");

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Issue while reading the Bitbucket response: {e}");
                return NotificationOutcome::new(status_code, NO_MESSAGE, Some(e.into()));
            }
        };

        match serde_json::from_str::<NotifyResponse>(&body) {
            Ok(parsed) => NotificationOutcome::new(status_code, parsed.message, None),
            Err(e) => {
                error!("Issue with the Bitbucket response payload: {body}: {e}");
                NotificationOutcome::new(status_code, body, Some(e.into()))
            }
        }
    }

    fn build_client(&self) -> reqwest::Result<Client> {
        let mut builder = Client::builder().user_agent(self.user_agent.as_str());
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

/// Only absolute `http`/`https` URLs with a host can be notified.
fn parse_target(url: &str) -> Result<Url, NotifyError> {
    let target = Url::parse(url).map_err(|source| NotifyError::InvalidUrl {
        url: url.to_owned(),
        source,
    })?;

    match target.scheme() {
        "http" | "https" if target.host_str().is_some_and(|h| !h.is_empty()) => Ok(target),
        _ => Err(NotifyError::UnsupportedUrl {
            url: url.to_owned(),
        }),
    }
}
