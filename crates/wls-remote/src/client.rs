//! HTTP client construction and shared error handling.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default request timeout for remote calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed page size for search and list responses.
///
/// A response reporting more matches than this is a fatal error, never a
/// silently truncated result: callers must not proceed with partial data.
pub const PAGE_LIMIT: usize = 500;

/// Remote service client errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The provided configuration was invalid.
    #[error("invalid remote configuration: {reason}")]
    InvalidConfig { reason: &'static str },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The service returned an error response.
    #[error("remote service error ({status}): {message}")]
    Api { status: u16, message: String },
    /// A query matched more records than one page can carry.
    #[error("query matched {total} records, exceeding the page limit of {limit}")]
    TooManyResults { total: usize, limit: usize },
    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Remote time-tracking service client.
///
/// # Thread Safety
///
/// Safe to clone and share across tasks; clones share the underlying HTTP
/// connection pool.
#[derive(Clone)]
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) account_id: String,
    pub(crate) api_token: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field("api_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new client for the given service.
    ///
    /// # Errors
    ///
    /// Returns an error if any setting is empty or whitespace-only, or if
    /// the HTTP client fails to build.
    pub fn new(
        base_url: impl Into<String>,
        account_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let base_url = base_url.into();
        let account_id = account_id.into();
        let api_token = api_token.into();

        if base_url.trim().is_empty() {
            return Err(RemoteError::InvalidConfig {
                reason: "base URL cannot be empty",
            });
        }
        if account_id.trim().is_empty() {
            return Err(RemoteError::InvalidConfig {
                reason: "account id cannot be empty",
            });
        }
        if api_token.trim().is_empty() {
            return Err(RemoteError::InvalidConfig {
                reason: "API token cannot be empty",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(RemoteError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_id,
            api_token,
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Reads a response body, mapping non-success statuses to typed errors.
    pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, RemoteError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }
        let message = parse_error_messages(&body).unwrap_or(body);
        Err(RemoteError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Rejects totals that exceed one page.
pub(crate) const fn ensure_within_page_limit(total: usize) -> Result<(), RemoteError> {
    if total > PAGE_LIMIT {
        return Err(RemoteError::TooManyResults {
            total,
            limit: PAGE_LIMIT,
        });
    }
    Ok(())
}

/// Decodes the service's error envelope, defensively: the shape is never
/// assumed, and an unrecognized body falls back to the raw text.
fn parse_error_messages(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        #[serde(rename = "errorMessages")]
        error_messages: Option<Vec<String>>,
    }

    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let messages = envelope.error_messages?;
    if messages.is_empty() {
        return None;
    }
    Some(messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_rejects_empty_settings() {
        assert!(matches!(
            Client::new("", "acct", "token"),
            Err(RemoteError::InvalidConfig { .. })
        ));
        assert!(matches!(
            Client::new("https://example.test", "  ", "token"),
            Err(RemoteError::InvalidConfig { .. })
        ));
        assert!(matches!(
            Client::new("https://example.test", "acct", ""),
            Err(RemoteError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn client_accepts_valid_settings() {
        assert!(Client::new("https://example.test", "acct-1", "token-1").is_ok());
    }

    #[test]
    fn client_debug_redacts_token() {
        let client = Client::new("https://example.test", "acct-1", "secret-token").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = Client::new("https://example.test/", "acct-1", "token").unwrap();
        assert_eq!(client.url("/rest/worklogs"), "https://example.test/rest/worklogs");
    }

    #[test]
    fn page_limit_guard_rejects_oversized_totals() {
        assert!(ensure_within_page_limit(0).is_ok());
        assert!(ensure_within_page_limit(500).is_ok());
        assert!(matches!(
            ensure_within_page_limit(501),
            Err(RemoteError::TooManyResults {
                total: 501,
                limit: 500
            })
        ));
    }

    #[test]
    fn api_error_envelope_is_decoded() {
        let message =
            parse_error_messages(r#"{"errorMessages":["issue does not exist","try again"]}"#)
                .unwrap();
        assert_eq!(message, "issue does not exist; try again");
    }

    #[test]
    fn malformed_error_bodies_fall_through() {
        assert!(parse_error_messages("<html>gateway timeout</html>").is_none());
        assert!(parse_error_messages(r#"{"errorMessages":[]}"#).is_none());
        assert!(parse_error_messages(r#"{"something":"else"}"#).is_none());
    }
}
