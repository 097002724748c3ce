//! Blocking HTTP client for the issue service.
//!
//! One request: `GET {base}/issues[?priority=<LEVEL>]`. No retries.

use crate::error::{LalError, Result};
use crate::model::{Issue, Priority};
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use std::time::Duration;

/// Default service address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5099";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client bound to one service base URL.
#[derive(Debug, Clone)]
pub struct IssueClient {
    base_url: String,
    http: Client,
}

impl IssueClient {
    /// Build a client. Trailing slashes on `base_url` are dropped.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUrl` if the base URL is not an http(s) URL, or an
    /// error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        issues_url(&base_url, None)?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LalError::with_context("Failed to build HTTP client", e))?;

        Ok(Self { base_url, http })
    }

    /// Fetch issues, optionally filtered to one priority.
    ///
    /// The response order is preserved.
    ///
    /// # Errors
    ///
    /// - `Connectivity` when the service is unreachable or times out
    /// - `Request` for a non-success status or an undecodable body
    pub fn fetch_issues(&self, filter: Option<Priority>) -> Result<Vec<Issue>> {
        let url = issues_url(&self.base_url, filter)?;
        tracing::debug!(%url, "GET issues");

        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .map_err(|e| self.send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LalError::Request {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        let invalid = |reason: String| LalError::Request {
            url: url.to_string(),
            status: None,
            reason,
        };
        let rows: Vec<serde_json::Value> = response
            .json()
            .map_err(|e| invalid(format!("invalid response body: {e}")))?;

        // Priorities are a closed set; one bad row fails the listing, named.
        let issues = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let code = row
                    .get("code")
                    .and_then(serde_json::Value::as_str)
                    .map_or_else(|| format!("#{index}"), str::to_string);
                serde_json::from_value::<Issue>(row)
                    .map_err(|e| invalid(format!("issue '{code}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::info!(count = issues.len(), "Fetched issues");
        Ok(issues)
    }

    fn send_error(&self, err: &reqwest::Error) -> LalError {
        if err.is_connect() || err.is_timeout() {
            LalError::Connectivity {
                url: self.base_url.clone(),
                reason: err.to_string(),
            }
        } else {
            LalError::Request {
                url: self.base_url.clone(),
                status: err.status().map(|s| s.as_u16()),
                reason: err.to_string(),
            }
        }
    }
}

/// Build the listing URL for `base_url` and an optional filter.
///
/// The filter is sent as the canonical upper-case level name; without a
/// filter the URL carries no query string.
///
/// # Errors
///
/// Returns `InvalidUrl` if the result is not an http(s) URL.
pub fn issues_url(base_url: &str, filter: Option<Priority>) -> Result<Url> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let invalid = |reason: String| LalError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };

    let mut url = Url::parse(&format!("{trimmed}/issues")).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if let Some(priority) = filter {
        url.query_pairs_mut()
            .append_pair("priority", priority.as_str());
    }
    Ok(url)
}
