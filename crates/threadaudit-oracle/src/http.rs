//! Transport plumbing shared by the HTTP backends.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use threadaudit_contracts::{
    error::{ConfigErrorKind, ThreadAuditError, ThreadAuditResult},
    oracle::OracleError,
};

const USER_AGENT_VALUE: &str = concat!("threadaudit/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body carried into `OracleError::Transport`.
const BODY_EXCERPT_CHARS: usize = 300;

pub(crate) fn build_client() -> ThreadAuditResult<reqwest::Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

    reqwest::Client::builder()
        .default_headers(default_headers)
        .build()
        .map_err(|e| {
            ThreadAuditError::config(
                ConfigErrorKind::InvalidSetting,
                "oracle.http",
                format!("failed to create HTTP client: {e}"),
            )
        })
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send a prepared request and decode a successful JSON body.
pub(crate) async fn send_json(
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<Value, OracleError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| map_reqwest_error(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        debug!(status = %status, "oracle returned non-success status");
        return Err(OracleError::Transport {
            reason: format!("HTTP {status}: {excerpt}"),
        });
    }

    response.json::<Value>().await.map_err(|e| {
        if e.is_timeout() {
            OracleError::timeout(timeout)
        } else {
            OracleError::MalformedResponse {
                reason: format!("response body is not JSON: {e}"),
            }
        }
    })
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> OracleError {
    if err.is_timeout() {
        OracleError::timeout(timeout)
    } else {
        OracleError::Transport {
            reason: err.to_string(),
        }
    }
}
