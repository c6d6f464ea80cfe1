//! HTTP layer: bearer-authenticated POSTs and body/status mapping.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CallResult, ProviderError};
use crate::types::Payload;

const USER_AGENT_VALUE: &str = concat!("idflow/", env!("CARGO_PKG_VERSION"));

/// HTTP backend for provider calls (holds the reqwest client and timeout).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) timeout: Duration,
}

impl HttpBackend {
    pub(crate) fn new(timeout: Duration) -> CallResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ProviderError::Config {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    /// POST a JSON body with a bearer token; exactly one request, no retries.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        token: &str,
        body: &B,
    ) -> CallResult<Payload> {
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout))?;

        let status = response.status();
        let (object, body) = read_json_object(response, self.timeout).await?;

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body,
            });
        }

        object.ok_or(ProviderError::InvalidResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Read a response body; returns the parsed object (if the body is one) and
/// the raw text.
pub(crate) async fn read_json_object(
    response: reqwest::Response,
    timeout: Duration,
) -> CallResult<(Option<Payload>, String)> {
    let body = response.text().await.map_err(|e| send_error(e, timeout))?;

    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(object)) => Ok((Some(object), body)),
        _ => Ok((None, body)),
    }
}

/// Map a send or body-read failure, distinguishing timeouts.
pub(crate) fn send_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout { after: timeout }
    } else {
        ProviderError::from(err)
    }
}
