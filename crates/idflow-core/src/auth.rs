//! Bearer-token acquisition.
//!
//! Tokens come from the SDK host's `/jwt/v1/generate` endpoint, authenticated
//! with the API key/secret as HTTP basic credentials. A token is never shared
//! between verification runs: every run owns a [`TokenSlot`] that acquires at
//! most once and then replays the outcome, failure included.

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::client::http::{read_json_object, send_error};
use crate::config::ProviderConfig;
use crate::error::{CallResult, ProviderError};
use crate::types::Credential;

const TOKEN_PATH: &str = "/jwt/v1/generate";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    expire_after: u64,
}

/// Obtains bearer tokens with the configured API credentials.
#[derive(Debug, Clone)]
pub struct CredentialManager {
    client: reqwest::Client,
    token_url: String,
    api_key: String,
    api_secret: String,
    ttl_secs: u64,
    timeout: std::time::Duration,
}

impl CredentialManager {
    pub(crate) fn new(client: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            token_url: format!("{}{}", config.endpoints.sdk.trim_end_matches('/'), TOKEN_PATH),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            ttl_secs: config.token_ttl_secs,
            timeout: config.timeout(),
        }
    }

    /// Request a fresh token.
    ///
    /// Succeeds only on a 2xx JSON object carrying a non-empty `bearer_token`;
    /// anything else is a [`ProviderError::Credential`] with status and raw body.
    pub async fn obtain_token(&self) -> CallResult<Credential> {
        debug!(url = %self.token_url, ttl_secs = self.ttl_secs, "requesting bearer token");

        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&TokenRequest {
                expire_after: self.ttl_secs,
            })
            .send()
            .await
            .map_err(|e| {
                let cause = send_error(e, self.timeout);
                error!(error = %cause, "token request failed");
                ProviderError::Credential {
                    status: None,
                    body: cause.to_string(),
                }
            })?;

        let status = response.status();
        let (object, body) = read_json_object(response, self.timeout)
            .await
            .map_err(|cause| {
                error!(status = status.as_u16(), error = %cause, "token response unreadable");
                ProviderError::Credential {
                    status: Some(status.as_u16()),
                    body: cause.to_string(),
                }
            })?;

        let token = match (object, status.is_success()) {
            (Some(object), true) => object
                .get("bearer_token")
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            _ => None,
        };

        match token {
            Some(token) => {
                info!("bearer token generated");
                Ok(Credential::new(token))
            }
            None => {
                error!(status = status.as_u16(), body = %body, "token generation failed");
                Err(ProviderError::Credential {
                    status: Some(status.as_u16()),
                    body,
                })
            }
        }
    }
}

/// Per-run token holder: acquires once, then replays the outcome.
#[derive(Debug, Default)]
pub struct TokenSlot {
    cell: OnceCell<CallResult<Credential>>,
}

impl TokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the run's credential, obtaining it on first use.
    ///
    /// Concurrent callers share one acquisition.
    pub async fn ensure(&self, manager: &CredentialManager) -> CallResult<&Credential> {
        self.cell
            .get_or_init(|| manager.obtain_token())
            .await
            .as_ref()
            .map_err(|e| e.clone())
    }

    pub fn is_acquired(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager_for(server: &MockServer) -> CredentialManager {
        let config = ProviderConfig::default()
            .with_credentials("key", "secret")
            .with_endpoints(Endpoints::uniform(server.uri()));
        CredentialManager::new(reqwest::Client::new(), &config)
    }

    #[tokio::test]
    async fn test_obtain_token_success() {
        let server = MockServer::start().await;

        // base64("key:secret")
        Mock::given(method("POST"))
            .and(path("/jwt/v1/generate"))
            .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
            .and(body_json(serde_json::json!({"expireAfter": 3600})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"bearer_token": "jwt-abc"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let credential = manager_for(&server).obtain_token().await.unwrap();
        assert_eq!(credential.token, "jwt-abc");
    }

    #[tokio::test]
    async fn test_obtain_token_http_failure_keeps_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/jwt/v1/generate"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
            .mount(&server)
            .await;

        let err = manager_for(&server).obtain_token().await.unwrap_err();
        match err {
            ProviderError::Credential { status, body } => {
                assert_eq!(status, Some(401));
                assert_eq!(body, "invalid credentials");
            }
            other => panic!("expected Credential error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_obtain_token_missing_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/jwt/v1/generate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "wrong"})),
            )
            .mount(&server)
            .await;

        let err = manager_for(&server).obtain_token().await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Credential {
                status: Some(200),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_slot_acquires_once_and_replays_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/jwt/v1/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let slot = TokenSlot::new();
        assert!(slot.ensure(&manager).await.is_err());
        assert!(slot.ensure(&manager).await.is_err());
        assert!(!slot.is_acquired());
    }

    #[tokio::test]
    async fn test_slot_reuses_acquired_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/jwt/v1/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"bearer_token": "jwt-once"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let slot = TokenSlot::new();
        assert!(!slot.is_acquired());
        assert_eq!(slot.ensure(&manager).await.unwrap().token, "jwt-once");
        assert_eq!(slot.ensure(&manager).await.unwrap().token, "jwt-once");
        assert!(slot.is_acquired());
    }
}
