//! Provider client: one typed method per capability.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs,
//! all result shaping in normalize.rs.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::auth::{CredentialManager, TokenSlot};
use crate::config::{Endpoints, ProviderConfig};
use crate::error::{CallResult, ProviderError};
use crate::orchestrator::VerificationProvider;
use crate::types::{Capability, Credential, Payload, ProviderResult};

pub(crate) mod http;
pub mod normalize;
pub mod requests;

use http::HttpBackend;
use normalize::normalize;
use requests::{
    full_name, BlocklistRequest, CurpRequest, FaceMatchRequest, IneValidationRequest, OcrRequest,
};

const FACE_MATCH_PATH: &str = "/antifraude/reconocimiento_facial";
const OCR_PATH: &str = "/ocr/v1/obtener_datos_id";
const CURP_PATH: &str = "/renapo/v3/valida_curp";
const INE_PATH: &str = "/ine/v2/valida_ine";
const BLOCKLIST_PATH: &str = "/blacklists/v1/consulta";

/// Client for the verification provider.
///
/// Holds no credential itself; tokens live in the [`ProviderSession`] of each run.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: HttpBackend,
    credentials: CredentialManager,
    endpoints: Endpoints,
    concurrent_dependent_steps: bool,
}

impl ProviderClient {
    pub fn new(config: ProviderConfig) -> CallResult<Self> {
        config.validate().map_err(|e| ProviderError::Config {
            message: e.to_string(),
        })?;

        let http = HttpBackend::new(config.timeout())?;
        let credentials = CredentialManager::new(http.client.clone(), &config);
        let endpoints = Endpoints {
            api: trim_base(&config.endpoints.api),
            curp: trim_base(&config.endpoints.curp),
            ine: trim_base(&config.endpoints.ine),
            ocr: trim_base(&config.endpoints.ocr),
            biometrics: trim_base(&config.endpoints.biometrics),
            sdk: trim_base(&config.endpoints.sdk),
        };

        Ok(Self {
            http,
            credentials,
            endpoints,
            concurrent_dependent_steps: config.concurrent_dependent_steps,
        })
    }

    pub fn from_env() -> CallResult<Self> {
        Self::new(ProviderConfig::from_env())
    }

    /// Obtain a fresh bearer token, outside of any run.
    pub async fn obtain_token(&self) -> CallResult<Credential> {
        self.credentials.obtain_token().await
    }

    /// Start a run: a session that acquires its own token on first use.
    pub fn session(&self) -> ProviderSession<'_> {
        ProviderSession {
            client: self,
            token: TokenSlot::new(),
        }
    }

    pub fn concurrent_dependent_steps(&self) -> bool {
        self.concurrent_dependent_steps
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Per-run view of the client, owning the run's credential.
#[derive(Debug)]
pub struct ProviderSession<'a> {
    client: &'a ProviderClient,
    token: TokenSlot,
}

impl ProviderSession<'_> {
    /// Ensure a token, then issue exactly one request; never fails.
    async fn call<B: Serialize + Sync + ?Sized>(
        &self,
        capability: Capability,
        url: String,
        body: &B,
    ) -> ProviderResult {
        let outcome: CallResult<Payload> = match self.token.ensure(&self.client.credentials).await
        {
            Ok(credential) => {
                self.client
                    .http
                    .post_json(&url, &credential.token, body)
                    .await
            }
            Err(err) => Err(err),
        };
        normalize(capability, outcome)
    }

    pub fn has_token(&self) -> bool {
        self.token.is_acquired()
    }

    /// Liveness/face comparison of the document photo against the selfie.
    pub async fn face_match(&self, document_image: &str, selfie_image: &str) -> ProviderResult {
        info!(
            document_len = document_image.len(),
            selfie_len = selfie_image.len(),
            "performing face match"
        );
        let url = format!("{}{}", self.client.endpoints.biometrics, FACE_MATCH_PATH);
        self.call(
            Capability::FaceMatch,
            url,
            &FaceMatchRequest::new(document_image, selfie_image),
        )
        .await
    }

    /// OCR of the document; the back side is sent only when present.
    pub async fn extract_document_data(
        &self,
        front_image: &str,
        back_image: Option<&str>,
    ) -> ProviderResult {
        info!(with_back = back_image.is_some(), "extracting document data");
        let url = format!("{}{}", self.client.endpoints.ocr, OCR_PATH);
        self.call(
            Capability::Ocr,
            url,
            &OcrRequest {
                id: front_image,
                id_reverso: back_image,
            },
        )
        .await
    }

    /// Validate a CURP against RENAPO.
    pub async fn validate_curp(&self, curp: &str) -> ProviderResult {
        info!("validating CURP");
        let url = format!("{}{}", self.client.endpoints.curp, CURP_PATH);
        self.call(Capability::Curp, url, &CurpRequest { curp }).await
    }

    /// Validate an INE credential against the nominal list.
    pub async fn validate_ine(&self, ocr: &Payload) -> ProviderResult {
        let request = IneValidationRequest::from_ocr(ocr);
        info!(has_cic = request.cic.is_some(), "validating INE");
        let url = format!("{}{}", self.client.endpoints.ine, INE_PATH);
        self.call(Capability::IneValidation, url, &request).await
    }

    /// Screen the full name against the blocklist.
    pub async fn check_blocklist(
        &self,
        first_name: &str,
        last_name: &str,
        second_last_name: Option<&str>,
    ) -> ProviderResult {
        info!("checking blocklist");
        let url = format!("{}{}", self.client.endpoints.api, BLOCKLIST_PATH);
        let request = BlocklistRequest::new(full_name(first_name, last_name, second_last_name));
        self.call(Capability::Blocklist, url, &request).await
    }
}

#[async_trait]
impl<'a> VerificationProvider for ProviderSession<'a> {
    async fn face_match(&self, document_image: &str, selfie_image: &str) -> ProviderResult {
        ProviderSession::face_match(self, document_image, selfie_image).await
    }

    async fn extract_document_data(
        &self,
        front_image: &str,
        back_image: Option<&str>,
    ) -> ProviderResult {
        ProviderSession::extract_document_data(self, front_image, back_image).await
    }

    async fn validate_curp(&self, curp: &str) -> ProviderResult {
        ProviderSession::validate_curp(self, curp).await
    }

    async fn validate_ine(&self, ocr: &Payload) -> ProviderResult {
        ProviderSession::validate_ine(self, ocr).await
    }

    async fn check_blocklist(
        &self,
        first_name: &str,
        last_name: &str,
        second_last_name: Option<&str>,
    ) -> ProviderResult {
        ProviderSession::check_blocklist(self, first_name, last_name, second_last_name).await
    }
}
