//! Verification orchestrator.
//!
//! One run: validate inputs, infer the document type, run faceMatch and ocr,
//! then the OCR-dependent pipeline. Errors are recorded in the report, never
//! returned; the caller always gets a complete [`VerificationOutcome`].

use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::ProviderClient;
use crate::error::ReportError;
use crate::types::{
    Capability, ContactInfo, DocumentType, Payload, ProviderResult, TokenResponse,
    VerificationInput, VerificationOutcome, VerificationReport,
};

pub mod pipeline;

use pipeline::{run_dependent_steps, OcrContext};

/// Provider capabilities as seen by the orchestrator.
///
/// Implementations never fail: every call yields a [`ProviderResult`].
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    async fn face_match(&self, document_image: &str, selfie_image: &str) -> ProviderResult;

    async fn extract_document_data(
        &self,
        front_image: &str,
        back_image: Option<&str>,
    ) -> ProviderResult;

    async fn validate_curp(&self, curp: &str) -> ProviderResult;

    async fn validate_ine(&self, ocr: &Payload) -> ProviderResult;

    async fn check_blocklist(
        &self,
        first_name: &str,
        last_name: &str,
        second_last_name: Option<&str>,
    ) -> ProviderResult;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Issue the OCR-dependent calls concurrently.
    pub concurrent_dependent_steps: bool,
}

/// Run one verification against `provider`.
pub async fn run_verification<P: VerificationProvider + ?Sized>(
    provider: &P,
    input: &VerificationInput,
    options: RunOptions,
) -> VerificationOutcome {
    let document_type = input.document_type();
    let report = orchestrate(provider, input, document_type, options).await;

    VerificationOutcome {
        report,
        contact: ContactInfo {
            email: input.email.clone(),
            phone: input.phone.clone(),
            document_type,
        },
    }
}

async fn orchestrate<P: VerificationProvider + ?Sized>(
    provider: &P,
    input: &VerificationInput,
    document_type: DocumentType,
    options: RunOptions,
) -> VerificationReport {
    let (Some(face_image), Some(front_image)) = (input.face_image(), input.front_image()) else {
        warn!("face or front image missing; no provider calls made");
        return VerificationReport::failed(ReportError::MissingBiometricData);
    };

    info!(document_type = %document_type, "starting verification");
    let mut report = VerificationReport::default();

    report.record(
        Capability::FaceMatch,
        provider.face_match(front_image, face_image).await,
    );

    let ocr = provider
        .extract_document_data(front_image, input.back_image())
        .await;

    match ocr_payload(&ocr) {
        Ok(payload) => {
            let ctx = OcrContext::new(payload, document_type);
            for (step, result) in
                run_dependent_steps(provider, &ctx, options.concurrent_dependent_steps).await
            {
                report.record(step, result);
            }
        }
        Err(message) => {
            warn!(message = %message, "OCR failed; dependent steps not run");
            report.error = Some(ReportError::OcrFailed { message });
        }
    }
    report.record(Capability::Ocr, ocr);

    report
}

/// OCR payload when usable; otherwise the message for the aggregate error.
fn ocr_payload(ocr: &ProviderResult) -> Result<&Payload, String> {
    if let Some(message) = ocr.semantic_error() {
        return Err(message);
    }
    match ocr {
        ProviderResult::Success { payload } => Ok(payload),
        ProviderResult::Failure { message, .. } => {
            Err(body_message(message).unwrap_or_else(|| message.clone()))
        }
        ProviderResult::Skipped { message } => Err(message.clone()),
    }
}

/// Provider `mensaje` from a JSON error body, if the failure carried one.
fn body_message(body: &str) -> Option<String> {
    let payload: Payload = serde_json::from_str(body).ok()?;
    payload
        .get("mensaje")
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

/// Entry points over a configured [`ProviderClient`].
#[derive(Debug, Clone)]
pub struct Verifier {
    client: ProviderClient,
}

impl Verifier {
    pub fn new(client: ProviderClient) -> Self {
        Self { client }
    }

    /// Full verification; each call uses its own session and token.
    pub async fn verify(&self, input: &VerificationInput) -> VerificationOutcome {
        let session = self.client.session();
        let options = RunOptions {
            concurrent_dependent_steps: self.client.concurrent_dependent_steps(),
        };
        run_verification(&session, input, options).await
    }

    /// Freshly obtained bearer token; `None` when acquisition failed.
    pub async fn token(&self) -> TokenResponse {
        match self.client.obtain_token().await {
            Ok(credential) => TokenResponse {
                token: Some(credential.token),
            },
            Err(e) => {
                warn!(error = %e, "token request failed");
                TokenResponse { token: None }
            }
        }
    }
}
