//! Data model shared by the client and the orchestrator.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ReportError;

/// JSON object returned by a provider call.
pub type Payload = Map<String, Value>;

/// Provider capability, also used as the report key of its step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    FaceMatch,
    Ocr,
    Curp,
    IneValidation,
    Blocklist,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FaceMatch => "faceMatch",
            Self::Ocr => "ocr",
            Self::Curp => "curp",
            Self::IneValidation => "ineValidation",
            Self::Blocklist => "blocklist",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform outcome of one provider call.
///
/// Serialized with a `status` tag: `SUCCESS`, `FAILURE` or `SKIPPED`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderResult {
    /// Provider answered with a JSON object.
    Success { payload: Payload },

    /// Transport, HTTP, credential or body-shape failure.
    #[serde(rename_all = "camelCase")]
    Failure {
        capability: Capability,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        http_status: Option<u16>,
        message: String,
    },

    /// Step deliberately not called.
    Skipped { message: String },
}

impl ProviderResult {
    pub fn skipped(message: impl Into<String>) -> Self {
        Self::Skipped {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success { payload } => Some(payload),
            _ => None,
        }
    }

    /// Business-level error signalled inside a successful response
    /// (`estatus: "ERROR"` with HTTP 200).
    ///
    /// Returns the provider's `mensaje`, or an empty string when absent.
    pub fn semantic_error(&self) -> Option<String> {
        let payload = self.payload()?;
        if payload.get("estatus").and_then(Value::as_str) != Some("ERROR") {
            return None;
        }
        Some(
            payload
                .get("mensaje")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        )
    }
}

/// Document type, derived from the presence of a back image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Ine,
    Passport,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ine => "ine",
            Self::Passport => "passport",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw inputs of one verification run. Images are base64 strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationInput {
    #[serde(default)]
    pub face_image: Option<String>,
    #[serde(default)]
    pub front_image: Option<String>,
    #[serde(default)]
    pub back_image: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl VerificationInput {
    pub fn face_image(&self) -> Option<&str> {
        present(self.face_image.as_deref())
    }

    pub fn front_image(&self) -> Option<&str> {
        present(self.front_image.as_deref())
    }

    pub fn back_image(&self) -> Option<&str> {
        present(self.back_image.as_deref())
    }

    pub fn document_type(&self) -> DocumentType {
        if self.back_image().is_some() {
            DocumentType::Ine
        } else {
            DocumentType::Passport
        }
    }
}

/// `Some` only for non-blank strings.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Fields the orchestrator reads from the OCR payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrFields {
    pub curp: Option<String>,
    pub nombres: Option<String>,
    pub primer_apellido: Option<String>,
    pub segundo_apellido: Option<String>,
}

impl OcrFields {
    /// Read the identity fields; non-string values count as absent.
    pub fn from_payload(payload: &Payload) -> Self {
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            curp: text("curp"),
            nombres: text("nombres"),
            primer_apellido: text("primerApellido"),
            segundo_apellido: text("segundoApellido"),
        }
    }
}

/// Per-step results of one run, keyed like the provider capabilities.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_match: Option<ProviderResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr: Option<ProviderResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curp: Option<ProviderResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ine_validation: Option<ProviderResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocklist: Option<ProviderResult>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_report_error"
    )]
    pub error: Option<ReportError>,
}

fn serialize_report_error<S: Serializer>(
    error: &Option<ReportError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_str(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl VerificationReport {
    pub fn failed(error: ReportError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn record(&mut self, step: Capability, result: ProviderResult) {
        let slot = match step {
            Capability::FaceMatch => &mut self.face_match,
            Capability::Ocr => &mut self.ocr,
            Capability::Curp => &mut self.curp,
            Capability::IneValidation => &mut self.ine_validation,
            Capability::Blocklist => &mut self.blocklist,
        };
        *slot = Some(result);
    }

    pub fn get(&self, step: Capability) -> Option<&ProviderResult> {
        match step {
            Capability::FaceMatch => self.face_match.as_ref(),
            Capability::Ocr => self.ocr.as_ref(),
            Capability::Curp => self.curp.as_ref(),
            Capability::IneValidation => self.ine_validation.as_ref(),
            Capability::Blocklist => self.blocklist.as_ref(),
        }
    }
}

/// Contact details echoed back with the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document_type: DocumentType,
}

/// Everything returned by the verification entry point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    pub report: VerificationReport,
    pub contact: ContactInfo,
}

/// Bearer credential scoped to one run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub obtained_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            obtained_at: Utc::now(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Response of the token entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_document_type_inference() {
        let mut input = VerificationInput::default();
        assert_eq!(input.document_type(), DocumentType::Passport);

        input.back_image = Some("   ".into());
        assert_eq!(input.document_type(), DocumentType::Passport);

        input.back_image = Some("YmFjaw==".into());
        assert_eq!(input.document_type(), DocumentType::Ine);
    }

    #[test]
    fn test_skipped_serialization() {
        let skipped = ProviderResult::skipped("Passport detected (no back image)");
        assert_eq!(
            serde_json::to_value(&skipped).unwrap(),
            json!({"status": "SKIPPED", "message": "Passport detected (no back image)"})
        );
    }

    #[test]
    fn test_failure_serialization() {
        let failure = ProviderResult::Failure {
            capability: Capability::IneValidation,
            http_status: Some(502),
            message: "bad gateway".into(),
        };
        assert_eq!(
            serde_json::to_value(&failure).unwrap(),
            json!({
                "status": "FAILURE",
                "capability": "ineValidation",
                "httpStatus": 502,
                "message": "bad gateway"
            })
        );

        let transport = ProviderResult::Failure {
            capability: Capability::Curp,
            http_status: None,
            message: "connection refused".into(),
        };
        let value = serde_json::to_value(&transport).unwrap();
        assert!(value.get("httpStatus").is_none());
    }

    #[test]
    fn test_semantic_error() {
        let ok = ProviderResult::Success {
            payload: payload(json!({"estatus": "OK"})),
        };
        assert_eq!(ok.semantic_error(), None);

        let err = ProviderResult::Success {
            payload: payload(json!({"estatus": "ERROR", "mensaje": "Imagen no legible"})),
        };
        assert_eq!(err.semantic_error().as_deref(), Some("Imagen no legible"));

        let skipped = ProviderResult::skipped("x");
        assert_eq!(skipped.semantic_error(), None);
    }

    #[test]
    fn test_ocr_fields_ignore_non_strings() {
        let fields = OcrFields::from_payload(&payload(json!({
            "curp": "ABCD800101HDFRRL09",
            "nombres": "JUAN",
            "primerApellido": 7,
        })));
        assert_eq!(fields.curp.as_deref(), Some("ABCD800101HDFRRL09"));
        assert_eq!(fields.nombres.as_deref(), Some("JUAN"));
        assert_eq!(fields.primer_apellido, None);
        assert_eq!(fields.segundo_apellido, None);
    }

    #[test]
    fn test_report_serialization_omits_absent_steps() {
        let report = VerificationReport::failed(ReportError::MissingBiometricData);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({"error": "Missing biometric data"})
        );

        let mut report = VerificationReport::default();
        report.record(Capability::IneValidation, ProviderResult::skipped("why"));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["ineValidation"]["status"], "SKIPPED");
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_credential_debug_redacts_token() {
        let credential = Credential::new("secret-jwt");
        assert!(!format!("{:?}", credential).contains("secret-jwt"));
    }
}
