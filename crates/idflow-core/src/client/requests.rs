//! Request bodies, one per capability. Optional fields are omitted, never null.

use serde::Serialize;
use serde_json::Value;

use crate::types::{present, Payload};

/// Similarity threshold for blocklist lookups (exact-match policy).
pub const BLOCKLIST_SIMILARITY: u8 = 100;

#[derive(Debug, Serialize)]
pub(crate) struct FaceMatchRequest<'a> {
    pub credencial: &'a str,
    pub captura: &'a str,
    pub tipo: &'static str,
}

impl<'a> FaceMatchRequest<'a> {
    pub(crate) fn new(document_image: &'a str, selfie_image: &'a str) -> Self {
        Self {
            credencial: document_image,
            captura: selfie_image,
            tipo: "imagen",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OcrRequest<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_reverso: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CurpRequest<'a> {
    pub curp: &'a str,
}

/// INE nominal-list lookup built from OCR output.
///
/// Which fields the provider needs depends on the credential model (C..H), so
/// every identifier the OCR produced is forwarded as-is (string or number) and
/// the rest left out.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IneValidationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cic: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identificador_ciudadano: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clave_elector: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_emision: Option<Value>,
}

impl IneValidationRequest {
    pub fn from_ocr(ocr: &Payload) -> Self {
        let field = |key: &str| ocr.get(key).filter(|v| is_present(v)).cloned();
        Self {
            cic: field("cic"),
            identificador_ciudadano: field("identificadorCiudadano"),
            ocr: field("ocr"),
            clave_elector: field("claveElector"),
            numero_emision: field("numeroEmision"),
        }
    }
}

/// Null and blank strings count as absent; any other value is kept.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => present(Some(s)).is_some(),
        _ => true,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BlocklistRequest {
    pub nombre_completo: String,
    pub similitud: u8,
}

impl BlocklistRequest {
    pub(crate) fn new(full_name: String) -> Self {
        Self {
            nombre_completo: full_name,
            similitud: BLOCKLIST_SIMILARITY,
        }
    }
}

/// Join name parts with single spaces, trimming each and dropping blanks.
pub fn full_name(first_name: &str, last_name: &str, second_last_name: Option<&str>) -> String {
    [Some(first_name), Some(last_name), second_last_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_name_trims_and_skips_missing() {
        assert_eq!(full_name(" JUAN ", "PEREZ", Some("LOPEZ ")), "JUAN PEREZ LOPEZ");
        assert_eq!(full_name("JUAN", "PEREZ", None), "JUAN PEREZ");
        assert_eq!(full_name("JUAN", "PEREZ", Some("   ")), "JUAN PEREZ");
    }

    #[test]
    fn test_ine_request_omits_absent_fields() {
        let ocr = json!({
            "cic": "123456789",
            "claveElector": "PRPRJN80010109H100",
            "ocr": "",
            "numeroEmision": null,
            "nombres": "JUAN"
        });
        let request = IneValidationRequest::from_ocr(ocr.as_object().unwrap());

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"cic": "123456789", "claveElector": "PRPRJN80010109H100"})
        );
    }

    #[test]
    fn test_ine_request_keeps_numeric_identifiers() {
        let ocr = json!({
            "cic": 123456789,
            "numeroEmision": 2,
            "claveElector": "PRPRJN80010109H100",
            "identificadorCiudadano": "  "
        });
        let request = IneValidationRequest::from_ocr(ocr.as_object().unwrap());

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "cic": 123456789,
                "claveElector": "PRPRJN80010109H100",
                "numeroEmision": 2
            })
        );
    }

    #[test]
    fn test_ocr_request_omits_missing_back() {
        let front_only = OcrRequest {
            id: "ZnJvbnQ=",
            id_reverso: None,
        };
        assert_eq!(
            serde_json::to_value(&front_only).unwrap(),
            json!({"id": "ZnJvbnQ="})
        );

        let both = OcrRequest {
            id: "ZnJvbnQ=",
            id_reverso: Some("YmFjaw=="),
        };
        assert_eq!(
            serde_json::to_value(&both).unwrap(),
            json!({"id": "ZnJvbnQ=", "idReverso": "YmFjaw=="})
        );
    }

    #[test]
    fn test_blocklist_request_shape() {
        let request = BlocklistRequest::new(full_name("JUAN", "PEREZ", None));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"nombreCompleto": "JUAN PEREZ", "similitud": 100})
        );
    }
}
