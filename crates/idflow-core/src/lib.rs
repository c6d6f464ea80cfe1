//! Identity-verification orchestration over the Nubarium provider APIs.
//!
//! This crate provides:
//!
//! - Bearer-token acquisition scoped to one verification run
//! - A typed client with one method per provider capability
//! - Normalization of every provider answer into a [`ProviderResult`]
//! - The orchestrator that sequences face match, OCR, CURP, INE and blocklist
//!   checks into a single [`VerificationReport`]
//! - Image ingestion (base64 encoding with HEIC/HEIF conversion)
//!
//! # Quick Start
//!
//! ```no_run
//! use idflow_core::{ProviderClient, VerificationInput, Verifier};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let verifier = Verifier::new(ProviderClient::from_env()?);
//!
//! let input = VerificationInput {
//!     face_image: Some("<base64 selfie>".into()),
//!     front_image: Some("<base64 front>".into()),
//!     ..Default::default()
//! };
//! let outcome = verifier.verify(&input).await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! See [`config`] for the environment variables and YAML layout.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod orchestrator;
pub mod types;

// Re-export main types
pub use auth::{CredentialManager, TokenSlot};
pub use client::normalize::normalize;
pub use client::requests::{full_name, IneValidationRequest, BLOCKLIST_SIMILARITY};
pub use client::{ProviderClient, ProviderSession};
pub use config::{Endpoints, ProviderConfig};
pub use error::{CallResult, ConfigError, ProviderError, ReportError};
pub use image::{
    encode_upload, ConversionError, ImageConverter, ImageUpload, MagickConverter,
    PassthroughConverter,
};
pub use orchestrator::pipeline::{
    DependentStep, CURP_MISSING_REASON, NAMES_MISSING_REASON, PASSPORT_SKIP_REASON,
};
pub use orchestrator::{run_verification, RunOptions, VerificationProvider, Verifier};
pub use types::{
    Capability, ContactInfo, Credential, DocumentType, OcrFields, Payload, ProviderResult,
    TokenResponse, VerificationInput, VerificationOutcome, VerificationReport,
};
