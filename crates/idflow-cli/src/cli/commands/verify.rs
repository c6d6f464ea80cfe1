use std::path::Path;

use anyhow::Context;
use idflow_core::{
    encode_upload, Capability, ImageConverter, ImageUpload, MagickConverter, ProviderResult,
    VerificationInput, VerificationOutcome, Verifier,
};

use super::provider::{build_client, load_config};
use crate::cli::args::{OutputFormat, VerifyArgs};
use crate::exit_codes;

const REPORT_STEPS: [Capability; 5] = [
    Capability::FaceMatch,
    Capability::Ocr,
    Capability::Curp,
    Capability::IneValidation,
    Capability::Blocklist,
];

pub async fn run(args: VerifyArgs) -> anyhow::Result<i32> {
    // 1. Provider client
    let client = match load_config(&args.provider).and_then(|cfg| {
        let concurrent = cfg.concurrent_dependent_steps || args.concurrent;
        build_client(cfg.with_concurrent_dependent_steps(concurrent))
    }) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    // 2. Encode images
    let converter = MagickConverter::with_program(&args.magick);
    let input = VerificationInput {
        face_image: encode_path(args.face.as_deref(), &converter).await?,
        front_image: encode_path(args.front.as_deref(), &converter).await?,
        back_image: encode_path(args.back.as_deref(), &converter).await?,
        email: args.email.clone(),
        phone: args.phone.clone(),
    };

    // 3. Run
    let outcome = Verifier::new(client).verify(&input).await;
    tracing::info!(
        document_type = %outcome.contact.document_type,
        failed = outcome.report.error.is_some(),
        "verification finished"
    );

    // 4. Print
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Text => print!("{}", render_text(&outcome)),
    }

    Ok(if outcome.report.error.is_some() {
        exit_codes::VERIFICATION_FAILED
    } else {
        exit_codes::SUCCESS
    })
}

async fn encode_path<C: ImageConverter>(
    path: Option<&Path>,
    converter: &C,
) -> anyhow::Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let upload = ImageUpload::from_path(path)
        .await
        .with_context(|| format!("reading image {}", path.display()))?;
    Ok(Some(encode_upload(&upload, converter).await))
}

fn render_text(outcome: &VerificationOutcome) -> String {
    let mut out = String::new();
    let contact = &outcome.contact;
    out.push_str(&format!("document type: {}\n", contact.document_type));
    if let Some(email) = &contact.email {
        out.push_str(&format!("email: {}\n", email));
    }
    if let Some(phone) = &contact.phone {
        out.push_str(&format!("phone: {}\n", phone));
    }

    for step in REPORT_STEPS {
        let Some(result) = outcome.report.get(step) else {
            continue;
        };
        let line = match result {
            ProviderResult::Success { .. } => "SUCCESS".to_string(),
            ProviderResult::Failure {
                http_status: Some(status),
                message,
                ..
            } => format!("FAILURE (HTTP {}) {}", status, message),
            ProviderResult::Failure { message, .. } => format!("FAILURE {}", message),
            ProviderResult::Skipped { message } => format!("SKIPPED ({})", message),
        };
        out.push_str(&format!("{}: {}\n", step, line));
    }

    if let Some(error) = &outcome.report.error {
        out.push_str(&format!("error: {}\n", error));
    }
    out
}
