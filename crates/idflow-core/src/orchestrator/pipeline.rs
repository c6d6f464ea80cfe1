//! Steps that depend on a successful OCR: curp, ineValidation, blocklist.
//!
//! Each step turns the OCR context into a [`StepPlan`]; plans are resolved in
//! pipeline order, or all at once when concurrency is enabled. The steps never
//! read each other's output.

use futures::future::join_all;
use tracing::debug;

use super::VerificationProvider;
use crate::types::{present, Capability, DocumentType, OcrFields, Payload, ProviderResult};

pub const PASSPORT_SKIP_REASON: &str = "Passport detected (no back image)";
pub const CURP_MISSING_REASON: &str = "CURP not present in OCR result";
pub const NAMES_MISSING_REASON: &str = "Name fields missing from OCR result";

/// Completed OCR output shared by every dependent step.
#[derive(Debug)]
pub struct OcrContext<'a> {
    pub payload: &'a Payload,
    pub fields: OcrFields,
    pub document_type: DocumentType,
}

impl<'a> OcrContext<'a> {
    pub fn new(payload: &'a Payload, document_type: DocumentType) -> Self {
        Self {
            payload,
            fields: OcrFields::from_payload(payload),
            document_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentStep {
    Curp,
    IneValidation,
    Blocklist,
}

/// Pipeline order.
pub const DEPENDENT_STEPS: [DependentStep; 3] = [
    DependentStep::Curp,
    DependentStep::IneValidation,
    DependentStep::Blocklist,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepPlan<'a> {
    Call(StepCall<'a>),
    Skip(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCall<'a> {
    Curp(&'a str),
    IneValidation(&'a Payload),
    Blocklist {
        first_name: &'a str,
        last_name: &'a str,
        second_last_name: Option<&'a str>,
    },
}

impl DependentStep {
    pub fn key(self) -> Capability {
        match self {
            Self::Curp => Capability::Curp,
            Self::IneValidation => Capability::IneValidation,
            Self::Blocklist => Capability::Blocklist,
        }
    }

    pub fn plan<'a>(self, ctx: &'a OcrContext<'a>) -> StepPlan<'a> {
        let fields = &ctx.fields;
        match self {
            Self::Curp => match present(fields.curp.as_deref()) {
                Some(curp) => StepPlan::Call(StepCall::Curp(curp)),
                None => StepPlan::Skip(CURP_MISSING_REASON),
            },
            Self::IneValidation => match ctx.document_type {
                DocumentType::Ine => StepPlan::Call(StepCall::IneValidation(ctx.payload)),
                DocumentType::Passport => StepPlan::Skip(PASSPORT_SKIP_REASON),
            },
            Self::Blocklist => match (
                present(fields.nombres.as_deref()),
                present(fields.primer_apellido.as_deref()),
            ) {
                (Some(first_name), Some(last_name)) => StepPlan::Call(StepCall::Blocklist {
                    first_name,
                    last_name,
                    second_last_name: present(fields.segundo_apellido.as_deref()),
                }),
                _ => StepPlan::Skip(NAMES_MISSING_REASON),
            },
        }
    }
}

impl StepCall<'_> {
    pub async fn execute<P: VerificationProvider + ?Sized>(&self, provider: &P) -> ProviderResult {
        match self {
            Self::Curp(curp) => provider.validate_curp(curp).await,
            Self::IneValidation(ocr) => provider.validate_ine(ocr).await,
            Self::Blocklist {
                first_name,
                last_name,
                second_last_name,
            } => {
                provider
                    .check_blocklist(first_name, last_name, *second_last_name)
                    .await
            }
        }
    }
}

async fn resolve<P: VerificationProvider + ?Sized>(
    provider: &P,
    key: Capability,
    plan: &StepPlan<'_>,
) -> ProviderResult {
    match plan {
        StepPlan::Skip(reason) => {
            debug!(step = %key, reason = *reason, "step skipped");
            ProviderResult::skipped(*reason)
        }
        StepPlan::Call(call) => call.execute(provider).await,
    }
}

/// Resolve every dependent step; results come back in pipeline order.
pub async fn run_dependent_steps<P: VerificationProvider + ?Sized>(
    provider: &P,
    ctx: &OcrContext<'_>,
    concurrent: bool,
) -> Vec<(Capability, ProviderResult)> {
    let plans: Vec<(Capability, StepPlan<'_>)> = DEPENDENT_STEPS
        .iter()
        .map(|step| (step.key(), step.plan(ctx)))
        .collect();

    if concurrent {
        join_all(
            plans
                .iter()
                .map(|(key, plan)| async move { (*key, resolve(provider, *key, plan).await) }),
        )
        .await
    } else {
        let mut results = Vec::with_capacity(plans.len());
        for (key, plan) in &plans {
            results.push((*key, resolve(provider, *key, plan).await));
        }
        results
    }
}
