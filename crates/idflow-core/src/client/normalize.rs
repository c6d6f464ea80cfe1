//! Response normalization: every provider call ends as a [`ProviderResult`].

use tracing::{error, info};

use crate::error::{CallResult, ProviderError};
use crate::types::{Capability, Payload, ProviderResult};

/// Turn the outcome of one call into the uniform result shape, logging it.
pub fn normalize(capability: Capability, outcome: CallResult<Payload>) -> ProviderResult {
    match outcome {
        Ok(payload) => {
            info!(capability = %capability, "provider call succeeded");
            ProviderResult::Success { payload }
        }
        Err(err) => {
            log_failure(capability, &err);
            failure(capability, &err)
        }
    }
}

/// Failure result for an error, keeping the HTTP status when one was received.
pub fn failure(capability: Capability, err: &ProviderError) -> ProviderResult {
    let message = match err {
        // raw body is the most useful diagnostic for HTTP errors
        ProviderError::Http { body, .. } => body.clone(),
        other => other.to_string(),
    };
    ProviderResult::Failure {
        capability,
        http_status: err.status(),
        message,
    }
}

fn log_failure(capability: Capability, err: &ProviderError) {
    match err {
        ProviderError::Http { status, body } | ProviderError::InvalidResponse { status, body } => {
            error!(capability = %capability, status = *status, body = %body, "provider call failed");
        }
        other => {
            error!(capability = %capability, error = %other, "provider call failed");
        }
    }
}
