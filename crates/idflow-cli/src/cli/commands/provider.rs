use anyhow::Context;
use idflow_core::{ProviderClient, ProviderConfig};

use crate::cli::args::ProviderArgs;

/// Config from `--config` (with env fallbacks) or from the environment alone.
pub fn load_config(args: &ProviderArgs) -> anyhow::Result<ProviderConfig> {
    match &args.config {
        Some(path) => ProviderConfig::from_yaml_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(ProviderConfig::from_env()),
    }
}

pub fn build_client(config: ProviderConfig) -> anyhow::Result<ProviderClient> {
    ProviderClient::new(config).context("invalid provider configuration")
}
