use idflow_core::Verifier;

use super::provider::{build_client, load_config};
use crate::cli::args::TokenArgs;
use crate::exit_codes;

pub async fn run(args: TokenArgs) -> anyhow::Result<i32> {
    let client = match load_config(&args.provider).and_then(build_client) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e:#}");
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let response = Verifier::new(client).token().await;
    println!("{}", serde_json::to_string(&response)?);

    Ok(if response.token.is_some() {
        exit_codes::SUCCESS
    } else {
        exit_codes::VERIFICATION_FAILED
    })
}
