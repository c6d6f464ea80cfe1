use super::args::*;
use crate::exit_codes::SUCCESS;

pub mod provider;
pub mod token;
pub mod verify;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Verify(args) => verify::run(args).await,
        Command::Token(args) => token::run(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}
