use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "idflow",
    version,
    about = "Identity verification: face match, document OCR, CURP, INE and blocklist checks"
)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a full verification from image files
    Verify(VerifyArgs),
    /// Obtain a fresh provider bearer token
    Token(TokenArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ProviderArgs {
    /// YAML config file; defaults to NUBARIUM_* environment variables
    #[arg(long, env = "IDFLOW_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Selfie image
    #[arg(long)]
    pub face: Option<PathBuf>,

    /// Front side of the identity document
    #[arg(long)]
    pub front: Option<PathBuf>,

    /// Back side of the document; omit for passports
    #[arg(long)]
    pub back: Option<PathBuf>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// ImageMagick executable used for HEIC/HEIF conversion
    #[arg(long, default_value = "magick")]
    pub magick: PathBuf,

    /// Run CURP, INE and blocklist checks concurrently
    #[arg(long)]
    pub concurrent: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TokenArgs {
    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}
