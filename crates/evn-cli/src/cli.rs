use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "evn",
    about = "Evidence Vault Notary — tamper-evident evidence commitments",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the normalized leaf hash of one evidence text
    LeafHash(LeafHashArgs),
    /// Compute the Merkle root over an evidence file (one item per line)
    Root(RootArgs),
    /// Notarize an evidence file against a local in-memory devnet
    Notarize(NotarizeArgs),
}

#[derive(Args)]
pub struct LeafHashArgs {
    /// Evidence text (normalized before hashing)
    pub text: String,
}

#[derive(Args)]
pub struct RootArgs {
    /// Path to the evidence file, one item per line
    pub file: std::path::PathBuf,
}

#[derive(Args)]
pub struct NotarizeArgs {
    /// Path to the evidence file, one item per line
    pub file: std::path::PathBuf,

    /// Run identifier to notarize under
    #[arg(long, default_value = "local-run")]
    pub run_id: String,

    /// Also seal and commit the full audit record
    #[arg(long)]
    pub audit: bool,
}
