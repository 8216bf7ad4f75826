use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tipjar_sdk::{AssetKind, Role};

#[derive(Parser)]
#[command(
    name = "tipjar",
    about = "Tipjar: creator registry, tip ledger, and statistics",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Check an address against an asset's grammar
    CheckAddress(CheckAddressArgs),
    /// Show pool-wide or per-recipient statistics from a snapshot
    Stats(StatsArgs),
    /// Rank recipients by lifetime tips
    Top(TopArgs),
    /// List tips sent or received by an address
    History(HistoryArgs),
    /// Verify a snapshot's hash chain and aggregates
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML server configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured bind address
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
    /// Start from an exported snapshot instead of an empty pool
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckAddressArgs {
    #[arg(short, long, default_value = "stacks")]
    pub asset: AssetKind,
    pub address: String,
}

#[derive(Args)]
pub struct StatsArgs {
    pub snapshot: PathBuf,
    /// Limit output to one recipient
    pub recipient: Option<String>,
}

#[derive(Args)]
pub struct TopArgs {
    pub snapshot: PathBuf,
    /// Number of recipients to show (defaults to 10)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct HistoryArgs {
    pub snapshot: PathBuf,
    pub address: String,
    #[arg(short, long, default_value = "recipient")]
    pub role: Role,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub snapshot: PathBuf,
}
