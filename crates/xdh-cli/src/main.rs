//! xdh CLI
//!
//! Generate X25519 keys, derive public keys, compute shared secrets and
//! convert between PEM, DER and raw key files.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use xdh_cli::commands::{self, ConvertArgs, ExchangeArgs, GenkeyArgs, PubkeyArgs};
use xdh_cli::config::CliConfig;
use xdh_cli::tracing_init::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "xdh", version, about = "X25519 key agreement tool")]
struct Cli {
    /// Config file (defaults to ~/.xdh/config.json)
    #[arg(long, global = true, env = "XDH_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON log lines on stderr
    #[arg(long, global = true, env = "XDH_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a private key file and print its public key
    Genkey(GenkeyArgs),
    /// Derive the public key of a private key file
    Pubkey(PubkeyArgs),
    /// Print the raw shared secret between a private key and a peer public key
    Exchange(ExchangeArgs),
    /// Re-encode a key file as PEM, DER or raw bytes
    Convert(ConvertArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli
        .config
        .as_deref()
        .map_or_else(CliConfig::load, CliConfig::load_from);
    init_tracing(config.log_filter(), cli.log_json || config.log_json);
    debug!(version = env!("CARGO_PKG_VERSION"), ?config, "starting xdh");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Commands::Genkey(args) => commands::genkey(args, &config, &mut stdout),
        Commands::Pubkey(args) => commands::pubkey(args, &config, &mut stdout),
        Commands::Exchange(args) => commands::exchange(args, &mut stdout),
        Commands::Convert(args) => commands::convert(args),
    }
}
