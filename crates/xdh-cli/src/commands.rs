//! `xdh` subcommands.
//!
//! Each command writes its user-facing output to the supplied writer so the
//! binary can pass stdout and tests can pass a buffer.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;
use xdh_crypto::X25519PrivateKey;

use crate::config::CliConfig;
use crate::keyfile::{self, KeyEncoding};

#[derive(Debug, Args)]
pub struct GenkeyArgs {
    /// Where to write the new private key
    #[arg(short, long)]
    pub out: PathBuf,

    /// Private key encoding (defaults to the config value, then pem)
    #[arg(short, long, value_enum)]
    pub encoding: Option<KeyEncoding>,
}

#[derive(Debug, Args)]
pub struct PubkeyArgs {
    /// Private key file
    #[arg(short, long)]
    pub key: PathBuf,

    /// Public key encoding (defaults to the config value, then pem)
    #[arg(short, long, value_enum)]
    pub encoding: Option<KeyEncoding>,

    /// Write to this file instead of printing
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExchangeArgs {
    /// Our private key file
    #[arg(short, long)]
    pub key: PathBuf,

    /// Peer public key file
    #[arg(short, long)]
    pub peer: PathBuf,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Key file to convert (private unless --public)
    #[arg(short, long)]
    pub key: PathBuf,

    /// Target encoding
    #[arg(short, long, value_enum)]
    pub to: KeyEncoding,

    /// Output file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Treat the input as a public key
    #[arg(long)]
    pub public: bool,
}

/// Generate a private key, save it, and print its public key.
pub fn genkey(args: &GenkeyArgs, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    let encoding = config.encoding_or(args.encoding);
    let key = X25519PrivateKey::generate();
    keyfile::save_private_key(&args.out, &key, encoding)?;
    info!(path = %args.out.display(), ?encoding, "generated private key");

    let public = key.public_key().public_bytes_raw()?;
    writeln!(out, "{}", hex::encode(public))?;
    Ok(())
}

/// Derive the public key for a private key file.
pub fn pubkey(args: &PubkeyArgs, config: &CliConfig, out: &mut dyn Write) -> Result<()> {
    let encoding = config.encoding_or(args.encoding);
    let public = keyfile::load_private_key(&args.key)?.public_key();

    if let Some(path) = &args.out {
        keyfile::save_public_key(path, &public, encoding)?;
        info!(path = %path.display(), ?encoding, "wrote public key");
        return Ok(());
    }
    print_key(out, &keyfile::encode_public(&public, encoding)?, encoding)
}

/// Compute and print the raw X25519 shared secret.
pub fn exchange(args: &ExchangeArgs, out: &mut dyn Write) -> Result<()> {
    let key = keyfile::load_private_key(&args.key)?;
    let peer = keyfile::load_public_key(&args.peer)?;
    let shared = key.exchange(&peer)?;
    info!(peer = %args.peer.display(), "computed shared secret");

    let encoded = zeroize::Zeroizing::new(hex::encode(shared.as_bytes()));
    writeln!(out, "{}", encoded.as_str())?;
    Ok(())
}

/// Re-encode a key file.
pub fn convert(args: &ConvertArgs) -> Result<()> {
    if args.public {
        let public = keyfile::load_public_key(&args.key)?;
        keyfile::save_public_key(&args.out, &public, args.to)?;
    } else {
        let key = keyfile::load_private_key(&args.key)?;
        keyfile::save_private_key(&args.out, &key, args.to)?;
    }
    info!(from = %args.key.display(), to = %args.out.display(), encoding = ?args.to, "converted key");
    Ok(())
}

fn print_key(out: &mut dyn Write, bytes: &[u8], encoding: KeyEncoding) -> Result<()> {
    if encoding.is_text() {
        out.write_all(bytes)?;
    } else {
        writeln!(out, "{}", hex::encode(bytes))?;
    }
    Ok(())
}
