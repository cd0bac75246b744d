//! `xdh` CLI library
//!
//! Command implementations behind the `xdh` binary:
//! - Key file encoding detection and owner-only private key files
//! - Configuration from `~/.xdh/config.json`
//! - Shared tracing setup

pub mod commands;
pub mod config;
pub mod keyfile;
pub mod tracing_init;
