//! Common types and utilities shared across commands

use anyhow::{Context, Result};
use clap::Parser;
use hostbind_config::Config;
use hostbind_meta::MetadataStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding a `tracing` filter for library diagnostics
pub const LOG_ENV: &str = "HOSTBIND_LOG";

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Decrease verbosity")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: quiet/warn only
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Route library `tracing` events to stderr. `HOSTBIND_LOG` wins over
/// `RUST_LOG`; without either the filter follows the verbosity level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(hostbind_logger::verbosity_to_filter()));
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);
    if tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_err()
    {
        hostbind_logger::debug("A tracing subscriber was already installed");
    }
}

pub fn load_config() -> Result<Config> {
    let path = Config::path().context("Could not locate the configuration file")?;
    hostbind_logger::debug(&format!("Reading config from: {}", path.display()));
    Config::load_from(&path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Cached store for one host version; an error when no session has built it yet
pub fn load_store(config: &Config, version: &str) -> Result<MetadataStore> {
    let path = config.metadata_cache_file(version)?;
    hostbind_logger::set_current_scope(Some(version.to_string()));
    hostbind_logger::spinner_start(&format!("Loading metadata for {}", version));
    let store = MetadataStore::load_from_path(&path, version);
    hostbind_logger::spinner_stop();
    store.with_context(|| {
        format!(
            "No metadata cache for host version {} at {}",
            version,
            path.display()
        )
    })
}
