//! Remote signer daemon binary.
//!
//! This binary runs as a standalone process that handles signing requests
//! from validator clients via Unix socket.

use clap::Parser;
use eth2_remote_signer::{ServerConfig, SignerServer};
use eth2_signer_keyvault::{KeyVaultConfig, KeyVaultKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Remote BLS signer daemon for Ethereum validators.
#[derive(Parser, Debug)]
#[command(name = "eth2-signer-daemon")]
#[command(about = "Remote signing daemon for Ethereum validators")]
#[command(version)]
struct Args {
    /// Path to Unix socket for client connections
    #[arg(long, default_value = "/var/run/eth2-signer.sock")]
    socket: PathBuf,

    /// Type of keyvault
    #[arg(long, value_enum, default_value_t = KeyVaultKind::Deterministic)]
    keyvault: KeyVaultKind,

    /// Number of deterministic keys to generate (demonstrative purposes)
    #[arg(long, default_value_t = 1)]
    num_deterministic_keys: u64,

    /// Path to the file containing the mnemonic phrase
    #[arg(long, required_if_eq("keyvault", "mnemonic"))]
    mnemonic_file: Option<PathBuf>,

    /// Password of the mnemonic phrase (or use SIGNER_MNEMONIC_PASSWORD env var)
    #[arg(long, env = "SIGNER_MNEMONIC_PASSWORD", default_value = "", hide_env_values = true)]
    mnemonic_password: String,

    /// Start index for mnemonic keys generation
    #[arg(long, default_value_t = 0)]
    start_index: u32,

    /// Number of keys to generate from the mnemonic phrase
    #[arg(long, default_value_t = 1)]
    num_mnemonic_keys: u32,

    /// Seconds a connection may stay idle while reading or writing a frame
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    io_timeout_secs: u64,
}

impl Args {
    fn keyvault_config(&self) -> Result<KeyVaultConfig, String> {
        match self.keyvault {
            KeyVaultKind::Deterministic => Ok(KeyVaultConfig::Deterministic {
                num_keys: self.num_deterministic_keys,
            }),
            KeyVaultKind::Mnemonic => {
                let path = self
                    .mnemonic_file
                    .as_ref()
                    .ok_or_else(|| "You must provide a --mnemonic-file".to_string())?;
                let phrase = std::fs::read_to_string(path)
                    .map_err(|e| format!("Could not read mnemonic file {:?}: {}", path, e))?;
                Ok(KeyVaultConfig::Mnemonic {
                    phrase,
                    password: self.mnemonic_password.clone(),
                    start_index: self.start_index,
                    num_keys: self.num_mnemonic_keys,
                })
            }
        }
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting eth2-signer-daemon");
    info!("Socket path: {:?}", args.socket);

    let keyvault_config = match args.keyvault_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!("Keyvault: {:?}", keyvault_config.kind());

    let keyvault = match keyvault_config.build() {
        Ok(vault) => vault,
        Err(e) => {
            error!("Could not initialize keyvault: {}", e);
            std::process::exit(1);
        }
    };

    // Create server config
    let config = ServerConfig {
        socket_path: args.socket,
        keyvault: Arc::new(keyvault),
        io_timeout: Duration::from_secs(args.io_timeout_secs),
    };

    // Create and run server
    let server = match SignerServer::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create server: {}", e);
            std::process::exit(1);
        }
    };

    info!("Signer daemon ready, waiting for connections...");

    if let Err(e) = server.run() {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
