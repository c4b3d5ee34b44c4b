//! Remote BLS signer for Ethereum consensus validators.
//!
//! Validator secret keys stay inside this daemon. Validator clients connect
//! over a Unix socket, list the public keys on offer and ask for signatures
//! over signing roots they computed themselves.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     Unix Socket      ┌───────────────────────┐
//! │ Validator client │ ◄──────────────────► │ SignerServer          │
//! │                  │  Request/Response    │  └ SigningService     │
//! └──────────────────┘                      │     └ KeyStore        │
//!                                           └───────────────────────┘
//! ```
//!
//! ## Operations
//!
//! - **Sign**: validates the public key, looks up its secret key and signs
//!   the signing root as-is. No slashing protection is applied.
//! - **ListValidatingPublicKeys**: compressed public keys in keyvault order.
//!
//! ## Usage
//!
//! Start the signer daemon:
//! ```bash
//! eth2-signer-daemon \
//!     --socket /var/run/eth2-signer.sock \
//!     --keyvault mnemonic \
//!     --mnemonic-file /path/to/mnemonic.txt \
//!     --start-index 0 \
//!     --num-mnemonic-keys 4
//! ```

pub mod protocol;
pub mod server;
pub mod service;

pub use protocol::{
    Code, ListPublicKeysResponse, Request, Response, SignRequest, SignResponse, SignStatus, Status,
};
pub use server::{ServerConfig, ServerError, SignerClient, SignerServer, DEFAULT_IO_TIMEOUT};
pub use service::SigningService;
