// Copyright (C) 2025 Category Labs, Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Key stores for the remote signer.
//!
//! A [`KeyStore`] answers two questions: which secret key belongs to a
//! public key, and which public keys are available. Stores are built once
//! at startup and never mutated afterwards, so any number of signing
//! requests may read them concurrently without locking.
//!
//! Backends:
//!
//! - [`DeterministicKeyStore`]: publicly known interop keys. Not for production.
//! - [`MnemonicKeyStore`]: validator keys recovered from a BIP-39 mnemonic.

use eth2_signer_bls::{BlsError, BlsPubKey, BlsSecretKey};
use thiserror::Error;

pub mod config;
pub mod deterministic;
pub mod index;
pub mod mnemonic;

pub use config::{KeyVault, KeyVaultConfig, KeyVaultKind};
pub use deterministic::DeterministicKeyStore;
pub use index::KeyIndex;
pub use mnemonic::MnemonicKeyStore;

#[derive(Debug, Error)]
pub enum KeyVaultError {
    #[error("could not find secret key for public key {0}")]
    NotFound(BlsPubKey),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(#[from] bip39::Error),

    #[error("could not derive key at index {index}: {source}")]
    Derivation {
        index: u64,
        #[source]
        source: BlsError,
    },

    #[error("invalid key range: start index {start_index}, {num_keys} keys")]
    InvalidRange { start_index: u32, num_keys: u32 },

    #[error("key at index {index} duplicates public key {pubkey}")]
    DuplicateKey { index: u64, pubkey: BlsPubKey },

    #[error("key store unavailable: {0}")]
    Unavailable(String),
}

/// Source of validator secret keys.
///
/// Implementations must be safe to query from many threads at once.
pub trait KeyStore: Send + Sync {
    /// Secret key for `pubkey`, or [`KeyVaultError::NotFound`].
    fn get_secret_key(&self, pubkey: &BlsPubKey) -> Result<&BlsSecretKey, KeyVaultError>;

    /// All public keys in derivation order.
    fn get_public_keys(&self) -> Result<&[BlsPubKey], KeyVaultError>;
}
