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

//! Keyvault selection at startup.
//!
//! ## Usage
//!
//! ```ignore
//! use eth2_signer_keyvault::{KeyStore, KeyVaultConfig};
//!
//! let config = KeyVaultConfig::Deterministic { num_keys: 4 };
//! let vault = config.build()?;
//! let pubkeys = vault.get_public_keys()?;
//! ```

use std::fmt;

use clap::ValueEnum;
use eth2_signer_bls::{BlsPubKey, BlsSecretKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{DeterministicKeyStore, KeyStore, KeyVaultError, MnemonicKeyStore};

/// Kinds of keyvault the daemon can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyVaultKind {
    /// Publicly known interop keys (demo only)
    Deterministic,
    /// Keys recovered from a BIP-39 mnemonic
    Mnemonic,
}

/// Everything needed to build a keyvault.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyVaultConfig {
    Deterministic {
        num_keys: u64,
    },
    Mnemonic {
        phrase: String,
        #[serde(default)]
        password: String,
        #[serde(default)]
        start_index: u32,
        num_keys: u32,
    },
}

impl KeyVaultConfig {
    pub fn kind(&self) -> KeyVaultKind {
        match self {
            KeyVaultConfig::Deterministic { .. } => KeyVaultKind::Deterministic,
            KeyVaultConfig::Mnemonic { .. } => KeyVaultKind::Mnemonic,
        }
    }

    /// Build the keyvault. Errors here are fatal to startup.
    pub fn build(&self) -> Result<KeyVault, KeyVaultError> {
        match self {
            KeyVaultConfig::Deterministic { num_keys } => {
                warn!(
                    "You are using a deterministic keyvault (only for reference purposes) \
                     DO NOT USE in production"
                );
                DeterministicKeyStore::new(*num_keys).map(KeyVault::Deterministic)
            }
            KeyVaultConfig::Mnemonic {
                phrase,
                password,
                start_index,
                num_keys,
            } => {
                warn!("Using a mnemonic to recover keys from");
                MnemonicKeyStore::new(phrase, password, *start_index, *num_keys)
                    .map(KeyVault::Mnemonic)
            }
        }
    }
}

impl fmt::Debug for KeyVaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyVaultConfig::Deterministic { num_keys } => f
                .debug_struct("Deterministic")
                .field("num_keys", num_keys)
                .finish(),
            KeyVaultConfig::Mnemonic {
                start_index,
                num_keys,
                ..
            } => f
                .debug_struct("Mnemonic")
                .field("phrase", &"<redacted>")
                .field("password", &"<redacted>")
                .field("start_index", start_index)
                .field("num_keys", num_keys)
                .finish(),
        }
    }
}

/// A built keyvault, one variant per backend.
#[derive(Debug)]
pub enum KeyVault {
    Deterministic(DeterministicKeyStore),
    Mnemonic(MnemonicKeyStore),
}

impl KeyStore for KeyVault {
    fn get_secret_key(&self, pubkey: &BlsPubKey) -> Result<&BlsSecretKey, KeyVaultError> {
        match self {
            KeyVault::Deterministic(store) => store.get_secret_key(pubkey),
            KeyVault::Mnemonic(store) => store.get_secret_key(pubkey),
        }
    }

    fn get_public_keys(&self) -> Result<&[BlsPubKey], KeyVaultError> {
        match self {
            KeyVault::Deterministic(store) => store.get_public_keys(),
            KeyVault::Mnemonic(store) => store.get_public_keys(),
        }
    }
}
