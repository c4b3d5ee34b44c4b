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

//! Deterministic key store.
//!
//! WARNING: every key in this store can be recomputed by anyone from its
//! index. Use it for demos and test networks only.

use eth2_signer_bls::derive::deterministic_keypair;
use eth2_signer_bls::{BlsPubKey, BlsSecretKey};
use tracing::{info, warn};

use crate::{KeyIndex, KeyStore, KeyVaultError};

#[derive(Debug)]
pub struct DeterministicKeyStore {
    index: KeyIndex,
}

impl DeterministicKeyStore {
    /// Generate the interop keys `0..num_keys`.
    pub fn new(num_keys: u64) -> Result<Self, KeyVaultError> {
        info!("Generating {} deterministic keys...", num_keys);

        let mut index = KeyIndex::with_capacity(num_keys);
        for i in 0..num_keys {
            let keypair = deterministic_keypair(i)
                .map_err(|source| KeyVaultError::Derivation { index: i, source })?;
            index.insert(i, keypair)?;
        }

        if index.is_empty() {
            warn!("Deterministic keyvault holds no keys");
        }
        info!(num_keys = index.len(), "Initialized deterministic keyvault");
        Ok(Self { index })
    }
}

impl KeyStore for DeterministicKeyStore {
    fn get_secret_key(&self, pubkey: &BlsPubKey) -> Result<&BlsSecretKey, KeyVaultError> {
        self.index.get_secret_key(pubkey)
    }

    fn get_public_keys(&self) -> Result<&[BlsPubKey], KeyVaultError> {
        self.index.get_public_keys()
    }
}
