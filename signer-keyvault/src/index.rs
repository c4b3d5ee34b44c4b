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

//! Reverse index shared by the key store backends.

use std::collections::HashMap;

use eth2_signer_bls::{BlsKeyPair, BlsPubKey, BlsSecretKey, PubKeyBytes};

use crate::{KeyStore, KeyVaultError};

/// Upper bound on the number of entries reserved up front. Larger stores
/// still work and grow as keys are inserted.
pub const MAX_PREALLOCATED_KEYS: usize = 1 << 16;

/// Public keys in insertion order plus a map from compressed public key
/// to secret key.
///
/// Only [`KeyIndex::insert`] mutates, and it takes `&mut self`; once a store
/// owns the index it is only ever read.
#[derive(Debug, Default)]
pub struct KeyIndex {
    pubkeys: Vec<BlsPubKey>,
    secrets: HashMap<PubKeyBytes, BlsSecretKey>,
}

impl KeyIndex {
    /// Reserve room for `num_keys` entries, at most [`MAX_PREALLOCATED_KEYS`].
    pub fn with_capacity(num_keys: u64) -> Self {
        let capacity = usize::try_from(num_keys)
            .unwrap_or(usize::MAX)
            .min(MAX_PREALLOCATED_KEYS);
        Self {
            pubkeys: Vec::with_capacity(capacity),
            secrets: HashMap::with_capacity(capacity),
        }
    }

    /// Append the key pair derived at `index`.
    ///
    /// A public key that is already present is rejected and leaves the
    /// index unchanged.
    pub fn insert(&mut self, index: u64, keypair: BlsKeyPair) -> Result<(), KeyVaultError> {
        let (secret, pubkey) = keypair.into_parts();
        let key = pubkey.compress();
        if self.secrets.contains_key(&key) {
            return Err(KeyVaultError::DuplicateKey { index, pubkey });
        }
        self.secrets.insert(key, secret);
        self.pubkeys.push(pubkey);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pubkeys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pubkeys.is_empty()
    }
}

impl KeyStore for KeyIndex {
    fn get_secret_key(&self, pubkey: &BlsPubKey) -> Result<&BlsSecretKey, KeyVaultError> {
        self.secrets
            .get(&pubkey.compress())
            .ok_or(KeyVaultError::NotFound(*pubkey))
    }

    fn get_public_keys(&self) -> Result<&[BlsPubKey], KeyVaultError> {
        Ok(&self.pubkeys)
    }
}
