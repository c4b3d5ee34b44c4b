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

//! Key store recovered from a BIP-39 mnemonic.
//!
//! Validator signing keys follow EIP-2333/EIP-2334: the BIP-39 seed of the
//! phrase and password is the tree root, and validator `i` signs with the key
//! at `m/12381/3600/i/0/0`.
//!
//! Accounts are recovered as a sequence from index 0. A store starting at
//! `start_index` still derives, and drops, every account below it.

use bip39::{Language, Mnemonic};
use eth2_signer_bls::derive::ValidatorKeyDeriver;
use eth2_signer_bls::{BlsPubKey, BlsSecretKey};
use tracing::{debug, info};

use crate::{KeyIndex, KeyStore, KeyVaultError};

#[derive(Debug)]
pub struct MnemonicKeyStore {
    index: KeyIndex,
}

impl MnemonicKeyStore {
    /// Recover accounts `start_index..start_index + num_keys`.
    ///
    /// The exported list starts at `start_index`.
    pub fn new(
        phrase: &str,
        password: &str,
        start_index: u32,
        num_keys: u32,
    ) -> Result<Self, KeyVaultError> {
        let end = start_index
            .checked_add(num_keys)
            .filter(|_| num_keys > 0)
            .ok_or(KeyVaultError::InvalidRange {
                start_index,
                num_keys,
            })?;

        info!("Generating keys from mnemonic");
        let mnemonic = Mnemonic::parse_in(Language::English, phrase.trim())?;
        let seed = mnemonic.to_seed(password);
        let deriver = ValidatorKeyDeriver::from_seed(&seed)
            .map_err(|source| KeyVaultError::Derivation { index: 0, source })?;

        let mut index = KeyIndex::with_capacity(u64::from(num_keys));
        for account in 0..end {
            let keypair = deriver.signing_keypair(account);
            if account < start_index {
                continue;
            }
            debug!(
                account,
                path = %ValidatorKeyDeriver::signing_path(account),
                pubkey = %keypair.pubkey(),
                "Key from mnemonic"
            );
            index.insert(u64::from(account), keypair)?;
        }

        info!(start_index, num_keys = index.len(), "Initialized mnemonic keyvault");
        Ok(Self { index })
    }
}

impl KeyStore for MnemonicKeyStore {
    fn get_secret_key(&self, pubkey: &BlsPubKey) -> Result<&BlsSecretKey, KeyVaultError> {
        self.index.get_secret_key(pubkey)
    }

    fn get_public_keys(&self) -> Result<&[BlsPubKey], KeyVaultError> {
        self.index.get_public_keys()
    }
}
