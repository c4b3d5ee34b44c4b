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

//! Key pair derivation.
//!
//! Both schemes are pure functions of their inputs.

use blst::min_pk::SecretKey;
use sha2::{Digest, Sha256};

use crate::{BlsError, BlsKeyPair, BlsSecretKey, SECRET_KEY_LENGTH};

/// BLS12-381 scalar field order `r`, big-endian.
const CURVE_ORDER: [u8; 32] = [
    0x73, 0xed, 0xa7, 0x53, 0x29, 0x9d, 0x7d, 0x48, 0x33, 0x39, 0xd8, 0x08, 0x09, 0xa1, 0xd8, 0x05,
    0x53, 0xbd, 0xa4, 0x02, 0xff, 0xfe, 0x5b, 0xfe, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x01,
];

/// EIP-2334 purpose level.
pub const PURPOSE: u32 = 12381;

/// EIP-2334 coin type for Ethereum.
pub const COIN_TYPE: u32 = 3600;

/// Deterministic interop key pair for `index`.
///
/// The secret key is `sha256(le_bytes32(index))`, read as a little-endian
/// integer and reduced mod `r`. Anyone can recompute these keys; they are
/// only meant for test networks.
pub fn deterministic_keypair(index: u64) -> Result<BlsKeyPair, BlsError> {
    let mut enc = [0u8; 32];
    enc[..8].copy_from_slice(&index.to_le_bytes());
    let digest: [u8; 32] = Sha256::digest(enc).into();

    let mut scalar = digest;
    scalar.reverse();
    reduce_mod_order(&mut scalar);

    BlsKeyPair::from_bytes(&scalar)
}

/// Reduce a big-endian 256-bit integer modulo [`CURVE_ORDER`] in place.
///
/// `2^256 < 3r`, so at most two subtractions are needed.
fn reduce_mod_order(value: &mut [u8; SECRET_KEY_LENGTH]) {
    while *value >= CURVE_ORDER {
        let mut borrow = 0u16;
        for i in (0..SECRET_KEY_LENGTH).rev() {
            let rhs = CURVE_ORDER[i] as u16 + borrow;
            let lhs = value[i] as u16;
            if lhs >= rhs {
                value[i] = (lhs - rhs) as u8;
                borrow = 0;
            } else {
                value[i] = (lhs + 256 - rhs) as u8;
                borrow = 1;
            }
        }
    }
}

/// EIP-2333 derivation of validator signing keys from a seed.
///
/// Holds the `m/12381/3600` node; each account then walks
/// `m/12381/3600/{account}/0/0`.
pub struct ValidatorKeyDeriver {
    coin_node: SecretKey,
}

impl ValidatorKeyDeriver {
    /// Build the tree from a seed of at least 32 bytes, e.g. a BIP-39 seed.
    pub fn from_seed(seed: &[u8]) -> Result<Self, BlsError> {
        let master = SecretKey::derive_master_eip2333(seed)?;
        let coin_node = master
            .derive_child_eip2333(PURPOSE)
            .derive_child_eip2333(COIN_TYPE);
        Ok(Self { coin_node })
    }

    /// Signing key of validator `account`.
    pub fn signing_keypair(&self, account: u32) -> BlsKeyPair {
        let sk = self
            .coin_node
            .derive_child_eip2333(account)
            .derive_child_eip2333(0)
            .derive_child_eip2333(0);
        BlsKeyPair::from_secret(BlsSecretKey::from_inner(sk))
    }

    pub fn signing_path(account: u32) -> String {
        format!("m/{}/{}/{}/0/0", PURPOSE, COIN_TYPE, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret_hex(kp: &BlsKeyPair) -> String {
        hex::encode(kp.secret().0.to_bytes())
    }

    #[test]
    fn test_deterministic_known_secrets() {
        let kp0 = deterministic_keypair(0).unwrap();
        let kp1 = deterministic_keypair(1).unwrap();

        assert_eq!(
            secret_hex(&kp0),
            "25295f0d1d592a90b333e26e85149708208e9f8e8bc18f6c77bd62f8ad7a6866"
        );
        assert_eq!(
            secret_hex(&kp1),
            "51d0b65185db6989ab0b560d6deed19c7ead0e24b9b6372cbecb1f26bdfad000"
        );
    }

    #[test]
    fn test_deterministic_known_pubkey() {
        let kp = deterministic_keypair(0).unwrap();
        assert_eq!(
            hex::encode(kp.pubkey().compress()),
            "a99a76ed7796f7be22d5b7e85deeb7c5677e88e511e0b337618f8c4eb61349b4bf2d153f649f7b53359fe8b94a38e44c"
        );
    }

    #[test]
    fn test_deterministic_is_reproducible() {
        for index in 0..4 {
            let a = deterministic_keypair(index).unwrap();
            let b = deterministic_keypair(index).unwrap();
            assert_eq!(a.pubkey(), b.pubkey());
        }
    }

    #[test]
    fn test_reduce_mod_order() {
        let mut below = CURVE_ORDER;
        below[31] = 0;
        let expected = below;
        reduce_mod_order(&mut below);
        assert_eq!(below, expected);

        let mut exact = CURVE_ORDER;
        reduce_mod_order(&mut exact);
        assert_eq!(exact, [0u8; 32]);

        let mut max = [0xffu8; 32];
        reduce_mod_order(&mut max);
        assert!(max < CURVE_ORDER);
    }

    #[test]
    fn test_eip2333_master_and_child() {
        // Test case 0 from EIP-2333.
        let seed = hex::decode(
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04",
        )
        .unwrap();

        let master = SecretKey::derive_master_eip2333(&seed).unwrap();
        assert_eq!(
            hex::encode(master.to_bytes()),
            "0d7359d57963ab8fbbde1852dcf553fedbc31f464d80ee7d40ae683122b45070"
        );
        assert_eq!(
            hex::encode(master.derive_child_eip2333(0).to_bytes()),
            "2d18bd6c14e6d15bf8b5085c9b74f3daae3b03cc2014770a599d8c1539e50f8e"
        );
    }

    #[test]
    fn test_short_seed_rejected() {
        assert!(ValidatorKeyDeriver::from_seed(&[7u8; 16]).is_err());
    }

    #[test]
    fn test_accounts_are_distinct() {
        let deriver = ValidatorKeyDeriver::from_seed(&[42u8; 64]).unwrap();

        let a = deriver.signing_keypair(0);
        let b = deriver.signing_keypair(1);
        assert_ne!(a.pubkey(), b.pubkey());
        assert_eq!(a.pubkey(), deriver.signing_keypair(0).pubkey());
    }

    #[test]
    fn test_signing_path() {
        assert_eq!(ValidatorKeyDeriver::signing_path(3), "m/12381/3600/3/0/0");
    }
}
