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

//! BLS12-381 validator keys.
//!
//! Thin wrappers over `blst`'s `min_pk` variant: public keys live in G1
//! (48 bytes compressed) and signatures in G2 (96 bytes compressed), as used
//! by Ethereum consensus validators.
//!
//! Two ways of producing key pairs are provided in [`derive`]:
//!
//! - [`derive::deterministic_keypair`]: the publicly known interop scheme,
//!   for test networks and demos only.
//! - [`derive::ValidatorKeyDeriver`]: EIP-2333 tree derivation from a seed,
//!   walking the EIP-2334 validator signing path.

use std::fmt;
use std::hash::{Hash, Hasher};

use blst::min_pk::{PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use thiserror::Error;

pub mod derive;

/// Length of a compressed G1 public key.
pub const PUBLIC_KEY_LENGTH: usize = 48;

/// Length of a compressed G2 signature.
pub const SIGNATURE_LENGTH: usize = 96;

/// Length of a serialized secret key scalar.
pub const SECRET_KEY_LENGTH: usize = 32;

/// Ciphersuite used by Ethereum consensus for validator signatures.
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Compressed public key bytes, the fixed-size key of every reverse index.
pub type PubKeyBytes = [u8; PUBLIC_KEY_LENGTH];

#[derive(Debug, Error)]
pub enum BlsError {
    #[error("blst error: {0:?}")]
    Blst(BLST_ERROR),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    InvalidSignature,
}

impl From<BLST_ERROR> for BlsError {
    fn from(e: BLST_ERROR) -> Self {
        BlsError::Blst(e)
    }
}

/// A BLS secret key.
///
/// Never serialized outward; `Debug` only shows the derived public key.
/// The underlying scalar is zeroized on drop by `blst`.
#[derive(Clone)]
pub struct BlsSecretKey(SecretKey);

impl BlsSecretKey {
    /// Load a secret key from a 32-byte big-endian scalar.
    ///
    /// Fails for zero and for values not below the curve order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BlsError> {
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(BlsError::InvalidLength {
                expected: SECRET_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self(SecretKey::from_bytes(bytes)?))
    }

    /// IETF KeyGen from input keying material (at least 32 bytes).
    pub fn key_gen(ikm: &[u8]) -> Result<Self, BlsError> {
        Ok(Self(SecretKey::key_gen(ikm, &[])?))
    }

    pub fn pubkey(&self) -> BlsPubKey {
        BlsPubKey(self.0.sk_to_pk())
    }

    /// Sign `msg` as-is under [`DST`].
    pub fn sign(&self, msg: &[u8]) -> BlsSignature {
        BlsSignature(self.0.sign(msg, DST, &[]))
    }

    pub(crate) fn from_inner(sk: SecretKey) -> Self {
        Self(sk)
    }
}

impl fmt::Debug for BlsSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlsSecretKey")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// A BLS public key, a point in G1.
#[derive(Clone, Copy)]
pub struct BlsPubKey(PublicKey);

impl BlsPubKey {
    /// Decode a compressed public key.
    ///
    /// The point is subgroup checked and the point at infinity is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BlsError> {
        if bytes.len() != PUBLIC_KEY_LENGTH {
            return Err(BlsError::InvalidLength {
                expected: PUBLIC_KEY_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self(PublicKey::key_validate(bytes)?))
    }

    pub fn compress(&self) -> PubKeyBytes {
        self.0.compress()
    }
}

impl PartialEq for BlsPubKey {
    fn eq(&self, other: &Self) -> bool {
        self.compress() == other.compress()
    }
}

impl Eq for BlsPubKey {}

impl Hash for BlsPubKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.compress().hash(state);
    }
}

impl fmt::Debug for BlsPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsPubKey(0x{})", hex::encode(self.compress()))
    }
}

impl fmt::Display for BlsPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.compress()))
    }
}

/// A BLS signature, a point in G2.
#[derive(Clone, Copy)]
pub struct BlsSignature(Signature);

impl PartialEq for BlsSignature {
    fn eq(&self, other: &Self) -> bool {
        self.compress() == other.compress()
    }
}

impl Eq for BlsSignature {}

impl fmt::Debug for BlsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsSignature(0x{})", hex::encode(self.compress()))
    }
}

impl BlsSignature {
    pub fn compress(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.compress()
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.compress().to_vec()
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlsError> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(BlsError::InvalidLength {
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self(Signature::from_bytes(bytes)?))
    }

    /// Verify against `msg` signed under [`DST`], group checking both points.
    pub fn verify(&self, msg: &[u8], pubkey: &BlsPubKey) -> Result<(), BlsError> {
        match self.0.verify(true, msg, DST, &[], &pubkey.0, true) {
            BLST_ERROR::BLST_SUCCESS => Ok(()),
            BLST_ERROR::BLST_VERIFY_FAIL => Err(BlsError::InvalidSignature),
            e => Err(BlsError::Blst(e)),
        }
    }
}

/// A secret key together with its public key.
///
/// The public key is always the one derived from the secret key; there is
/// no way to build or modify a pair that breaks this.
#[derive(Clone, Debug)]
pub struct BlsKeyPair {
    secret: BlsSecretKey,
    pubkey: BlsPubKey,
}

impl BlsKeyPair {
    pub fn from_secret(secret: BlsSecretKey) -> Self {
        let pubkey = secret.pubkey();
        Self { secret, pubkey }
    }

    /// Load from a 32-byte big-endian scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BlsError> {
        BlsSecretKey::from_bytes(bytes).map(Self::from_secret)
    }

    pub fn pubkey(&self) -> BlsPubKey {
        self.pubkey
    }

    pub fn secret(&self) -> &BlsSecretKey {
        &self.secret
    }

    pub fn sign(&self, msg: &[u8]) -> BlsSignature {
        self.secret.sign(msg)
    }

    pub fn into_parts(self) -> (BlsSecretKey, BlsPubKey) {
        (self.secret, self.pubkey)
    }
}
