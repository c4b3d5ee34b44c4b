//! Wire protocol for remote signer communication.
//!
//! Uses a simple length-prefixed binary format over Unix sockets: a 4-byte
//! little-endian length followed by a bincode-encoded [`Request`] or
//! [`Response`].

use std::fmt;
use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest frame either side accepts.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Request to sign a signing root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
    /// Compressed BLS public key (48 bytes) selecting the signing key
    pub public_key: Vec<u8>,
    /// Digest to sign, signed as-is
    pub signing_root: Vec<u8>,
}

/// Outcome of a signing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignStatus {
    Succeeded,
    /// Reserved for slashing protection, never produced.
    Denied,
    Failed,
}

/// Response to a signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignResponse {
    /// Compressed BLS signature (96 bytes), empty unless succeeded
    pub signature: Vec<u8>,
    pub status: SignStatus,
}

impl SignResponse {
    pub fn succeeded(signature: Vec<u8>) -> Self {
        Self {
            signature,
            status: SignStatus::Succeeded,
        }
    }

    pub fn failed() -> Self {
        Self {
            signature: Vec::new(),
            status: SignStatus::Failed,
        }
    }
}

/// Response listing the public keys available for signing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPublicKeysResponse {
    /// Compressed public keys in keyvault order
    pub validating_public_keys: Vec<Vec<u8>>,
}

/// Error category returned alongside a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Code {
    InvalidArgument,
    NotFound,
    Internal,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::InvalidArgument => "invalid argument",
            Code::NotFound => "not found",
            Code::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Structured error for a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }
}

/// All possible messages from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    Sign(SignRequest),
    ListValidatingPublicKeys,
    Ping,
}

/// All possible messages from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    /// Every sign call gets a response; failures also carry a status
    Sign {
        response: SignResponse,
        error: Option<Status>,
    },
    PublicKeys(ListPublicKeysResponse),
    /// A call without a partial response failed
    Error(Status),
    Pong,
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame too large: {0} bytes")]
    TooLarge(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Write one length-prefixed message.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, msg: &T) -> Result<(), FrameError> {
    let bytes = bincode::serialize(msg)?;
    if bytes.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(bytes.len()));
    }
    writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read one length-prefixed message.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, FrameError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}
