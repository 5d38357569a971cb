//! The complete wire message.

use serde::{Deserialize, Serialize};

use super::MessageHeader;

/// A ratchet message as sent over the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Plaintext header, authenticated through the AEAD associated data.
    pub header: MessageHeader,
    /// AEAD output, tag included.
    pub ciphertext: Vec<u8>,
}

impl Message {
    /// Serialize for transport.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from transport bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
