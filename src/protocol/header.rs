//! Message headers and their associated-data encoding.

use serde::{Deserialize, Serialize};

/// Length of the encoded header image prepended to the caller's AD.
const ENCODED_LEN: usize = 40;

/// Metadata carried with every message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageHeader {
    /// Sender's current DH ratchet public key.
    pub dh_public: [u8; 32],
    /// Number of messages in the sender's previous sending chain.
    pub pn: u32,
    /// Position of this message in the current sending chain.
    pub n: u32,
}

impl MessageHeader {
    /// Encode the header and append the caller's associated data.
    ///
    /// The image is fixed-width (`dh_public || pn || n`, big-endian
    /// counters), so distinct `(header, ad)` pairs never produce the same
    /// bytes. Both encryption and decryption bind this into the AEAD.
    pub fn encode_with_ad(&self, ad: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(ENCODED_LEN + ad.len());
        out.extend_from_slice(&self.dh_public);
        out.extend_from_slice(&self.pn.to_be_bytes());
        out.extend_from_slice(&self.n.to_be_bytes());
        out.extend_from_slice(ad);
        out
    }
}
