//! Pluggable cryptographic primitives.
//!
//! The session engine never touches a primitive directly: Diffie-Hellman,
//! both key derivations and the AEAD all go through the [`CryptoSuite`]
//! trait injected at construction. [`StandardSuite`] is the implementation
//! shipped with the crate.

mod standard;

pub use standard::StandardSuite;

use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Errors surfaced by a [`CryptoSuite`] implementation.
#[derive(Error, Debug)]
pub enum SuiteError {
    /// Keypair generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Authenticated encryption failed.
    #[error("encryption failed")]
    Encrypt,

    /// Authenticated decryption failed (tag mismatch or malformed input).
    #[error("decryption failed")]
    Decrypt,
}

/// A Diffie-Hellman ratchet keypair, held as raw bytes.
///
/// The secret half is zeroized when the pair is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(test, derive(PartialEq))]
pub struct DhKeyPair {
    secret: [u8; 32],
    public: [u8; 32],
}

impl DhKeyPair {
    /// Build a keypair from its raw halves.
    pub fn new(secret: [u8; 32], public: [u8; 32]) -> Self {
        Self { secret, public }
    }

    /// The public half.
    pub fn public(&self) -> [u8; 32] {
        self.public
    }

    /// The secret half.
    pub fn secret(&self) -> &[u8; 32] {
        &self.secret
    }
}

/// The capability set the ratchet engine requires.
///
/// Key derivation must be deterministic; [`generate_dh`] is the engine's
/// only source of randomness. `decrypt` must reject any tag mismatch or
/// malformed ciphertext, because the engine uses that rejection as its
/// authentication oracle.
///
/// [`generate_dh`]: CryptoSuite::generate_dh
pub trait CryptoSuite {
    /// Generate a fresh ratchet keypair.
    fn generate_dh(&self) -> Result<DhKeyPair, SuiteError>;

    /// Diffie-Hellman between our keypair and the remote public key.
    fn dh(&self, pair: &DhKeyPair, remote_public: &[u8; 32]) -> [u8; 32];

    /// Derive a new root key and a chain key from the current root key and
    /// a fresh DH output. The two outputs must use distinct labels.
    fn kdf_rk(&self, root_key: &[u8; 32], dh_output: &[u8; 32]) -> ([u8; 32], [u8; 32]);

    /// Advance a chain key and derive a message key. The two outputs must
    /// use distinct labels so the message key reveals nothing about the
    /// next chain key.
    fn kdf_ck(&self, chain_key: &[u8; 32]) -> ([u8; 32], [u8; 32]);

    /// Authenticated encryption bound to `associated_data`.
    fn encrypt(
        &self,
        message_key: &[u8; 32],
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, SuiteError>;

    /// Authenticated decryption bound to `associated_data`.
    fn decrypt(
        &self,
        message_key: &[u8; 32],
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, SuiteError>;
}
