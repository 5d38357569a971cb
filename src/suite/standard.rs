//! Default crypto suite: X25519 + HKDF-SHA256 + ChaCha20-Poly1305.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

use super::{CryptoSuite, DhKeyPair, SuiteError};

/// Domain separation labels for HKDF derivations.
const LABEL_ROOT_KEY: &[u8] = b"PAWL-RATCHET-ROOT";
const LABEL_ROOT_CHAIN: &[u8] = b"PAWL-RATCHET-ROOT-CHAIN";
const LABEL_CHAIN_ADVANCE: &[u8] = b"PAWL-RATCHET-CHAIN";
const LABEL_MESSAGE_KEY: &[u8] = b"PAWL-RATCHET-MESSAGE";

/// Nonce size for ChaCha20-Poly1305.
const NONCE_SIZE: usize = 12;

/// Poly1305 tag size.
const TAG_SIZE: usize = 16;

/// The suite used when none is injected.
///
/// Each message key encrypts exactly one message; the nonce is still drawn
/// fresh per encryption and carried in front of the ciphertext
/// (`nonce || ct`).
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardSuite;

impl CryptoSuite for StandardSuite {
    fn generate_dh(&self) -> Result<DhKeyPair, SuiteError> {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Ok(DhKeyPair::new(secret.to_bytes(), *public.as_bytes()))
    }

    fn dh(&self, pair: &DhKeyPair, remote_public: &[u8; 32]) -> [u8; 32] {
        let secret = StaticSecret::from(*pair.secret());
        let shared = secret.diffie_hellman(&PublicKey::from(*remote_public));
        *shared.as_bytes()
    }

    fn kdf_rk(&self, root_key: &[u8; 32], dh_output: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
        let hk = Hkdf::<Sha256>::new(Some(root_key), dh_output);

        let mut new_root = [0u8; 32];
        let mut chain = [0u8; 32];
        hk.expand(LABEL_ROOT_KEY, &mut new_root)
            .expect("32 bytes is valid output length");
        hk.expand(LABEL_ROOT_CHAIN, &mut chain)
            .expect("32 bytes is valid output length");

        (new_root, chain)
    }

    fn kdf_ck(&self, chain_key: &[u8; 32]) -> ([u8; 32], [u8; 32]) {
        let hk = Hkdf::<Sha256>::new(None, chain_key);

        let mut new_chain = [0u8; 32];
        let mut message_key = [0u8; 32];
        hk.expand(LABEL_CHAIN_ADVANCE, &mut new_chain)
            .expect("32 bytes is valid output length");
        hk.expand(LABEL_MESSAGE_KEY, &mut message_key)
            .expect("32 bytes is valid output length");

        (new_chain, message_key)
    }

    fn encrypt(
        &self,
        message_key: &[u8; 32],
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, SuiteError> {
        let cipher =
            ChaCha20Poly1305::new_from_slice(message_key).map_err(|_| SuiteError::Encrypt)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: plaintext,
                    aad: associated_data,
                },
            )
            .map_err(|_| SuiteError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);

        Ok(out)
    }

    fn decrypt(
        &self,
        message_key: &[u8; 32],
        ciphertext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>, SuiteError> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(SuiteError::Decrypt);
        }

        let (nonce_bytes, body) = ciphertext.split_at(NONCE_SIZE);
        let cipher =
            ChaCha20Poly1305::new_from_slice(message_key).map_err(|_| SuiteError::Decrypt)?;

        cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload {
                    msg: body,
                    aad: associated_data,
                },
            )
            .map_err(|_| SuiteError::Decrypt)
    }
}
