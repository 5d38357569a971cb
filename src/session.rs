//! Session state and the encrypt/decrypt engine.
//!
//! A [`Session`] holds one end of a two-party Double Ratchet. Sending walks
//! a symmetric KDF chain; receiving tolerates out-of-order delivery through
//! a bounded skipped-key cache; a fresh remote ratchet key folds a new DH
//! secret into the root key and restarts both chains.
//!
//! Every receive-side mutation happens on a shadow copy of the state. The
//! live state is replaced by the shadow only after the AEAD tag verifies,
//! so a forged or corrupted message can never leave chains advanced or the
//! cache populated.

use zeroize::Zeroize;

use crate::config::SessionConfig;
use crate::error::RatchetError;
use crate::protocol::{Message, MessageHeader};
use crate::skipped::SkippedKeys;
use crate::suite::{CryptoSuite, DhKeyPair, StandardSuite};

/// Remote-key slot value meaning "no remote ratchet key seen yet".
const NO_REMOTE: [u8; 32] = [0u8; 32];

/// All ratchet variables for one session.
///
/// Separate from [`Session`] so the decrypt path can clone it, mutate the
/// clone and commit with a single assignment. The replaced value zeroizes
/// itself on drop.
#[derive(Clone)]
#[cfg_attr(test, derive(PartialEq))]
struct State {
    /// Root key, folded with each fresh DH output.
    root_key: [u8; 32],

    /// Our current ratchet keypair.
    dh_self: DhKeyPair,

    /// Remote ratchet public key, `NO_REMOTE` until the first inbound
    /// message installs one.
    dh_remote: [u8; 32],

    /// Sending chain key.
    send_chain: [u8; 32],

    /// Receiving chain key.
    recv_chain: [u8; 32],

    /// Messages sent in the current sending chain.
    send_count: u32,

    /// Messages received in the current receiving chain.
    recv_count: u32,

    /// Length of the previous sending chain.
    prev_send_count: u32,

    /// Message keys derived for messages that have not arrived yet.
    skipped: SkippedKeys,
}

impl Drop for State {
    fn drop(&mut self) {
        self.root_key.zeroize();
        self.send_chain.zeroize();
        self.recv_chain.zeroize();
        // dh_self and skipped zeroize themselves.
    }
}

/// One end of a two-party encrypted messaging session.
///
/// A session is single-owner: it must be driven by one flow of control at a
/// time, and callers that need shared access must serialize externally.
pub struct Session<S: CryptoSuite = StandardSuite> {
    suite: S,
    config: SessionConfig,
    state: State,
}

impl Session<StandardSuite> {
    /// Create the side that waits for the first inbound message.
    ///
    /// Both chains are seeded with the shared key, so this side may also
    /// send before receiving anything.
    pub fn init_as_responder(
        shared_key: [u8; 32],
        config: SessionConfig,
    ) -> Result<Self, RatchetError> {
        Self::responder_with_suite(StandardSuite, shared_key, config)
    }

    /// Create the side that already knows the peer's ratchet public key.
    pub fn init_as_initiator(
        shared_key: [u8; 32],
        remote_public: [u8; 32],
        config: SessionConfig,
    ) -> Result<Self, RatchetError> {
        Self::initiator_with_suite(StandardSuite, shared_key, remote_public, config)
    }
}

impl<S: CryptoSuite> Session<S> {
    /// [`init_as_responder`] with an injected crypto suite.
    ///
    /// [`init_as_responder`]: Session::init_as_responder
    pub fn responder_with_suite(
        suite: S,
        shared_key: [u8; 32],
        config: SessionConfig,
    ) -> Result<Self, RatchetError> {
        config.validate()?;
        if shared_key == [0u8; 32] {
            return Err(RatchetError::ZeroSharedKey);
        }

        let dh_self = suite.generate_dh()?;
        Ok(Self {
            suite,
            config,
            state: State {
                root_key: shared_key,
                dh_self,
                dh_remote: NO_REMOTE,
                // Both chains start from the shared key so either party can
                // send first; the first KDF step replaces the seed.
                send_chain: shared_key,
                recv_chain: shared_key,
                send_count: 0,
                recv_count: 0,
                prev_send_count: 0,
                skipped: SkippedKeys::new(),
            },
        })
    }

    /// [`init_as_initiator`] with an injected crypto suite.
    ///
    /// [`init_as_initiator`]: Session::init_as_initiator
    pub fn initiator_with_suite(
        suite: S,
        shared_key: [u8; 32],
        remote_public: [u8; 32],
        config: SessionConfig,
    ) -> Result<Self, RatchetError> {
        let mut session = Self::responder_with_suite(suite, shared_key, config)?;
        session.state.dh_remote = remote_public;

        let mut dh_out = session.suite.dh(&session.state.dh_self, &remote_public);
        let (root_key, send_chain) = session.suite.kdf_rk(&session.state.root_key, &dh_out);
        dh_out.zeroize();
        session.state.root_key = root_key;
        session.state.send_chain = send_chain;

        Ok(session)
    }

    /// Encrypt a message, advancing the sending chain by one step.
    ///
    /// A failure from the AEAD primitive leaves the chain already advanced;
    /// the session must then be discarded, not retried.
    pub fn encrypt(&mut self, plaintext: &[u8], ad: &[u8]) -> Result<Message, RatchetError> {
        let (send_chain, mut message_key) = self.suite.kdf_ck(&self.state.send_chain);
        self.state.send_chain = send_chain;

        let header = MessageHeader {
            dh_public: self.state.dh_self.public(),
            pn: self.state.prev_send_count,
            n: self.state.send_count,
        };
        self.state.send_count += 1;

        let result = self
            .suite
            .encrypt(&message_key, plaintext, &header.encode_with_ad(ad));
        message_key.zeroize();
        let ciphertext = result.map_err(RatchetError::Primitive)?;

        Ok(Message { header, ciphertext })
    }

    /// Decrypt a message.
    ///
    /// State changes commit only on success; any error leaves the session
    /// exactly as it was before the call.
    pub fn decrypt(&mut self, message: &Message, ad: &[u8]) -> Result<Vec<u8>, RatchetError> {
        let mut shadow = self.state.clone();
        let plaintext = self.decrypt_inner(&mut shadow, message, ad)?;
        self.state = shadow;
        Ok(plaintext)
    }

    /// Our current ratchet public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.state.dh_self.public()
    }

    /// The remote ratchet public key, once one has been installed.
    pub fn remote_public_key(&self) -> Option<[u8; 32]> {
        (self.state.dh_remote != NO_REMOTE).then_some(self.state.dh_remote)
    }

    /// Messages sent in the current sending chain.
    pub fn sent_count(&self) -> u32 {
        self.state.send_count
    }

    /// Messages received in the current receiving chain.
    pub fn received_count(&self) -> u32 {
        self.state.recv_count
    }

    /// Number of cached skipped message keys.
    pub fn skipped_key_count(&self) -> usize {
        self.state.skipped.len()
    }

    /// The whole decrypt procedure, run against a shadow state.
    fn decrypt_inner(
        &self,
        state: &mut State,
        message: &Message,
        ad: &[u8],
    ) -> Result<Vec<u8>, RatchetError> {
        let header = &message.header;
        let encoded_ad = header.encode_with_ad(ad);

        // A key cached for this exact (chain, position)? On failure the
        // shadow is discarded, so the cached entry survives.
        if let Some(mut message_key) = state.skipped.take(&header.dh_public, header.n) {
            let result = self
                .suite
                .decrypt(&message_key, &message.ciphertext, &encoded_ad);
            message_key.zeroize();
            return result.map_err(|_| RatchetError::AuthenticationFailed);
        }

        // A remote key we have not seen starts a new receiving chain. The
        // old chain must be closed out first: its remaining keys are cached
        // under the old remote key, derived from the old chain key.
        if header.dh_public != state.dh_remote {
            self.skip_recv_keys(state, header.pn)?;
            self.dh_ratchet(state, header)?;
        }

        // Walk forward to this message's position in the current chain.
        self.skip_recv_keys(state, header.n)?;
        let (recv_chain, mut message_key) = self.suite.kdf_ck(&state.recv_chain);
        state.recv_chain = recv_chain;
        state.recv_count += 1;

        let result = self
            .suite
            .decrypt(&message_key, &message.ciphertext, &encoded_ad);
        message_key.zeroize();
        result.map_err(|_| RatchetError::AuthenticationFailed)
    }

    /// Derive and cache receiving-chain keys up to position `until`.
    fn skip_recv_keys(&self, state: &mut State, until: u32) -> Result<(), RatchetError> {
        if (state.recv_count as u64) + (self.config.max_skip as u64) < u64::from(until) {
            return Err(RatchetError::TooManySkipped {
                max: self.config.max_skip,
                requested: (until - state.recv_count) as usize,
            });
        }
        while state.recv_count < until {
            let (recv_chain, message_key) = self.suite.kdf_ck(&state.recv_chain);
            state.recv_chain = recv_chain;
            state.skipped.insert(
                state.dh_remote,
                state.recv_count,
                message_key,
                self.config.max_cached_keys,
            );
            state.recv_count += 1;
        }
        Ok(())
    }

    /// Install a new remote ratchet key and restart both chains.
    fn dh_ratchet(&self, state: &mut State, header: &MessageHeader) -> Result<(), RatchetError> {
        state.prev_send_count = state.send_count;
        state.send_count = 0;
        state.recv_count = 0;
        state.dh_remote = header.dh_public;

        let mut dh_out = self.suite.dh(&state.dh_self, &state.dh_remote);
        let (root_key, recv_chain) = self.suite.kdf_rk(&state.root_key, &dh_out);
        dh_out.zeroize();
        state.root_key = root_key;
        state.recv_chain = recv_chain;

        state.dh_self = self.suite.generate_dh()?;

        let mut dh_out = self.suite.dh(&state.dh_self, &state.dh_remote);
        let (root_key, send_chain) = self.suite.kdf_rk(&state.root_key, &dh_out);
        dh_out.zeroize();
        state.root_key = root_key;
        state.send_chain = send_chain;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARED: [u8; 32] = [7u8; 32];
    const DEFAULT_TEST_CACHE: usize = 64;

    fn create_test_sessions() -> (Session, Session) {
        let bob = Session::init_as_responder(SHARED, SessionConfig::default()).unwrap();
        let alice =
            Session::init_as_initiator(SHARED, bob.public_key(), SessionConfig::default())
                .unwrap();
        (alice, bob)
    }

    #[test]
    fn test_zero_shared_key_rejected() {
        let result = Session::init_as_responder([0u8; 32], SessionConfig::default());
        assert!(matches!(result, Err(RatchetError::ZeroSharedKey)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Session::init_as_responder(SHARED, SessionConfig::new(10, 0));
        assert!(matches!(result, Err(RatchetError::InvalidConfig(_))));
    }

    #[test]
    fn test_initiator_folds_remote_key_into_sending_chain() {
        let (alice, bob) = create_test_sessions();

        // The initiator has already replaced the seed; the responder has not.
        assert_ne!(alice.state.send_chain, SHARED);
        assert_eq!(bob.state.send_chain, SHARED);
        assert_eq!(bob.state.dh_remote, NO_REMOTE);
    }

    #[test]
    fn test_encrypt_advances_sending_chain() {
        let (mut alice, _bob) = create_test_sessions();
        let before = alice.state.send_chain;

        let message = alice.encrypt(b"x", b"").unwrap();

        assert_eq!(message.header.n, 0);
        assert_eq!(alice.sent_count(), 1);
        assert_ne!(alice.state.send_chain, before);
    }

    #[test]
    fn test_ratchet_resets_counters() {
        let (mut alice, mut bob) = create_test_sessions();

        let m = alice.encrypt(b"ping", b"").unwrap();
        bob.decrypt(&m, b"").unwrap();
        let r = bob.encrypt(b"pong", b"").unwrap();
        alice.decrypt(&r, b"").unwrap();

        // Receiving Bob's reply ratcheted Alice: the old sending chain of
        // length 1 is recorded, both counters restart.
        assert_eq!(alice.state.prev_send_count, 1);
        assert_eq!(alice.state.send_count, 0);
        assert_eq!(alice.state.recv_count, 1);
    }

    #[test]
    fn test_skipped_keys_cached_and_consumed() {
        let (mut alice, mut bob) = create_test_sessions();

        let m0 = alice.encrypt(b"zero", b"").unwrap();
        let m1 = alice.encrypt(b"one", b"").unwrap();
        let m2 = alice.encrypt(b"two", b"").unwrap();

        assert_eq!(bob.decrypt(&m2, b"").unwrap(), b"two");
        assert_eq!(bob.skipped_key_count(), 2);
        assert_eq!(bob.received_count(), 3);

        assert_eq!(bob.decrypt(&m0, b"").unwrap(), b"zero");
        assert_eq!(bob.skipped_key_count(), 1);
        assert_eq!(bob.decrypt(&m1, b"").unwrap(), b"one");
        assert_eq!(bob.skipped_key_count(), 0);
    }

    #[test]
    fn test_skip_limit_leaves_state_untouched() {
        let config = SessionConfig::new(5, DEFAULT_TEST_CACHE);
        let mut bob = Session::init_as_responder(SHARED, config.clone()).unwrap();
        let mut alice =
            Session::init_as_initiator(SHARED, bob.public_key(), config).unwrap();

        let mut last = None;
        for _ in 0..8 {
            last = Some(alice.encrypt(b"m", b"").unwrap());
        }

        let snapshot = bob.state.clone();
        let result = bob.decrypt(&last.unwrap(), b"");

        assert!(matches!(
            result,
            Err(RatchetError::TooManySkipped { max: 5, requested: 7 })
        ));
        assert!(bob.state == snapshot);
    }

    #[test]
    fn test_failed_auth_leaves_state_untouched() {
        let (mut alice, mut bob) = create_test_sessions();

        let mut message = alice.encrypt(b"hello", b"").unwrap();
        let last = message.ciphertext.len() - 1;
        message.ciphertext[last] ^= 0x01;

        let snapshot = bob.state.clone();
        let result = bob.decrypt(&message, b"");

        assert!(matches!(result, Err(RatchetError::AuthenticationFailed)));
        assert!(bob.state == snapshot);

        // The untampered bytes still decrypt afterwards.
        message.ciphertext[last] ^= 0x01;
        assert_eq!(bob.decrypt(&message, b"").unwrap(), b"hello");
    }

    #[test]
    fn test_skipped_path_failure_keeps_cache_entry() {
        let (mut alice, mut bob) = create_test_sessions();

        let m0 = alice.encrypt(b"zero", b"").unwrap();
        let m1 = alice.encrypt(b"one", b"").unwrap();
        bob.decrypt(&m1, b"").unwrap();
        assert_eq!(bob.skipped_key_count(), 1);

        // Same slot as the cached key, wrong ciphertext.
        let mut forged = m0.clone();
        forged.ciphertext[0] ^= 0xFF;

        let snapshot = bob.state.clone();
        assert!(matches!(
            bob.decrypt(&forged, b""),
            Err(RatchetError::AuthenticationFailed)
        ));
        assert!(bob.state == snapshot);

        // The real message is still decryptable.
        assert_eq!(bob.decrypt(&m0, b"").unwrap(), b"zero");
    }

    #[test]
    fn test_wrong_ad_fails() {
        let (mut alice, mut bob) = create_test_sessions();

        let message = alice.encrypt(b"hello", b"ad-one").unwrap();
        assert!(matches!(
            bob.decrypt(&message, b"ad-two"),
            Err(RatchetError::AuthenticationFailed)
        ));
        assert_eq!(bob.decrypt(&message, b"ad-one").unwrap(), b"hello");
    }

    #[test]
    fn test_duplicate_delivery_fails() {
        let (mut alice, mut bob) = create_test_sessions();

        let message = alice.encrypt(b"once", b"").unwrap();
        assert_eq!(bob.decrypt(&message, b"").unwrap(), b"once");
        assert!(bob.decrypt(&message, b"").is_err());
    }

    #[test]
    fn test_responder_can_send_first() {
        let (mut alice, mut bob) = create_test_sessions();

        let message = bob.encrypt(b"eager", b"").unwrap();
        assert_eq!(alice.decrypt(&message, b"").unwrap(), b"eager");
    }
}
