//! # Pawl — a Double Ratchet session engine
//!
//! Pawl implements the core of a two-party end-to-end encrypted messaging
//! session: two symmetric KDF chains advanced once per message, a
//! Diffie-Hellman ratchet that restarts both chains whenever the peer shows
//! a fresh ratchet key, and a bounded cache of skipped message keys so
//! delayed or reordered messages still decrypt.
//!
//! ## Security Model
//!
//! - **Forward secrecy**: every message key is derived, used once and
//!   discarded; compromising current state exposes no past plaintext.
//! - **Post-compromise security**: each reply round-trip mixes a fresh DH
//!   secret into the root key, locking an attacker out again.
//! - **Out-of-order tolerance**: bounded per message by `max_skip`, with a
//!   global cache cap and oldest-first eviction.
//! - **Atomic receive**: a decrypt either applies all of its state changes
//!   or none; forged messages cannot corrupt a session.
//! - **Zeroization**: secret state is wiped on drop, including discarded
//!   shadow copies and evicted cache entries.
//!
//! Primitives are injected through [`CryptoSuite`]; the bundled
//! [`StandardSuite`] is X25519 + HKDF-SHA256 + ChaCha20-Poly1305.
//!
//! ## Example
//!
//! ```rust
//! use pawl::{Session, SessionConfig};
//!
//! # fn main() -> Result<(), pawl::RatchetError> {
//! // Both parties agreed on a 32-byte secret out of band.
//! let shared = [7u8; 32];
//!
//! let mut bob = Session::init_as_responder(shared, SessionConfig::default())?;
//! let mut alice = Session::init_as_initiator(shared, bob.public_key(), SessionConfig::default())?;
//!
//! let message = alice.encrypt(b"hello", b"session-1")?;
//! let plaintext = bob.decrypt(&message, b"session-1")?;
//! assert_eq!(plaintext, b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! Transport, session establishment (how the shared secret was agreed),
//! persistence and cross-thread sharing are the caller's concern.

mod config;
mod error;
mod session;
mod skipped;

pub mod protocol;
pub mod suite;

pub use config::{SessionConfig, DEFAULT_MAX_CACHED_KEYS, DEFAULT_MAX_SKIP};
pub use error::RatchetError;
pub use protocol::{Message, MessageHeader};
pub use session::Session;
pub use suite::{CryptoSuite, StandardSuite};
