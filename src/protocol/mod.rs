//! Wire types for ratchet messages.
//!
//! The header travels in the clear: the receiver needs its fields before
//! any decryption, to consult the skipped-key cache and to detect a remote
//! ratchet key change. Integrity comes from binding the encoded header into
//! the AEAD associated data instead.

mod header;
mod message;

pub use header::MessageHeader;
pub use message::Message;
