//! Ratchet error types.

use thiserror::Error;

use crate::suite::SuiteError;

/// Errors that can occur during session construction and operation.
#[derive(Error, Debug)]
pub enum RatchetError {
    /// Construction was given an all-zero shared key.
    #[error("shared key must be non-zero")]
    ZeroSharedKey,

    /// Construction was given an unusable configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Too many skipped messages (out-of-order limit exceeded).
    #[error("too many skipped messages (max: {max}, requested: {requested})")]
    TooManySkipped {
        /// Maximum number of keys that may be derived for one message.
        max: usize,
        /// Number of keys the message would have required.
        requested: usize,
    },

    /// AEAD verification rejected the ciphertext. This is the expected
    /// outcome for forged or corrupted messages; the session state is
    /// unchanged.
    #[error("message authentication failed")]
    AuthenticationFailed,

    /// The injected crypto suite failed.
    #[error("crypto suite error: {0}")]
    Primitive(#[from] SuiteError),
}
