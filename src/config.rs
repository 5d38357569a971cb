//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::error::RatchetError;

/// Default bound on message keys derived for a single incoming message.
pub const DEFAULT_MAX_SKIP: usize = 1000;

/// Default global cap on cached skipped message keys.
pub const DEFAULT_MAX_CACHED_KEYS: usize = 2000;

/// Configuration for a ratchet session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of message keys derived in response to one incoming
    /// message. High enough to tolerate routine lost or delayed messages,
    /// low enough that a hostile sender cannot force excessive derivation.
    pub max_skip: usize,

    /// Total cached skipped keys across all receiving chains. Once the cap
    /// is reached the oldest entry is evicted to make room.
    pub max_cached_keys: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_skip: DEFAULT_MAX_SKIP,
            max_cached_keys: DEFAULT_MAX_CACHED_KEYS,
        }
    }
}

impl SessionConfig {
    /// Create a config with custom bounds.
    pub fn new(max_skip: usize, max_cached_keys: usize) -> Self {
        Self {
            max_skip,
            max_cached_keys,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), RatchetError> {
        if self.max_cached_keys == 0 {
            return Err(RatchetError::InvalidConfig(
                "max_cached_keys must be non-zero",
            ));
        }
        Ok(())
    }
}
