//! Cache of message keys derived for messages that have not arrived yet.

use std::collections::{HashMap, VecDeque};

use zeroize::Zeroize;

/// Compound cache key: (sender DH public key, message number in that chain).
///
/// Keying by the chain's public key lets entries from distinct past
/// receiving chains coexist after a ratchet step.
type SlotId = ([u8; 32], u32);

/// Skipped message keys, bounded by a global cap with oldest-first eviction.
#[derive(Clone, Default)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct SkippedKeys {
    keys: HashMap<SlotId, [u8; 32]>,
    order: VecDeque<SlotId>,
}

impl SkippedKeys {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Cache a key, evicting the oldest entries once `max_entries` is
    /// exceeded. Evicted keys are zeroized.
    pub(crate) fn insert(
        &mut self,
        dh_public: [u8; 32],
        n: u32,
        message_key: [u8; 32],
        max_entries: usize,
    ) {
        let slot = (dh_public, n);
        if self.keys.insert(slot, message_key).is_none() {
            self.order.push_back(slot);
        }
        while self.keys.len() > max_entries {
            match self.order.pop_front() {
                Some(oldest) => {
                    if let Some(mut evicted) = self.keys.remove(&oldest) {
                        evicted.zeroize();
                    }
                }
                None => break,
            }
        }
    }

    /// Remove and return the key cached for a message, if present.
    pub(crate) fn take(&mut self, dh_public: &[u8; 32], n: u32) -> Option<[u8; 32]> {
        let slot = (*dh_public, n);
        let key = self.keys.remove(&slot)?;
        self.order.retain(|s| s != &slot);
        Some(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }
}

impl Drop for SkippedKeys {
    fn drop(&mut self) {
        for (_, key) in self.keys.drain() {
            let mut key = key;
            key.zeroize();
        }
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_take() {
        let mut cache = SkippedKeys::new();
        cache.insert([1u8; 32], 4, [9u8; 32], 16);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.take(&[1u8; 32], 4), Some([9u8; 32]));
        assert_eq!(cache.len(), 0);

        // Consumed entries are gone.
        assert_eq!(cache.take(&[1u8; 32], 4), None);
    }

    #[test]
    fn test_miss_on_wrong_chain() {
        let mut cache = SkippedKeys::new();
        cache.insert([1u8; 32], 4, [9u8; 32], 16);

        assert_eq!(cache.take(&[2u8; 32], 4), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_eviction_drops_oldest_first() {
        let mut cache = SkippedKeys::new();
        cache.insert([1u8; 32], 0, [10u8; 32], 2);
        cache.insert([1u8; 32], 1, [11u8; 32], 2);
        cache.insert([1u8; 32], 2, [12u8; 32], 2);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.take(&[1u8; 32], 0), None);
        assert_eq!(cache.take(&[1u8; 32], 1), Some([11u8; 32]));
        assert_eq!(cache.take(&[1u8; 32], 2), Some([12u8; 32]));
    }

    #[test]
    fn test_take_removes_from_eviction_order() {
        let mut cache = SkippedKeys::new();
        cache.insert([1u8; 32], 0, [10u8; 32], 2);
        cache.insert([1u8; 32], 1, [11u8; 32], 2);

        // Consume the oldest, then overflow: entry 1 is now the oldest.
        assert!(cache.take(&[1u8; 32], 0).is_some());
        cache.insert([1u8; 32], 2, [12u8; 32], 2);
        cache.insert([1u8; 32], 3, [13u8; 32], 2);

        assert_eq!(cache.take(&[1u8; 32], 1), None);
        assert_eq!(cache.take(&[1u8; 32], 2), Some([12u8; 32]));
        assert_eq!(cache.take(&[1u8; 32], 3), Some([13u8; 32]));
    }
}
