use std::collections::BTreeSet;

/// How many keys the ledger holds before it starts forgetting.
pub const LEDGER_CAPACITY: usize = 1000;
/// How many of the smallest keys are forgotten at once.
pub const LEDGER_EVICTION: usize = 500;

/// A bounded set of already handled keys, to not handle redelivered messages twice.
///
/// When it grows past its capacity, the smallest keys are evicted. This assumes bigger keys
/// belong to newer messages, which holds for Telegram message IDs.
#[derive(Debug)]
pub struct DedupLedger<K> {
    seen: BTreeSet<K>,
    capacity: usize,
    eviction: usize,
}

impl<K: Ord> Default for DedupLedger<K> {
    fn default() -> Self {
        Self::new(LEDGER_CAPACITY, LEDGER_EVICTION)
    }
}

impl<K: Ord> DedupLedger<K> {
    /// # Panics
    /// Panics if `eviction` is zero or bigger than `capacity`.
    pub fn new(capacity: usize, eviction: usize) -> Self {
        assert!(
            eviction > 0 && eviction <= capacity,
            "Eviction size must be within 1..=capacity"
        );
        Self {
            seen: BTreeSet::new(),
            capacity,
            eviction,
        }
    }

    /// Record the key. Returns `false` if it was already recorded.
    ///
    /// A full ledger is cleaned up before the key goes in, so the key just admitted is
    /// always remembered, even if it is smaller than everything else.
    pub fn admit(&mut self, key: K) -> bool {
        if self.seen.contains(&key) {
            return false;
        }

        if self.seen.len() >= self.capacity {
            for _ in 0..self.eviction {
                self.seen.pop_first();
            }
            log::debug!("Ledger evicted its {} oldest entries", self.eviction);
        }

        self.seen.insert(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_sighting_is_rejected() {
        let mut ledger = DedupLedger::default();
        assert!(ledger.admit(42));
        assert!(!ledger.admit(42));
        assert!(ledger.admit(43));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn duplicate_on_full_ledger_evicts_nothing() {
        let mut ledger = DedupLedger::new(4, 2);
        for id in 1..=4 {
            ledger.admit(id);
        }
        assert!(!ledger.admit(3));
        assert_eq!(ledger.len(), 4);
        assert!(ledger.contains(&1));
    }

    #[test]
    fn eviction_drops_exactly_the_smallest_half() {
        let mut ledger = DedupLedger::default();
        for id in 1..=1000 {
            assert!(ledger.admit(id));
        }
        assert_eq!(ledger.len(), 1000);

        // One over the limit.
        assert!(ledger.admit(1001));
        assert_eq!(ledger.len(), 501);
        assert!(!ledger.contains(&500));
        assert!(ledger.contains(&501));
        assert!(ledger.contains(&1001));

        // Evicted keys are fair game again.
        assert!(ledger.admit(1));
    }

    #[test]
    fn eviction_goes_by_value_not_arrival() {
        let mut ledger = DedupLedger::default();
        for id in (2..=1001).rev() {
            ledger.admit(id);
        }
        assert_eq!(ledger.len(), 1000);

        ledger.admit(1);
        assert_eq!(ledger.len(), 501);
        assert!(!ledger.contains(&2));
        assert!(!ledger.contains(&501));
        assert!(ledger.contains(&502));
        assert!(ledger.contains(&1001));
    }

    #[test]
    fn small_key_on_full_ledger_is_remembered() {
        let mut ledger = DedupLedger::default();
        for id in 1000..2000 {
            assert!(ledger.admit(id));
        }
        assert_eq!(ledger.len(), LEDGER_CAPACITY);

        // Smaller than everything in there, like a message from a young chat.
        assert!(ledger.admit(7));
        assert!(ledger.contains(&7));
        assert_eq!(ledger.len(), 501);

        // Redelivery of the same message.
        assert!(!ledger.admit(7));
    }

    #[test]
    fn size_stays_bounded() {
        let mut ledger = DedupLedger::default();
        for id in 0..10_000 {
            ledger.admit(id);
            assert!(ledger.len() <= LEDGER_CAPACITY);
            assert!(!ledger.is_empty());
        }
        assert!(ledger.len() > LEDGER_CAPACITY - LEDGER_EVICTION);
    }
}
