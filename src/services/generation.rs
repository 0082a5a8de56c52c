use std::collections::HashMap;
use std::hash::Hash;

/// Monotonically increasing generation per logical key
///
/// Every new request for a key is issued the next generation; a result is only
/// applied if its generation is still the latest issued for that key.
/// Generations are unique across keys and never reused, so a key can be
/// retired once its latest request resolved.
#[derive(Debug)]
pub struct GenerationCounter<K> {
    next: u64,
    latest: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for GenerationCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> GenerationCounter<K> {
    pub fn new() -> Self {
        Self {
            next: 0,
            latest: HashMap::new(),
        }
    }

    /// Issues the next generation for `key`, superseding earlier ones
    pub fn issue(&mut self, key: K) -> u64 {
        self.next += 1;
        self.latest.insert(key, self.next);
        self.next
    }

    pub fn is_latest(&self, key: &K, generation: u64) -> bool {
        self.latest.get(key) == Some(&generation)
    }

    pub fn latest(&self, key: &K) -> Option<u64> {
        self.latest.get(key).copied()
    }

    /// Forgets `key` if `generation` is still its latest
    pub fn retire(&mut self, key: &K, generation: u64) -> bool {
        if self.is_latest(key, generation) {
            self.latest.remove(key);
            true
        } else {
            false
        }
    }

    /// Number of keys with a request in flight
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn clear(&mut self) {
        self.latest.clear();
    }
}
