use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::ConfigError;

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
    /// Breaks `inserted_at` ties when the clock has not advanced between inserts.
    sequence: u64,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > self.ttl
    }
}

struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    next_sequence: u64,
}

fn record(outcome: &'static str) {
    metrics::counter!("route_advisor_prediction_cache_total", "outcome" => outcome).increment(1);
}

/// Bounded TTL cache shared by concurrent evaluations.
///
/// A `get` followed by a `put` is not atomic: two callers may both miss and
/// both compute. That costs a redundant computation, never a corrupt entry.
pub struct PredictionCache<T> {
    capacity: usize,
    default_ttl: Duration,
    state: Mutex<CacheState<T>>,
}

impl<T: Clone> Default for PredictionCache<T> {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            default_ttl: DEFAULT_TTL,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_sequence: 0,
            }),
        }
    }
}

impl<T: Clone> PredictionCache<T> {
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        Ok(Self {
            capacity,
            default_ttl,
            ..Self::default()
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expired entries are removed on lookup and reported as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut state = self.state.lock();
        match state.entries.get(key) {
            None => {
                record("miss");
                return None;
            }
            Some(entry) if !entry.is_expired(now) => {
                record("hit");
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }
        state.entries.remove(key);
        record("expired");
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.put(key, value, self.default_ttl);
    }

    /// Replacing an existing key never evicts. A new key at capacity evicts the
    /// single entry with the oldest insertion time.
    pub fn put(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let mut state = self.state.lock();

        let sequence = state.next_sequence;
        state.next_sequence += 1;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.inserted_at, entry.sequence))
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                record("evicted");
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                ttl,
                sequence,
            },
        );
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        before - state.entries.len()
    }
}
