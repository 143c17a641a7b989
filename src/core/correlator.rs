use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use lru::LruCache;

/// Default number of in-flight queries remembered for matching.
pub const DEFAULT_CAPACITY: usize = 65_536;

/// Identifies one in-flight query: the capturing device plus the DNS ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    pub device: Arc<str>,
    pub id: u16,
}

impl CorrelationKey {
    pub fn new(device: &Arc<str>, id: u16) -> Self {
        Self {
            device: Arc::clone(device),
            id,
        }
    }
}

/// Shared, bounded query -> send time table.
///
/// The least recently used entry is evicted once the table is full. A match
/// leaves the entry in place so a duplicated response still finds it.
pub struct Correlator {
    pending: Mutex<LruCache<CorrelationKey, SystemTime>>,
    stats: Stats,
}

impl Correlator {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            pending: Mutex::new(LruCache::new(capacity)),
            stats: Stats::default(),
        }
    }

    /// Remembers a query. A later query with the same key replaces the
    /// earlier send time.
    pub fn observe(&self, key: CorrelationKey, sent: SystemTime) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, sent);
        self.stats.queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Looks up the query a response answers and returns its send time.
    pub fn resolve(&self, key: &CorrelationKey) -> Option<SystemTime> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    /// Elapsed time between a query and the response received at `received`.
    /// Clock steps backwards yield zero.
    pub fn elapsed(sent: SystemTime, received: SystemTime) -> Duration {
        received.duration_since(sent).unwrap_or_default()
    }

    pub fn record_response(&self, passed: bool) {
        let counter = if passed {
            &self.stats.rendered
        } else {
            &self.stats.suppressed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            queries_observed: self.stats.queries.load(Ordering::Relaxed),
            responses_suppressed: self.stats.suppressed.load(Ordering::Relaxed),
            responses_rendered: self.stats.rendered.load(Ordering::Relaxed),
        }
    }
}

#[derive(Default)]
struct Stats {
    queries: AtomicU64,
    suppressed: AtomicU64,
    rendered: AtomicU64,
}

/// Point-in-time copy of the run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub queries_observed: u64,
    pub responses_suppressed: u64,
    pub responses_rendered: u64,
}

impl StatsSnapshot {
    /// Queries with no rendered response. Suppressed responses count as
    /// missing too.
    pub fn missing(&self) -> u64 {
        self.queries_observed.saturating_sub(self.responses_rendered)
    }
}
