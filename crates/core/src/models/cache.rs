use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::chart::ChartKind;
use super::period::Period;
use super::series::Series;
use super::window::DateWindow;

/// Identity of one aggregated series.
///
/// `records_version` changes whenever the record store is replaced, so
/// entries built from older records can never be served again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub records_version: u64,
    pub chart: ChartKind,
    pub period: Period,
    pub window: DateWindow,
}

/// Memoizes aggregated series across render passes.
///
/// Re-renders that change nothing relevant (same records, period and
/// effective window) reuse the previous `Arc<Series>` instead of running
/// the aggregation again. Least-recently-used entries are evicted once
/// `capacity` is reached.
pub struct SeriesCache {
    entries: LruCache<SeriesKey, Arc<Series>>,
    hits: u64,
    misses: u64,
}

impl std::fmt::Debug for SeriesCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

impl SeriesCache {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached series for `key`, building it with `build` on a miss.
    pub fn get_or_build(&mut self, key: SeriesKey, build: impl FnOnce() -> Series) -> Arc<Series> {
        if let Some(series) = self.entries.get(&key) {
            self.hits += 1;
            return Arc::clone(series);
        }
        self.misses += 1;
        let series = Arc::new(build());
        self.entries.put(key, Arc::clone(&series));
        series
    }

    pub fn contains(&self, key: &SeriesKey) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
