use super::dataset::Dataset;
use std::time::{Duration, Instant};

/// Holds the last loaded dataset together with its fetch time so callers can
/// decide staleness explicitly instead of leaning on ambient framework
/// caching. A stale cache keeps serving its data until someone replaces it.
#[derive(Debug)]
pub struct DatasetCache {
    data: Dataset,
    fetched_at: Instant,
    ttl: Duration,
}

impl DatasetCache {
    pub fn new(data: Dataset, ttl: Duration) -> Self {
        Self {
            data,
            fetched_at: Instant::now(),
            ttl,
        }
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn is_stale(&self) -> bool {
        self.fetched_at.elapsed() >= self.ttl
    }

    /// Swap in a fresh load and reset the clock.
    pub fn replace(&mut self, data: Dataset) {
        self.data = data;
        self.fetched_at = Instant::now();
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }
}
