use std::time::{Duration, Instant};

/// Last fetched value together with when it was fetched and how long it stays fresh.
#[derive(Clone, Debug, PartialEq)]
pub struct TtlCache<T> {
    pub value: T,
    pub fetched_at: Instant,
    pub ttl: Duration,
}

impl<T> TtlCache<T> {
    pub fn new(value: T, fetched_at: Instant, ttl: Duration) -> Self {
        Self {
            value,
            fetched_at,
            ttl,
        }
    }

    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freshness_expires_at_ttl() {
        let start = Instant::now();
        let cache = TtlCache::new(1.1, start, Duration::from_secs(60));
        assert!(cache.is_fresh(start));
        assert!(cache.is_fresh(start + Duration::from_secs(59)));
        assert!(!cache.is_fresh(start + Duration::from_secs(60)));
    }
}
