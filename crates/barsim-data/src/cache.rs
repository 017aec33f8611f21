//! Keyed bar cache with TTL expiry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use barsim_core::{Bar, BarSeries, DataError, DataSource, Timeframe};
use chrono::NaiveDate;
use tracing::debug;

/// Identity of one cached request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            start,
            end,
        }
    }
}

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Shared bar cache.
///
/// Payloads are `Arc<[Bar]>`, so hits hand out the same allocation to every
/// reader.
pub struct DataCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry<Arc<[Bar]>>>>,
    ttl: Duration,
}

impl DataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn with_ttl_secs(ttl_secs: u64) -> Self {
        Self::new(Duration::from_secs(ttl_secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached bars if present and not expired.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<[Bar]>> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| Arc::clone(&entry.data))
    }

    pub fn insert(&self, key: CacheKey, bars: impl Into<Arc<[Bar]>>) {
        self.insert_with_ttl(key, bars, self.ttl);
    }

    pub fn insert_with_ttl(&self, key: CacheKey, bars: impl Into<Arc<[Bar]>>, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, CacheEntry::new(bars.into(), ttl));
        }
    }

    /// Drop entries for `symbol`, optionally only at one timeframe.
    /// Returns the number of entries removed.
    pub fn invalidate(&self, symbol: &str, timeframe: Option<Timeframe>) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|k, _| !(k.symbol == symbol && timeframe.map_or(true, |tf| tf == k.timeframe)));
        before - entries.len()
    }

    pub fn invalidate_key(&self, key: &CacheKey) -> bool {
        self.entries
            .write()
            .map(|mut entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Clear all expired entries
    pub fn clear_expired(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| !entry.is_expired());
        }
    }

    pub fn clear_all(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        let (total, expired) = self
            .entries
            .read()
            .map(|entries| {
                let expired = entries.values().filter(|e| e.is_expired()).count();
                (entries.len(), expired)
            })
            .unwrap_or((0, 0));

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }
}

impl Default for DataCache {
    fn default() -> Self {
        Self::with_ttl_secs(3600)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Any [`DataSource`] fronted by a [`DataCache`].
pub struct CachedDataSource<S> {
    inner: S,
    cache: Arc<DataCache>,
}

impl<S: DataSource> CachedDataSource<S> {
    pub fn new(inner: S, cache: Arc<DataCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<DataCache> {
        &self.cache
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DataSource> DataSource for CachedDataSource<S> {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        let key = CacheKey::new(symbol, timeframe, start, end);
        if let Some(bars) = self.cache.get(&key) {
            debug!(symbol, %timeframe, "Cache hit");
            return Ok(BarSeries::from_bars(symbol, timeframe, bars.to_vec()));
        }

        let series = self
            .inner
            .get_historical_bars(symbol, timeframe, start, end)
            .await?;
        debug!(symbol, %timeframe, bars = series.len(), "Cache miss, stored");
        self.cache.insert(key, series.bars());
        Ok(series)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn key(symbol: &str, timeframe: Timeframe) -> CacheKey {
        CacheKey::new(symbol, timeframe, date(1), date(31))
    }

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar::new(i as i64 * 86_400_000, 1.0, 1.0, 1.0, 1.0, 0.0))
            .collect()
    }

    #[test]
    fn test_cache_set_get() {
        let cache = DataCache::default();
        cache.insert(key("SPY", Timeframe::Daily), bars(3));

        let cached = cache.get(&key("SPY", Timeframe::Daily)).unwrap();
        assert_eq!(cached.len(), 3);
        assert!(cache.get(&key("SPY", Timeframe::Hour1)).is_none());

        // a different range is a different entry
        let other = CacheKey::new("SPY", Timeframe::Daily, date(2), date(31));
        assert!(cache.get(&other).is_none());
    }

    #[test]
    fn test_cache_expiry() {
        let cache = DataCache::new(Duration::ZERO);
        cache.insert(key("SPY", Timeframe::Daily), bars(1));
        cache.insert_with_ttl(key("QQQ", Timeframe::Daily), bars(1), Duration::from_secs(600));

        assert!(cache.get(&key("SPY", Timeframe::Daily)).is_none());
        assert!(cache.get(&key("QQQ", Timeframe::Daily)).is_some());
        assert_eq!(
            cache.stats(),
            CacheStats {
                total_entries: 2,
                expired_entries: 1,
                active_entries: 1,
            }
        );

        cache.clear_expired();
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[test]
    fn test_invalidate() {
        let cache = DataCache::default();
        cache.insert(key("SPY", Timeframe::Daily), bars(1));
        cache.insert(key("SPY", Timeframe::Hour1), bars(1));
        cache.insert(key("QQQ", Timeframe::Daily), bars(1));

        assert_eq!(cache.invalidate("SPY", Some(Timeframe::Hour1)), 1);
        assert!(cache.get(&key("SPY", Timeframe::Daily)).is_some());

        assert_eq!(cache.invalidate("SPY", None), 1);
        assert!(cache.invalidate_key(&key("QQQ", Timeframe::Daily)));
        assert_eq!(cache.stats().total_entries, 0);
    }

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DataSource for CountingSource {
        async fn get_historical_bars(
            &self,
            symbol: &str,
            timeframe: Timeframe,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<BarSeries, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(BarSeries::from_bars(symbol, timeframe, bars(5)))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_cached_source_hits() {
        let cache = Arc::new(DataCache::default());
        let source = CachedDataSource::new(
            CountingSource {
                calls: AtomicUsize::new(0),
            },
            Arc::clone(&cache),
        );

        for _ in 0..3 {
            let series = source
                .get_historical_bars("SPY", Timeframe::Daily, date(1), date(31))
                .await
                .unwrap();
            assert_eq!(series.len(), 5);
        }
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 1);

        cache.invalidate("SPY", None);
        source
            .get_historical_bars("SPY", Timeframe::Daily, date(1), date(31))
            .await
            .unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.name(), "counting");
    }
}
