//! Historical OHLCV data: CSV loading, normalization and caching.

mod cache;
mod csv_source;
mod normalize;

pub use cache::{CacheKey, CacheStats, CachedDataSource, DataCache};
pub use csv_source::{load_file, parse_csv, CsvDataSource};
pub use normalize::{normalize_records, parse_timestamp, ColumnMap, NormalizeReport, DEFAULT_VOLUME};

use std::path::Path;

use barsim_core::{BarSeries, DataError, Timeframe};

/// Load every bar from a CSV file.
pub async fn load_csv(
    path: impl AsRef<Path>,
    symbol: &str,
    timeframe: Timeframe,
) -> Result<BarSeries, DataError> {
    let source = CsvDataSource::new(path.as_ref())?;
    source.load_all(symbol, timeframe).await
}
