//! Data source trait definitions.

use crate::error::DataError;
use crate::types::{BarSeries, Timeframe};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Trait for historical data sources.
///
/// Implementations hand the engine a normalized series: fields
/// `Open, High, Low, Close, Volume` present on every bar, timestamps without
/// timezone offset, strictly increasing, and no NaN rows.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch historical bars.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `timeframe` - The bar timeframe
    /// * `start` - First date of the range (inclusive)
    /// * `end` - Last date of the range (inclusive)
    ///
    /// # Returns
    /// A series ordered from oldest to newest
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
