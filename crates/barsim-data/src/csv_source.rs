//! CSV data source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use barsim_core::{BarSeries, DataError, DataSource, Timeframe};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::normalize::normalize_records;

/// Parse and normalize CSV text into a series.
pub fn parse_csv(
    data: &[u8],
    symbol: &str,
    timeframe: Timeframe,
) -> Result<BarSeries, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(e.to_string()))?
        .clone();
    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let (bars, report) = normalize_records(&headers, records)?;
    debug!(symbol, rows = report.rows_read, bars = report.bars, "Parsed CSV");

    Ok(BarSeries::from_bars(symbol, timeframe, bars))
}

/// Read a single CSV file into a series.
pub fn load_file(path: &Path, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, DataError> {
    let data = std::fs::read(path)?;
    parse_csv(&data, symbol, timeframe)
}

/// CSV data source for historical data.
///
/// Points either at one file, served for any symbol, or at a directory
/// holding `{SYMBOL}_{timeframe}.csv` or `{SYMBOL}.csv` files.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, DataError> {
        let path = path.into();
        if !path.exists() {
            return Err(DataError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        Ok(Self { path })
    }

    /// File holding `symbol` at `timeframe`.
    pub fn resolve(&self, symbol: &str, timeframe: Timeframe) -> Result<PathBuf, DataError> {
        if self.path.is_file() {
            return Ok(self.path.clone());
        }

        [
            format!("{}_{}.csv", symbol, timeframe),
            format!("{}.csv", symbol),
        ]
        .into_iter()
        .map(|name| self.path.join(name))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| DataError::SymbolNotFound(symbol.to_string()))
    }

    /// Load every bar available for `symbol`.
    pub async fn load_all(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, DataError> {
        let path = self.resolve(symbol, timeframe)?;
        let data = tokio::fs::read(&path).await?;
        let series = parse_csv(&data, symbol, timeframe)?;
        info!(symbol, path = %path.display(), bars = series.len(), "Loaded CSV data");
        Ok(series)
    }
}

#[async_trait]
impl DataSource for CsvDataSource {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BarSeries, DataError> {
        let series = self.load_all(symbol, timeframe).await?;
        let bars: Vec<_> = series
            .iter()
            .filter(|b| {
                let day = b.datetime().date();
                day >= start && day <= end
            })
            .copied()
            .collect();

        if bars.is_empty() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(BarSeries::from_bars(symbol, timeframe, bars))
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "Date,Open,High,Low,Close,Volume\n\
        2024-01-02,100,102,99,101,1000\n\
        2024-01-03,101,103,100,102,1100\n\
        2024-01-04,102,104,101,103,1200\n\
        2024-01-05,103,105,102,104,1300\n";

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_parse_csv() {
        let series = parse_csv(SAMPLE.as_bytes(), "SPY", Timeframe::Daily).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.symbol, "SPY");
        assert!(series.validate().is_ok());
    }

    #[test]
    fn test_missing_file() {
        assert!(CsvDataSource::new("/definitely/not/here.csv").is_err());
    }

    #[tokio::test]
    async fn test_single_file_range_filter() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let source = CsvDataSource::new(file.path()).unwrap();
        let series = source
            .get_historical_bars("SPY", Timeframe::Daily, date(3), date(4))
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().close, 102.0);

        let empty = source
            .get_historical_bars("SPY", Timeframe::Daily, date(20), date(25))
            .await;
        assert!(matches!(empty, Err(DataError::NoDataAvailable)));
    }

    #[tokio::test]
    async fn test_directory_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("QQQ_1d.csv"), SAMPLE).unwrap();

        let source = CsvDataSource::new(dir.path()).unwrap();
        let series = source.load_all("QQQ", Timeframe::Daily).await.unwrap();
        assert_eq!(series.len(), 4);

        let missing = source.load_all("IWM", Timeframe::Daily).await;
        assert!(matches!(missing, Err(DataError::SymbolNotFound(_))));
    }
}
