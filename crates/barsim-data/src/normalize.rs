//! OHLCV normalization.
//!
//! Turns loosely shaped price tables into clean bars: headers are matched
//! case-insensitively (`Close_SPY` style flattened headers by their prefix),
//! missing Open/High/Low/Volume columns are derived, timezone offsets are
//! dropped keeping wall-clock time, and rows are sorted and de-duplicated.

use barsim_core::{Bar, DataError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use tracing::{debug, warn};

/// Volume assumed when the source has none.
pub const DEFAULT_VOLUME: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Time,
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

fn classify(header: &str) -> Option<Field> {
    let lower = header.trim().to_lowercase();
    let key = lower.split('_').next().unwrap_or_default();
    match key {
        "date" | "datetime" | "timestamp" | "time" => Some(Field::Time),
        "open" => Some(Field::Open),
        "high" => Some(Field::High),
        "low" => Some(Field::Low),
        "close" => Some(Field::Close),
        "adj close" => Some(Field::AdjClose),
        "volume" => Some(Field::Volume),
        _ => None,
    }
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    time: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl ColumnMap {
    /// Resolve columns; the first match of each field wins.
    ///
    /// `Close` (or `Adj Close`) is required. Without a named time column an
    /// unnamed first column is taken as the index.
    pub fn from_headers(headers: &StringRecord) -> Result<Self, DataError> {
        let find = |field: Field| headers.iter().position(|h| classify(h) == Some(field));

        let time = find(Field::Time)
            .or_else(|| headers.get(0).filter(|h| h.trim().is_empty()).map(|_| 0))
            .ok_or_else(|| DataError::MissingColumn("Date".into()))?;
        let close = find(Field::Close)
            .or_else(|| find(Field::AdjClose))
            .ok_or_else(|| DataError::MissingColumn("Close".into()))?;

        Ok(Self {
            time,
            open: find(Field::Open),
            high: find(Field::High),
            low: find(Field::Low),
            close,
            volume: find(Field::Volume),
        })
    }
}

/// Counters from one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub rows_read: usize,
    pub bad_timestamps: usize,
    pub duplicates: usize,
    pub incomplete: usize,
    /// Rows with a non-positive or non-finite price, or a bad volume
    pub malformed: usize,
    pub bars: usize,
}

struct RawRow {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn number(record: &StringRecord, column: Option<usize>) -> f64 {
    column
        .and_then(|c| record.get(c))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Normalize parsed CSV records into ordered, complete bars.
pub fn normalize_records<I>(
    headers: &StringRecord,
    records: I,
) -> Result<(Vec<Bar>, NormalizeReport), DataError>
where
    I: IntoIterator<Item = StringRecord>,
{
    let columns = ColumnMap::from_headers(headers)?;
    let mut report = NormalizeReport::default();
    let mut rows = Vec::new();

    for record in records {
        report.rows_read += 1;
        let raw_time = record.get(columns.time).unwrap_or_default();
        let Ok(timestamp) = parse_timestamp(raw_time) else {
            report.bad_timestamps += 1;
            continue;
        };

        rows.push(RawRow {
            timestamp,
            open: number(&record, columns.open),
            high: number(&record, columns.high),
            low: number(&record, columns.low),
            close: number(&record, Some(columns.close)),
            volume: number(&record, columns.volume),
        });
    }

    rows.sort_by_key(|r| r.timestamp);
    let before = rows.len();
    rows.dedup_by_key(|r| r.timestamp);
    report.duplicates = before - rows.len();

    if columns.open.is_none() {
        // previous close, forward-filled
        let mut last_close = f64::NAN;
        for row in rows.iter_mut() {
            row.open = last_close;
            if !row.close.is_nan() {
                last_close = row.close;
            }
        }
    }

    let mut malformed = 0;
    let bars: Vec<Bar> = rows
        .into_iter()
        .filter_map(|mut row| {
            if columns.high.is_none() {
                row.high = row.open.max(row.close);
            }
            if columns.low.is_none() {
                row.low = row.open.min(row.close);
            }
            if row.volume.is_nan() {
                row.volume = DEFAULT_VOLUME;
            }

            let prices = [row.open, row.high, row.low, row.close];
            if prices.iter().any(|p| p.is_nan()) {
                return None;
            }
            let bar = Bar::new(
                row.timestamp,
                row.open,
                row.high,
                row.low,
                row.close,
                row.volume,
            );
            if !bar.is_well_formed() {
                malformed += 1;
                return None;
            }
            Some(bar)
        })
        .collect();

    report.bars = bars.len();
    report.malformed = malformed;
    report.incomplete =
        report.rows_read - report.bad_timestamps - report.duplicates - report.malformed - report.bars;

    if report.bad_timestamps > 0 || report.incomplete > 0 || report.malformed > 0 {
        warn!(
            bad_timestamps = report.bad_timestamps,
            incomplete = report.incomplete,
            malformed = report.malformed,
            "Dropped rows during normalization"
        );
    }
    debug!(?report, "Normalized OHLCV table");

    Ok((bars, report))
}

/// Parse a timestamp into Unix milliseconds of its wall-clock time.
///
/// Offsets are discarded rather than applied: `2024-01-02T09:30:00-05:00`
/// becomes `2024-01-02T09:30:00`.
pub fn parse_timestamp(raw: &str) -> Result<i64, DataError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local().and_utc().timestamp_millis());
    }
    for format in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.naive_local().and_utc().timestamp_millis());
        }
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    // Unix timestamp, milliseconds if more than 10 digits
    if let Ok(ts) = s.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!("Could not parse date: {}", raw)))
}
