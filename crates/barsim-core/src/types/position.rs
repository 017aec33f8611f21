//! Position, trade and equity types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ohlcv::naive_from_millis;

/// The single open position of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Number of units (positive for long, negative for short)
    pub size: f64,
    /// Fill price of the entry
    pub entry_price: f64,
    /// Bar index of the entry fill
    pub entry_bar: usize,
    /// Timestamp (Unix milliseconds) of the entry fill
    pub entry_time: i64,
    /// Commission paid on entry
    pub entry_commission: f64,
}

impl Position {
    /// Check if this is a long position.
    pub fn is_long(&self) -> bool {
        self.size > 0.0
    }

    /// Check if this is a short position.
    pub fn is_short(&self) -> bool {
        self.size < 0.0
    }

    /// Get the absolute quantity.
    pub fn abs_size(&self) -> f64 {
        self.size.abs()
    }

    /// Signed market value at `price`.
    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }

    /// Notional committed at entry.
    pub fn entry_notional(&self) -> f64 {
        self.abs_size() * self.entry_price
    }
}

/// A completed round trip. Never mutated after it is appended to the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Signed size (positive long, negative short)
    pub size: f64,
    pub entry_bar: usize,
    pub exit_bar: usize,
    /// Entry timestamp (Unix milliseconds)
    pub entry_time: i64,
    /// Exit timestamp (Unix milliseconds)
    pub exit_time: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Realized P&L, net of entry and exit commissions
    pub pnl: f64,
    /// P&L as a percentage of entry notional
    pub return_pct: f64,
    /// Total commission paid on the round trip
    pub commission: f64,
    /// Closed by the engine at the end of data rather than by the strategy
    pub forced_exit: bool,
}

impl Trade {
    /// Whether the trade made money.
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    /// Whether the trade lost money.
    pub fn is_loss(&self) -> bool {
        self.pnl < 0.0
    }

    /// Holding time in milliseconds.
    pub fn duration_millis(&self) -> i64 {
        self.exit_time - self.entry_time
    }

    /// Number of bars between entry and exit fills.
    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }

    pub fn entry_datetime(&self) -> NaiveDateTime {
        naive_from_millis(self.entry_time)
    }

    pub fn exit_datetime(&self) -> NaiveDateTime {
        naive_from_millis(self.exit_time)
    }

    /// Holding time formatted as `"{days}d {hours}h"`.
    pub fn duration_display(&self) -> String {
        let secs = self.duration_millis() / 1000;
        format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3_600)
    }

    /// Check whether two trades were open over any common bar.
    ///
    /// A trade exiting on the bar another enters is not an overlap: the
    /// exit is processed before the new entry.
    pub fn overlaps(&self, other: &Trade) -> bool {
        self.entry_bar < other.exit_bar && other.entry_bar < self.exit_bar
    }
}

/// Equity snapshot taken at the end of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub bar_index: usize,
    /// Unix milliseconds
    pub timestamp: i64,
    pub equity: f64,
}
