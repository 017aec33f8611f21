//! Order intents and execution timing.

use serde::{Deserialize, Serialize};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the sign for position calculations (+1 for buy, -1 for sell).
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// What a strategy wants done on the current bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum OrderIntent {
    /// Open a position sized as a fraction of available cash.
    /// `Buy` opens a long, `Sell` opens a short.
    Open { side: Side, fraction: f64 },
    /// Close the current position entirely.
    Close,
}

impl OrderIntent {
    /// Open a long position.
    pub fn buy(fraction: f64) -> Self {
        OrderIntent::Open {
            side: Side::Buy,
            fraction,
        }
    }

    /// Open a short position.
    pub fn sell_short(fraction: f64) -> Self {
        OrderIntent::Open {
            side: Side::Sell,
            fraction,
        }
    }
}

impl std::fmt::Display for OrderIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderIntent::Open { side, fraction } => write!(f, "OPEN {} {:.4}", side, fraction),
            OrderIntent::Close => write!(f, "CLOSE"),
        }
    }
}

/// Price at which an intent produced on bar `i` is filled.
///
/// The choice changes reported P&L, so it is echoed in every result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionTiming {
    /// Fill at the close of the bar that produced the intent.
    #[default]
    SameBarClose,
    /// Fill at the open of the following bar.
    NextBarOpen,
}

impl std::fmt::Display for ExecutionTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionTiming::SameBarClose => write!(f, "same_bar_close"),
            ExecutionTiming::NextBarOpen => write!(f, "next_bar_open"),
        }
    }
}

impl std::str::FromStr for ExecutionTiming {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "same_bar_close" | "close" => Ok(ExecutionTiming::SameBarClose),
            "next_bar_open" | "open" => Ok(ExecutionTiming::NextBarOpen),
            _ => Err(format!("Invalid execution timing: {}", s)),
        }
    }
}
