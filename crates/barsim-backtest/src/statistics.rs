//! Performance statistics computed from an equity curve and trade log.

use std::collections::BTreeSet;

use barsim_core::{naive_from_millis, EquityPoint, Trade};
use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

const DAY_MILLIS: i64 = 86_400_000;

/// Gross profit over gross loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitFactor {
    Finite(f64),
    /// Winning trades but no losing ones
    NoLosses,
    /// Neither wins nor losses
    Undefined,
}

impl ProfitFactor {
    pub fn from_totals(gross_profit: f64, gross_loss: f64) -> Self {
        if gross_loss > 0.0 {
            ProfitFactor::Finite(gross_profit / gross_loss)
        } else if gross_profit > 0.0 {
            ProfitFactor::NoLosses
        } else {
            ProfitFactor::Undefined
        }
    }

    /// Float rendering: `inf` for no losses, `NaN` when undefined.
    pub fn as_f64(&self) -> f64 {
        match self {
            ProfitFactor::Finite(v) => *v,
            ProfitFactor::NoLosses => f64::INFINITY,
            ProfitFactor::Undefined => f64::NAN,
        }
    }
}

impl std::fmt::Display for ProfitFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfitFactor::Finite(v) => write!(f, "{:.2}", v),
            ProfitFactor::NoLosses => write!(f, "inf"),
            ProfitFactor::Undefined => write!(f, "n/a"),
        }
    }
}

/// Summary statistics of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// First bar timestamp (Unix milliseconds)
    pub start: i64,
    /// Last bar timestamp (Unix milliseconds)
    pub end: i64,
    pub duration_millis: i64,
    /// Share of bars with an open position
    pub exposure_time_pct: f64,
    pub equity_final: f64,
    pub equity_peak: f64,
    pub return_pct: f64,
    /// Filled in by the engine from the bars, not from the equity curve
    pub buy_hold_return_pct: f64,
    pub return_ann_pct: f64,
    pub volatility_ann_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown_pct: f64,
    pub avg_drawdown_pct: f64,
    /// Longest stretch below a running peak, in bars
    pub max_drawdown_duration: usize,
    pub num_trades: usize,
    pub win_rate_pct: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub avg_trade_pct: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_trade_duration_millis: i64,
    pub avg_trade_duration_millis: i64,
    pub profit_factor: ProfitFactor,
    pub commissions: f64,
    /// Annualization factor used for the ratios
    pub periods_per_year: f64,
}

/// Compute every metric from a finished run.
pub fn compute_metrics(
    initial_cash: f64,
    equity_curve: &[EquityPoint],
    trades: &[Trade],
) -> PerformanceMetrics {
    let periods_per_year = infer_periods_per_year(equity_curve);
    let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();

    let equity_final = equity.last().copied().unwrap_or(initial_cash);
    let equity_peak = equity.iter().copied().fold(initial_cash, f64::max);
    let return_pct = if initial_cash > 0.0 {
        (equity_final / initial_cash - 1.0) * 100.0
    } else {
        0.0
    };

    let (start, end) = match (equity_curve.first(), equity_curve.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => (0, 0),
    };

    let returns = bar_returns(&equity);
    let (mean, std) = mean_std(&returns);
    let scale = periods_per_year.sqrt();
    let sharpe_ratio = if equity.len() < 2 || std == 0.0 {
        0.0
    } else {
        mean / std * scale
    };

    let downside = if returns.is_empty() {
        0.0
    } else {
        (returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / returns.len() as f64).sqrt()
    };
    let sortino_ratio = if downside == 0.0 { 0.0 } else { mean / downside * scale };

    let periods = equity.len().saturating_sub(1);
    let return_ann_pct = if periods == 0 || initial_cash <= 0.0 {
        0.0
    } else if equity_final <= 0.0 {
        -100.0
    } else {
        ((equity_final / initial_cash).powf(periods_per_year / periods as f64) - 1.0) * 100.0
    };

    let drawdown = drawdown_profile(&equity);
    let calmar_ratio = if drawdown.max_pct > 0.0 {
        return_ann_pct / drawdown.max_pct
    } else {
        0.0
    };

    let trade_stats = TradeStats::from_trades(trades);
    let bars_held: usize = trades.iter().map(Trade::bars_held).sum();
    let exposure_time_pct = if equity.is_empty() {
        0.0
    } else {
        (bars_held as f64 / equity.len() as f64 * 100.0).min(100.0)
    };

    PerformanceMetrics {
        start,
        end,
        duration_millis: end - start,
        exposure_time_pct,
        equity_final,
        equity_peak,
        return_pct,
        buy_hold_return_pct: 0.0,
        return_ann_pct,
        volatility_ann_pct: std * scale * 100.0,
        sharpe_ratio,
        sortino_ratio,
        calmar_ratio,
        max_drawdown_pct: drawdown.max_pct,
        avg_drawdown_pct: drawdown.avg_pct,
        max_drawdown_duration: drawdown.max_duration,
        num_trades: trades.len(),
        win_rate_pct: trade_stats.win_rate_pct,
        best_trade_pct: trade_stats.best_pct,
        worst_trade_pct: trade_stats.worst_pct,
        avg_trade_pct: trade_stats.avg_pct,
        avg_win: trade_stats.avg_win,
        avg_loss: trade_stats.avg_loss,
        max_trade_duration_millis: trade_stats.max_duration,
        avg_trade_duration_millis: trade_stats.avg_duration,
        profit_factor: ProfitFactor::from_totals(trade_stats.gross_profit, trade_stats.gross_loss),
        commissions: trades.iter().map(|t| t.commission).sum(),
        periods_per_year,
    }
}

/// Bars per year implied by the spacing of the curve's timestamps.
///
/// The median gap picks daily (252, or 365 when any bar falls on a weekend),
/// weekly (52), monthly (12) or intraday (trading days times bars per day).
pub fn infer_periods_per_year(curve: &[EquityPoint]) -> f64 {
    if curve.len() < 2 {
        return 252.0;
    }

    let mut gaps: Vec<i64> = curve
        .windows(2)
        .map(|w| w[1].timestamp - w[0].timestamp)
        .collect();
    gaps.sort_unstable();
    let median = gaps[gaps.len() / 2];

    let has_weekends = curve.iter().any(|p| {
        matches!(
            naive_from_millis(p.timestamp).weekday(),
            Weekday::Sat | Weekday::Sun
        )
    });
    let trading_days = if has_weekends { 365.0 } else { 252.0 };

    if median >= 25 * DAY_MILLIS {
        12.0
    } else if median >= 5 * DAY_MILLIS {
        52.0
    } else if median >= DAY_MILLIS * 5 / 6 {
        trading_days
    } else {
        let days: BTreeSet<_> = curve
            .iter()
            .map(|p| naive_from_millis(p.timestamp).date())
            .collect();
        let bars_per_day = curve.len() as f64 / days.len().max(1) as f64;
        trading_days * bars_per_day.max(1.0)
    }
}

fn bar_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Mean and population standard deviation.
fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

struct DrawdownProfile {
    max_pct: f64,
    avg_pct: f64,
    max_duration: usize,
}

fn drawdown_profile(equity: &[f64]) -> DrawdownProfile {
    let mut peak = f64::MIN;
    let mut max_pct: f64 = 0.0;
    let mut run = 0usize;
    let mut max_duration = 0usize;

    // depth of each completed (or trailing) drawdown episode
    let mut episodes = Vec::new();
    let mut episode_depth: f64 = 0.0;

    for &e in equity {
        if e >= peak {
            peak = e;
            if run > 0 {
                episodes.push(episode_depth);
            }
            run = 0;
            episode_depth = 0.0;
            continue;
        }
        let dd = if peak > 0.0 { (peak - e) / peak * 100.0 } else { 0.0 };
        max_pct = max_pct.max(dd);
        episode_depth = episode_depth.max(dd);
        run += 1;
        max_duration = max_duration.max(run);
    }
    if run > 0 {
        episodes.push(episode_depth);
    }

    let avg_pct = if episodes.is_empty() {
        0.0
    } else {
        episodes.iter().sum::<f64>() / episodes.len() as f64
    };

    DrawdownProfile {
        max_pct,
        avg_pct,
        max_duration,
    }
}

#[derive(Default)]
struct TradeStats {
    win_rate_pct: f64,
    best_pct: f64,
    worst_pct: f64,
    avg_pct: f64,
    avg_win: f64,
    avg_loss: f64,
    gross_profit: f64,
    gross_loss: f64,
    max_duration: i64,
    avg_duration: i64,
}

impl TradeStats {
    fn from_trades(trades: &[Trade]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }
        let n = trades.len() as f64;

        let wins: Vec<f64> = trades.iter().filter(|t| t.is_win()).map(|t| t.pnl).collect();
        let losses: Vec<f64> = trades.iter().filter(|t| t.is_loss()).map(|t| t.pnl).collect();
        let gross_profit: f64 = wins.iter().sum();
        let gross_loss: f64 = losses.iter().map(|l| l.abs()).sum();

        let returns = trades.iter().map(|t| t.return_pct);
        let durations = trades.iter().map(Trade::duration_millis);

        Self {
            win_rate_pct: wins.len() as f64 / n * 100.0,
            best_pct: returns.clone().fold(f64::MIN, f64::max),
            worst_pct: returns.clone().fold(f64::MAX, f64::min),
            avg_pct: returns.sum::<f64>() / n,
            avg_win: if wins.is_empty() { 0.0 } else { gross_profit / wins.len() as f64 },
            avg_loss: if losses.is_empty() { 0.0 } else { -gross_loss / losses.len() as f64 },
            gross_profit,
            gross_loss,
            max_duration: durations.clone().max().unwrap_or(0),
            avg_duration: durations.sum::<i64>() / trades.len() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn curve(values: &[f64], step: i64) -> Vec<EquityPoint> {
        // 2024-01-01 is a Monday
        let base = 1_704_067_200_000;
        values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                bar_index: i,
                timestamp: base + i as i64 * step,
                equity,
            })
            .collect()
    }

    fn trade(pnl: f64, entry_bar: usize, exit_bar: usize) -> Trade {
        Trade {
            size: 10.0,
            entry_bar,
            exit_bar,
            entry_time: entry_bar as i64 * DAY_MILLIS,
            exit_time: exit_bar as i64 * DAY_MILLIS,
            entry_price: 100.0,
            exit_price: 100.0 + pnl / 10.0,
            pnl,
            return_pct: pnl / 1000.0 * 100.0,
            commission: 0.0,
            forced_exit: false,
        }
    }

    #[test]
    fn test_flat_curve() {
        let points = curve(&[1000.0; 5], DAY_MILLIS);
        let m = compute_metrics(1000.0, &points, &[]);

        assert_eq!(m.return_pct, 0.0);
        assert_eq!(m.max_drawdown_pct, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.num_trades, 0);
        assert_eq!(m.win_rate_pct, 0.0);
        assert_eq!(m.profit_factor, ProfitFactor::Undefined);
        assert_eq!(m.duration_millis, 4 * DAY_MILLIS);
    }

    #[test]
    fn test_return_and_drawdown() {
        let points = curve(&[100.0, 120.0, 90.0, 110.0, 130.0], DAY_MILLIS);
        let m = compute_metrics(100.0, &points, &[]);

        assert_relative_eq!(m.return_pct, 30.0, epsilon = 1e-9);
        assert_relative_eq!(m.max_drawdown_pct, 25.0, epsilon = 1e-9);
        assert_eq!(m.max_drawdown_duration, 2);
        assert_eq!(m.equity_peak, 130.0);
        assert!(m.sharpe_ratio > 0.0);
        assert!(m.calmar_ratio > 0.0);
    }

    #[test]
    fn test_sharpe_uses_population_std() {
        let points = curve(&[100.0, 110.0, 99.0], DAY_MILLIS);
        let m = compute_metrics(100.0, &points, &[]);

        let r: [f64; 2] = [0.1, 99.0 / 110.0 - 1.0];
        let mean = (r[0] + r[1]) / 2.0;
        let std = (((r[0] - mean).powi(2) + (r[1] - mean).powi(2)) / 2.0).sqrt();
        assert_relative_eq!(m.sharpe_ratio, mean / std * 252f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_single_point_is_degenerate() {
        let points = curve(&[100.0], DAY_MILLIS);
        let m = compute_metrics(100.0, &points, &[]);

        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.return_ann_pct, 0.0);
    }

    #[test]
    fn test_profit_factor_variants() {
        assert_eq!(ProfitFactor::from_totals(0.0, 0.0), ProfitFactor::Undefined);
        assert_eq!(ProfitFactor::from_totals(5.0, 0.0), ProfitFactor::NoLosses);
        assert_eq!(ProfitFactor::from_totals(6.0, 3.0), ProfitFactor::Finite(2.0));
        assert!(ProfitFactor::NoLosses.as_f64().is_infinite());
        assert!(ProfitFactor::Undefined.as_f64().is_nan());
    }

    #[test]
    fn test_trade_statistics() {
        let trades = vec![trade(100.0, 0, 2), trade(-50.0, 3, 4), trade(200.0, 5, 9)];
        let points = curve(&[1000.0; 10], DAY_MILLIS);
        let m = compute_metrics(1000.0, &points, &trades);

        assert_eq!(m.num_trades, 3);
        assert_relative_eq!(m.win_rate_pct, 200.0 / 3.0, epsilon = 1e-9);
        assert_eq!(m.profit_factor, ProfitFactor::Finite(6.0));
        assert_relative_eq!(m.best_trade_pct, 20.0);
        assert_relative_eq!(m.worst_trade_pct, -5.0);
        assert_relative_eq!(m.avg_win, 150.0);
        assert_relative_eq!(m.avg_loss, -50.0);
        assert_eq!(m.max_trade_duration_millis, 4 * DAY_MILLIS);
        assert_relative_eq!(m.exposure_time_pct, 70.0);
    }

    #[test]
    fn test_only_winners_have_no_losses() {
        let trades = vec![trade(10.0, 0, 1), trade(20.0, 1, 2)];
        let m = compute_metrics(1000.0, &curve(&[1000.0; 3], DAY_MILLIS), &trades);
        assert_eq!(m.profit_factor, ProfitFactor::NoLosses);
    }

    #[test]
    fn test_periods_per_year_inference() {
        // Mon..Fri only
        let weekdays = curve(&[1.0; 5], DAY_MILLIS);
        assert_eq!(infer_periods_per_year(&weekdays), 252.0);

        let with_weekend = curve(&[1.0; 7], DAY_MILLIS);
        assert_eq!(infer_periods_per_year(&with_weekend), 365.0);

        assert_eq!(infer_periods_per_year(&curve(&[1.0; 4], 7 * DAY_MILLIS)), 52.0);
        assert_eq!(infer_periods_per_year(&curve(&[1.0; 4], 30 * DAY_MILLIS)), 12.0);

        // 4 hourly bars per weekday
        let hourly = curve(&[1.0; 4], 3_600_000);
        assert_eq!(infer_periods_per_year(&hourly), 252.0 * 4.0);
    }
}
