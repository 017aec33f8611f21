//! Backtest results and their exported forms.

use std::io::Write;
use std::path::Path;

use barsim_core::{
    naive_from_millis, BacktestError, EquityPoint, ExecutionTiming, OrderIntent, Timeframe, Trade,
};
use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::statistics::PerformanceMetrics;

/// Inputs that shaped a run. Contains no wall-clock data, so identical
/// inputs always produce identical results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub strategy: String,
    pub strategy_params: serde_json::Value,
    pub initial_cash: f64,
    pub commission_rate: f64,
    pub execution: ExecutionTiming,
    pub bars: usize,
    pub warmup_bars: usize,
    /// Bars skipped because an indicator was still undefined
    pub suppressed_bars: usize,
}

/// An intent the ledger refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedIntent {
    /// Bar the strategy emitted the intent on
    pub bar_index: usize,
    pub intent: OrderIntent,
    pub reason: String,
}

/// Complete output of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResults {
    pub metadata: RunMetadata,
    pub metrics: PerformanceMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub rejected_intents: Vec<RejectedIntent>,
}

/// One row of the exported trade table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    #[serde(rename = "Size")]
    pub size: f64,
    #[serde(rename = "EntryBar")]
    pub entry_bar: usize,
    #[serde(rename = "ExitBar")]
    pub exit_bar: usize,
    #[serde(rename = "EntryPrice")]
    pub entry_price: f64,
    #[serde(rename = "ExitPrice")]
    pub exit_price: f64,
    #[serde(rename = "PnL")]
    pub pnl: f64,
    #[serde(rename = "ReturnPct")]
    pub return_pct: f64,
    #[serde(rename = "EntryTime")]
    pub entry_time: NaiveDateTime,
    #[serde(rename = "ExitTime")]
    pub exit_time: NaiveDateTime,
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "Commission")]
    pub commission: f64,
    #[serde(rename = "ForcedExit")]
    pub forced_exit: bool,
}

impl From<&Trade> for TradeRow {
    fn from(t: &Trade) -> Self {
        Self {
            size: t.size,
            entry_bar: t.entry_bar,
            exit_bar: t.exit_bar,
            entry_price: t.entry_price,
            exit_price: t.exit_price,
            pnl: t.pnl,
            return_pct: t.return_pct,
            entry_time: t.entry_datetime(),
            exit_time: t.exit_datetime(),
            duration: t.duration_display(),
            commission: t.commission,
            forced_exit: t.forced_exit,
        }
    }
}

/// One row of the exported equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityRow {
    #[serde(rename = "Time")]
    pub time: NaiveDateTime,
    #[serde(rename = "Equity")]
    pub equity: f64,
    #[serde(rename = "DrawdownPct")]
    pub drawdown_pct: f64,
}

/// Labelled scalar metrics in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecord(Vec<(&'static str, serde_json::Value)>);

impl MetricsRecord {
    pub fn get(&self, label: &str) -> Option<&serde_json::Value> {
        self.0.iter().find(|(l, _)| *l == label).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &serde_json::Value)> {
        self.0.iter().map(|(l, v)| (*l, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for MetricsRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

fn float(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

fn duration_label(millis: i64) -> String {
    let secs = millis / 1000;
    format!("{} days {:02}:{:02}:00", secs / 86_400, (secs % 86_400) / 3_600, (secs % 3_600) / 60)
}

impl BacktestResults {
    /// Per-trade rows for tabular export.
    pub fn trade_rows(&self) -> Vec<TradeRow> {
        self.trades.iter().map(TradeRow::from).collect()
    }

    /// Equity curve with the running drawdown at each bar.
    pub fn equity_rows(&self) -> Vec<EquityRow> {
        let mut peak = f64::MIN;
        self.equity_curve
            .iter()
            .map(|p| {
                peak = peak.max(p.equity);
                EquityRow {
                    time: naive_from_millis(p.timestamp),
                    equity: p.equity,
                    drawdown_pct: if peak > 0.0 {
                        (peak - p.equity) / peak * 100.0
                    } else {
                        0.0
                    },
                }
            })
            .collect()
    }

    /// Scalar metrics keyed by their display labels.
    pub fn metrics_record(&self) -> MetricsRecord {
        let m = &self.metrics;
        let time = |ts: i64| serde_json::Value::String(naive_from_millis(ts).to_string());
        let profit_factor = match m.profit_factor.as_f64() {
            v if v.is_infinite() => serde_json::Value::String("inf".into()),
            v => float(v),
        };

        MetricsRecord(vec![
            ("Start", time(m.start)),
            ("End", time(m.end)),
            ("Duration", duration_label(m.duration_millis).into()),
            ("Exposure Time [%]", float(m.exposure_time_pct)),
            ("Equity Final [$]", float(m.equity_final)),
            ("Equity Peak [$]", float(m.equity_peak)),
            ("Return [%]", float(m.return_pct)),
            ("Buy & Hold Return [%]", float(m.buy_hold_return_pct)),
            ("Return (Ann.) [%]", float(m.return_ann_pct)),
            ("Volatility (Ann.) [%]", float(m.volatility_ann_pct)),
            ("Sharpe Ratio", float(m.sharpe_ratio)),
            ("Sortino Ratio", float(m.sortino_ratio)),
            ("Calmar Ratio", float(m.calmar_ratio)),
            ("Max. Drawdown [%]", float(m.max_drawdown_pct)),
            ("Avg. Drawdown [%]", float(m.avg_drawdown_pct)),
            ("Max. Drawdown Duration [bars]", m.max_drawdown_duration.into()),
            ("# Trades", m.num_trades.into()),
            ("Win Rate [%]", float(m.win_rate_pct)),
            ("Best Trade [%]", float(m.best_trade_pct)),
            ("Worst Trade [%]", float(m.worst_trade_pct)),
            ("Avg. Trade [%]", float(m.avg_trade_pct)),
            ("Max. Trade Duration", duration_label(m.max_trade_duration_millis).into()),
            ("Avg. Trade Duration", duration_label(m.avg_trade_duration_millis).into()),
            ("Profit Factor", profit_factor),
            ("Commissions [$]", float(m.commissions)),
        ])
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let meta = &self.metadata;
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("RUN\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Symbol:              {} ({})\n", meta.symbol, meta.timeframe));
        s.push_str(&format!("  Strategy:            {}\n", meta.strategy));
        s.push_str(&format!("  Execution:           {}\n", meta.execution));
        s.push_str(&format!("  Initial Cash:        ${:.2}\n", meta.initial_cash));
        s.push_str(&format!("  Commission:          {:.4}\n", meta.commission_rate));
        s.push_str(&format!(
            "  Bars:                {} ({} suppressed)\n",
            meta.bars, meta.suppressed_bars
        ));
        s.push('\n');

        s.push_str("METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        for (label, value) in self.metrics_record().iter() {
            let rendered = match value {
                serde_json::Value::Number(n) if n.is_f64() => {
                    format!("{:.2}", n.as_f64().unwrap_or_default())
                }
                serde_json::Value::String(text) => text.clone(),
                serde_json::Value::Null => "n/a".to_string(),
                other => other.to_string(),
            };
            s.push_str(&format!("  {:<30} {}\n", label, rendered));
        }
        s.push('\n');

        if !self.rejected_intents.is_empty() {
            s.push_str(&format!(
                "  Rejected intents:    {}\n\n",
                self.rejected_intents.len()
            ));
        }

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&JsonExport {
            metadata: &self.metadata,
            metrics: self.metrics_record(),
            trades: self.trade_rows(),
            rejected_intents: &self.rejected_intents,
            equity_curve: self.equity_rows(),
        })
    }

    /// Write the trade table as CSV.
    pub fn write_trades_csv<W: Write>(&self, writer: W) -> Result<(), BacktestError> {
        write_csv(writer, self.trade_rows())
    }

    /// Write the equity curve as CSV.
    pub fn write_equity_csv<W: Write>(&self, writer: W) -> Result<(), BacktestError> {
        write_csv(writer, self.equity_rows())
    }

    pub fn save_trades_csv(&self, path: &Path) -> Result<(), BacktestError> {
        self.write_trades_csv(std::fs::File::create(path)?)
    }

    pub fn save_equity_csv(&self, path: &Path) -> Result<(), BacktestError> {
        self.write_equity_csv(std::fs::File::create(path)?)
    }

    /// Write the JSON export to `path`.
    pub fn save_json(&self, path: &Path) -> Result<(), BacktestError> {
        let json = self
            .to_json()
            .map_err(|e| BacktestError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    metadata: &'a RunMetadata,
    metrics: MetricsRecord,
    trades: Vec<TradeRow>,
    rejected_intents: &'a [RejectedIntent],
    equity_curve: Vec<EquityRow>,
}

fn write_csv<W: Write, R: Serialize>(writer: W, rows: Vec<R>) -> Result<(), BacktestError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| BacktestError::Serialization(e.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
