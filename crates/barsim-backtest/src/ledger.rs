//! Cash, the single open position and the trade log of one run.

use barsim_core::{LedgerError, Position, Side, Trade};

/// Single-slot position ledger.
///
/// Every mutation validates first and only then touches state, so a
/// rejected call leaves the ledger exactly as it was.
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_cash: f64,
    cash: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    commissions: f64,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            position: None,
            trades: Vec::new(),
            commissions: 0.0,
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Completed round trips, oldest first.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Total commission paid so far, including the open position's entry.
    pub fn commissions(&self) -> f64 {
        self.commissions
    }

    /// Equity if the open position were valued at `price`.
    pub fn mark_to_market(&self, price: f64) -> f64 {
        self.cash + self.position.as_ref().map_or(0.0, |p| p.market_value(price))
    }

    /// Open a position committing `fraction` of available cash.
    ///
    /// Units are whole and rounded down. When the commission would push the
    /// cost above available cash, the unit count is reduced until it fits.
    pub fn open(
        &mut self,
        bar_index: usize,
        timestamp: i64,
        side: Side,
        price: f64,
        fraction: f64,
        commission_rate: f64,
    ) -> Result<&Position, LedgerError> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(LedgerError::InvalidSize(fraction));
        }
        if self.position.is_some() {
            return Err(LedgerError::PositionAlreadyOpen);
        }

        let mut units = (self.cash * fraction / price).floor();
        if price * units * (1.0 + commission_rate) > self.cash {
            units = (self.cash / (price * (1.0 + commission_rate))).floor();
        }
        if !(units >= 1.0) {
            return Err(LedgerError::InsufficientCash {
                available: self.cash,
                price,
            });
        }

        let notional = price * units;
        let commission = notional * commission_rate;
        match side {
            Side::Buy => self.cash -= notional + commission,
            Side::Sell => self.cash += notional - commission,
        }
        self.commissions += commission;

        Ok(&*self.position.insert(Position {
            size: units * side.sign(),
            entry_price: price,
            entry_bar: bar_index,
            entry_time: timestamp,
            entry_commission: commission,
        }))
    }

    /// Close the open position at `price` and append the resulting trade.
    pub fn close(
        &mut self,
        bar_index: usize,
        timestamp: i64,
        price: f64,
        commission_rate: f64,
    ) -> Result<&Trade, LedgerError> {
        self.settle(bar_index, timestamp, price, commission_rate, false)
    }

    /// Close at the end of data on behalf of the strategy.
    pub fn force_close(
        &mut self,
        bar_index: usize,
        timestamp: i64,
        price: f64,
        commission_rate: f64,
    ) -> Result<&Trade, LedgerError> {
        self.settle(bar_index, timestamp, price, commission_rate, true)
    }

    fn settle(
        &mut self,
        bar_index: usize,
        timestamp: i64,
        price: f64,
        commission_rate: f64,
        forced_exit: bool,
    ) -> Result<&Trade, LedgerError> {
        let position = self.position.take().ok_or(LedgerError::NoOpenPosition)?;

        let notional = price * position.abs_size();
        let commission = notional * commission_rate;
        if position.is_long() {
            self.cash += notional - commission;
        } else {
            self.cash -= notional + commission;
        }
        self.commissions += commission;

        let pnl = position.size * (price - position.entry_price)
            - position.entry_commission
            - commission;
        let entry_notional = position.entry_notional();
        let return_pct = if entry_notional > 0.0 {
            pnl / entry_notional * 100.0
        } else {
            0.0
        };

        self.trades.push(Trade {
            size: position.size,
            entry_bar: position.entry_bar,
            exit_bar: bar_index,
            entry_time: position.entry_time,
            exit_time: timestamp,
            entry_price: position.entry_price,
            exit_price: price,
            pnl,
            return_pct,
            commission: position.entry_commission + commission,
            forced_exit,
        });

        Ok(&self.trades[self.trades.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_open_long_sizes_whole_units() {
        let mut ledger = Ledger::new(10_000.0);
        let pos = ledger.open(0, 0, Side::Buy, 100.0, 0.95, 0.0).unwrap();

        assert_eq!(pos.size, 95.0);
        assert_relative_eq!(ledger.cash(), 500.0);
        assert_relative_eq!(ledger.mark_to_market(110.0), 500.0 + 95.0 * 110.0);
    }

    #[test]
    fn test_commission_never_overdraws() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.open(0, 0, Side::Buy, 100.0, 1.0, 0.002).unwrap();

        // 100 units would cost 10_020
        assert_eq!(ledger.position().unwrap().size, 99.0);
        assert!(ledger.cash() >= 0.0);
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let mut ledger = Ledger::new(1_000.0);

        assert_eq!(
            ledger.open(0, 0, Side::Buy, 10.0, 1.5, 0.0).unwrap_err(),
            LedgerError::InvalidSize(1.5)
        );
        assert!(matches!(
            ledger.open(0, 0, Side::Buy, 10.0, f64::NAN, 0.0),
            Err(LedgerError::InvalidSize(_))
        ));
        assert_eq!(
            ledger.close(0, 0, 10.0, 0.0).unwrap_err(),
            LedgerError::NoOpenPosition
        );
        assert!(matches!(
            ledger.open(0, 0, Side::Buy, 5_000.0, 1.0, 0.0),
            Err(LedgerError::InsufficientCash { .. })
        ));
        assert_eq!(ledger.cash(), 1_000.0);
        assert!(ledger.is_flat());

        ledger.open(1, 0, Side::Buy, 10.0, 0.5, 0.0).unwrap();
        let cash = ledger.cash();
        assert_eq!(
            ledger.open(2, 0, Side::Buy, 10.0, 0.5, 0.0).unwrap_err(),
            LedgerError::PositionAlreadyOpen
        );
        assert_eq!(ledger.cash(), cash);
    }

    #[test]
    fn test_long_round_trip_pnl_matches_cash() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.open(3, 3_000, Side::Buy, 100.0, 0.5, 0.001).unwrap();
        let trade = ledger.close(8, 8_000, 120.0, 0.001).unwrap().clone();

        assert_eq!(trade.size, 50.0);
        assert_eq!(trade.bars_held(), 5);
        assert!(!trade.forced_exit);
        // 50 * 20 - 5.0 - 6.0
        assert_relative_eq!(trade.pnl, 989.0, epsilon = 1e-9);
        assert_relative_eq!(trade.return_pct, 989.0 / 5_000.0 * 100.0, epsilon = 1e-9);
        assert_relative_eq!(trade.commission, 11.0, epsilon = 1e-9);
        assert_relative_eq!(ledger.cash() - 10_000.0, trade.pnl, epsilon = 1e-9);
        assert_relative_eq!(ledger.commissions(), 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_short_round_trip() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.open(0, 0, Side::Sell, 100.0, 0.5, 0.0).unwrap();

        assert_eq!(ledger.position().unwrap().size, -50.0);
        assert_relative_eq!(ledger.cash(), 15_000.0);
        assert_relative_eq!(ledger.mark_to_market(90.0), 10_500.0);

        let trade = ledger.force_close(4, 4_000, 90.0, 0.0).unwrap();
        assert_relative_eq!(trade.pnl, 500.0);
        assert!(trade.forced_exit);
        assert_relative_eq!(ledger.cash(), 10_500.0);
    }
}
