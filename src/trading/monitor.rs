use std::collections::HashMap;
use tracing::debug;

use crate::config::Config;
use crate::models::{ExitDecision, ExitReason, Holding, OrderBook, PositionState};

const TOP_LEVELS: usize = 5;

/// Per-held-instrument trailing-peak tracker and exit state machine.
///
/// Exit checks run in a fixed order (stop-loss, then trailing take-profit,
/// then liquidity collapse) and the first match wins, so a cycle reports at most
/// one exit reason. `Closed` is reached only via [`PositionMonitor::confirm_closed`]
/// once the exchange confirms the quantity hit zero; an emitted sell request
/// is never assumed to have filled.
pub struct PositionMonitor {
    peaks: HashMap<String, f64>,
    states: HashMap<String, PositionState>,
    stop_loss_ratio: f64,
    trailing_arm_profit_pct: f64,
    trailing_giveback_pct: f64,
    collapse_profit_pct: f64,
    collapse_bid_ratio: f64,
}

impl PositionMonitor {
    pub fn new(cfg: &Config) -> Self {
        Self {
            peaks: HashMap::new(),
            states: HashMap::new(),
            stop_loss_ratio: cfg.stop_loss_ratio,
            trailing_arm_profit_pct: cfg.trailing_arm_profit_pct,
            trailing_giveback_pct: cfg.trailing_giveback_pct,
            collapse_profit_pct: cfg.collapse_profit_pct,
            collapse_bid_ratio: cfg.collapse_bid_ratio,
        }
    }

    pub fn state(&self, ticker: &str) -> PositionState {
        self.states
            .get(ticker)
            .copied()
            .unwrap_or(PositionState::Holding)
    }

    /// Observed peak price since the position was first seen. Monotonically
    /// non-decreasing until the position is confirmed closed.
    pub fn peak(&self, ticker: &str) -> Option<f64> {
        self.peaks.get(ticker).copied()
    }

    /// Run one monitoring cycle for a held position.
    pub fn evaluate(
        &mut self,
        holding: &Holding,
        current_price: f64,
        book: Option<&OrderBook>,
    ) -> Option<ExitDecision> {
        let ticker = holding.ticker.as_str();

        // A ticker seen again after a confirmed close is a new position.
        if self.state(ticker) == PositionState::Closed {
            self.states.remove(ticker);
        }

        let peak = self
            .peaks
            .entry(ticker.to_string())
            .and_modify(|p| *p = p.max(current_price))
            .or_insert(current_price);
        let peak = *peak;

        let profit_pct = holding.profit_pct(current_price);
        let drawdown_pct = if peak > 0.0 {
            (peak - current_price) / peak * 100.0
        } else {
            0.0
        };

        if profit_pct >= self.trailing_arm_profit_pct
            && self.state(ticker) == PositionState::Holding
        {
            self.states
                .insert(ticker.to_string(), PositionState::Monitoring);
            debug!("{ticker} armed for trailing exit at {profit_pct:.2}%");
        }

        let reason = self.exit_reason(holding, current_price, profit_pct, drawdown_pct, book)?;

        self.states
            .insert(ticker.to_string(), PositionState::ExitSignaled(reason));

        Some(ExitDecision {
            ticker: ticker.to_string(),
            reason,
            current_price,
            profit_pct,
        })
    }

    /// External confirmation that the quantity dropped to zero.
    pub fn confirm_closed(&mut self, ticker: &str) {
        self.peaks.remove(ticker);
        self.states.insert(ticker.to_string(), PositionState::Closed);
    }

    /// Forget state for tickers that are no longer held at all.
    pub fn retain_tickers(&mut self, held: &[String]) {
        self.peaks.retain(|t, _| held.iter().any(|h| h == t));
        self.states.retain(|t, _| held.iter().any(|h| h == t));
    }

    fn exit_reason(
        &self,
        holding: &Holding,
        current_price: f64,
        profit_pct: f64,
        drawdown_pct: f64,
        book: Option<&OrderBook>,
    ) -> Option<ExitReason> {
        if current_price < holding.avg_buy_price * self.stop_loss_ratio {
            return Some(ExitReason::StopLoss);
        }

        if profit_pct >= self.trailing_arm_profit_pct
            && drawdown_pct >= self.trailing_giveback_pct
        {
            return Some(ExitReason::TrailingTakeProfit);
        }

        if profit_pct < self.collapse_profit_pct {
            if let Some(book) = book {
                let bid = book.top_bid_volume(TOP_LEVELS);
                let ask = book.top_ask_volume(TOP_LEVELS);
                if ask > 0.0 && bid < ask * self.collapse_bid_ratio {
                    return Some(ExitReason::LiquidityCollapse);
                }
            }
        }

        None
    }
}
