use serde::{Deserialize, Serialize};
use std::fmt;

/// A currently held instrument as reported by the exchange account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub quantity: f64,
    pub avg_buy_price: f64,
}

impl Holding {
    pub fn valuation(&self, current_price: f64) -> f64 {
        self.quantity * current_price
    }

    pub fn profit_pct(&self, current_price: f64) -> f64 {
        if self.avg_buy_price <= 0.0 {
            return 0.0;
        }
        (current_price - self.avg_buy_price) / self.avg_buy_price * 100.0
    }
}

/// Lifecycle of a monitored position.
///
/// `Closed` is reached only on external confirmation that the quantity has
/// dropped to zero; a sell request alone never advances the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionState {
    Holding,
    Monitoring,
    ExitSignaled(ExitReason),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TrailingTakeProfit,
    LiquidityCollapse,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop-loss"),
            ExitReason::TrailingTakeProfit => write!(f, "trailing-take-profit"),
            ExitReason::LiquidityCollapse => write!(f, "liquidity-collapse"),
        }
    }
}

/// Emitted by the monitor when a held position should be sold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitDecision {
    pub ticker: String,
    pub reason: ExitReason,
    pub current_price: f64,
    pub profit_pct: f64,
}
