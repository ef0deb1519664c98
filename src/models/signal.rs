use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const AUTO_BOUGHT_TAG: &str = "auto-bought";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierLabel {
    Vip,
    Standard,
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierLabel::Vip => write!(f, "VIP"),
            TierLabel::Standard => write!(f, "standard"),
        }
    }
}

/// A scored trade candidate. Identity key is the ticker; the registry keeps
/// at most one live entry per ticker and expires entries after the TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub price: f64,
    pub score: u8,
    pub tier: TierLabel,
    pub strategy: String,
    pub reasons: Vec<String>,
    pub cut_price: f64,
    pub target_price: f64,
    pub vwap: f64,
    pub divergence: bool,
    pub rsi: f64,
    pub trade_strength: f64,
    pub ma20: f64,
    pub bet_amount: f64,
    pub risk_flagged: bool,
    pub found_at: DateTime<Utc>,
}

impl Signal {
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.found_at).num_seconds()
    }

    /// Prepend the auto-bought tag. The only mutation a signal undergoes
    /// after creation.
    pub fn mark_auto_bought(&mut self) {
        self.reasons.insert(0, AUTO_BOUGHT_TAG.to_string());
    }

    pub fn is_auto_bought(&self) -> bool {
        self.reasons.first().map(String::as_str) == Some(AUTO_BOUGHT_TAG)
    }
}
