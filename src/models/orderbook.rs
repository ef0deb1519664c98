use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

/// Top-of-book snapshot, best levels first.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn top_bid_volume(&self, n: usize) -> f64 {
        self.bids.iter().take(n).map(|l| l.size).sum()
    }

    pub fn top_ask_volume(&self, n: usize) -> f64 {
        self.asks.iter().take(n).map(|l| l.size).sum()
    }

    pub fn best_bid_size(&self) -> f64 {
        self.bids.first().map_or(0.0, |l| l.size)
    }
}

/// Result of classifying an order-book snapshot.
///
/// `is_fake_wall` and `is_real_wall` are mutually exclusive by construction:
/// the fake-wall check dominates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct DepthSnapshot {
    pub bid_ask_ratio: f64,
    pub is_real_wall: bool,
    pub is_fake_wall: bool,
}
