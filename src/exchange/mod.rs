pub mod upbit;

pub use upbit::UpbitClient;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

use crate::models::{CandleSeries, Holding, OrderBook};

/// Collaborator contract the engine depends on but does not implement.
///
/// Every method is fallible; the scan loop contains each failure at the
/// per-ticker level and carries on.
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// All tradable tickers in the configured fiat market.
    async fn fetch_tickers(&mut self) -> Result<Vec<String>>;
    /// Most recent `count` 15-minute bars, oldest first.
    async fn fetch_candles(&mut self, ticker: &str, count: usize) -> Result<CandleSeries>;
    async fn fetch_order_book(&mut self, ticker: &str) -> Result<OrderBook>;
    async fn fetch_current_price(&mut self, ticker: &str) -> Result<f64>;
    /// Available fiat cash, excluding locked amounts.
    async fn fetch_cash(&mut self) -> Result<f64>;
    async fn fetch_holdings(&mut self) -> Result<Vec<Holding>>;
    /// Tickers currently under an exchange risk warning.
    async fn fetch_risk_flags(&mut self) -> Result<HashSet<String>>;
    /// Market buy by fiat amount; returns the order id.
    async fn place_market_buy(&mut self, ticker: &str, krw_amount: f64) -> Result<String>;
    /// Market sell by quantity; returns the order id.
    async fn place_market_sell(&mut self, ticker: &str, quantity: f64) -> Result<String>;
}
