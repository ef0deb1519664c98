use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.close.max(self.open)
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// (high + low + close) / 3, the money-flow price basis.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Time-ascending rolling window of OHLCV bars for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn tail(&self, n: usize) -> CandleSeries {
        let start = self.candles.len().saturating_sub(n);
        CandleSeries::new(self.candles[start..].to_vec())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }

    pub fn max_close(&self) -> f64 {
        self.candles
            .iter()
            .map(|c| c.close)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Simple moving average of volume over the last `n` bars.
    pub fn mean_volume(&self, n: usize) -> f64 {
        let tail = self.tail(n);
        if tail.is_empty() {
            return 0.0;
        }
        tail.iter().map(|c| c.volume).sum::<f64>() / tail.len() as f64
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push(candle);
    }
}

impl std::ops::Index<usize> for CandleSeries {
    type Output = Candle;
    fn index(&self, index: usize) -> &Self::Output {
        &self.candles[index]
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;
    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
