use chrono::{DateTime, Duration, Utc};

use upbit_scout::models::{Candle, CandleSeries};

/// Create candles from (open, high, low, close, volume) tuples with
/// auto-incrementing 15m timestamps.
pub fn make_candles_v(data: &[(f64, f64, f64, f64, f64)]) -> CandleSeries {
    let base = DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    let candles: Vec<Candle> = data
        .iter()
        .enumerate()
        .map(|(i, &(o, h, l, c, v))| Candle {
            timestamp: base + Duration::minutes(15 * i as i64),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
        })
        .collect();

    CandleSeries::new(candles)
}

/// A series shaped to fire the momentum-breakout strategy end to end:
/// close just above MA20, strong buy volume, a 4x relative-volume spike on
/// the final bar and a calm RSI.
pub fn make_momentum_series() -> CandleSeries {
    let mut bars: Vec<(f64, f64, f64, f64, f64)> = (0..24)
        .map(|i| {
            let close = if i % 2 == 0 { 100.0 } else { 99.5 };
            (close - 0.2, close + 0.1, close - 0.4, close, 100.0)
        })
        .collect();
    bars.push((100.2, 101.2, 100.0, 101.0, 400.0));
    make_candles_v(&bars)
}

/// A series shaped to fire the stealth-accumulation strategy: a pullback on
/// tiny volume after a rally, OBV holding its peak.
pub fn make_stealth_series() -> CandleSeries {
    let mut bars: Vec<(f64, f64, f64, f64, f64)> = (0..20)
        .map(|i| {
            let c = 100.0 + i as f64;
            (c - 0.8, c + 0.3, c - 1.0, c, 100.0)
        })
        .collect();
    for k in 0..5u32 {
        let c = 119.0 - (k + 1) as f64 * 1.5;
        bars.push((c + 1.5, c + 1.7, c - 0.3, c, 3.0));
    }
    make_candles_v(&bars)
}

/// A dead-flat series that should never produce a signal.
pub fn make_flat_series(n: usize) -> CandleSeries {
    let bars: Vec<(f64, f64, f64, f64, f64)> =
        (0..n).map(|_| (100.0, 100.2, 99.8, 100.0, 100.0)).collect();
    make_candles_v(&bars)
}
