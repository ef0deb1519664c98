use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::models::{BookLevel, Candle, CandleSeries, OrderBook, Signal, TierLabel};

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

/// Create n rising (bullish) candles starting from `start` price.
pub fn make_rising_series(n: usize, start: f64) -> CandleSeries {
    let base = DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);

    let candles: Vec<Candle> = (0..n)
        .map(|i| {
            let open = start + i as f64 * 10.0;
            let close = open + 8.0;
            Candle {
                timestamp: base + Duration::minutes(15 * i as i64),
                open,
                high: close + 2.0,
                low: open - 1.0,
                close,
                volume: 100.0,
            }
        })
        .collect();

    CandleSeries::new(candles)
}

/// Build an order book from top-5 bid and ask sizes.
pub fn make_book(bid_sizes: &[f64], ask_sizes: &[f64]) -> OrderBook {
    OrderBook {
        bids: bid_sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| BookLevel {
                price: 100.0 - i as f64 * 0.1,
                size,
            })
            .collect(),
        asks: ask_sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| BookLevel {
                price: 100.1 + i as f64 * 0.1,
                size,
            })
            .collect(),
    }
}

pub fn make_signal(ticker: &str, score: u8) -> Signal {
    Signal {
        ticker: ticker.to_string(),
        price: 100.0,
        score,
        tier: if score >= 90 {
            TierLabel::Vip
        } else {
            TierLabel::Standard
        },
        strategy: "momentum-breakout".to_string(),
        reasons: vec!["momentum-breakout".to_string()],
        cut_price: 97.0,
        target_price: 103.0,
        vwap: 100.0,
        divergence: false,
        rsi: 55.0,
        trade_strength: 120.0,
        ma20: 99.0,
        bet_amount: 17_000.0,
        risk_flagged: false,
        found_at: Utc::now(),
    }
}

/// A Config suitable for testing: no credentials, default thresholds.
pub fn default_test_config() -> Config {
    Config {
        upbit_access_key: String::new(),
        upbit_secret_key: String::new(),
        fiat: "KRW".to_string(),
        telegram_token: String::new(),
        telegram_chat_id: String::new(),
        accept_score: 70,
        vip_score: 90,
        strength_gate: 100.0,
        relative_volume_threshold: 2.0,
        vip_bet_ratio: 0.5,
        standard_bet_ratio: 0.1,
        profit_floor: 17_000.0,
        fee_buffer_ratio: 0.999,
        min_order_krw: 5_000.0,
        signal_ttl_secs: 3600,
        auto_buy: false,
        auto_sell: false,
        ghost_tickers: vec!["KRW-LINK".to_string(), "KRW-ERA".to_string()],
        max_active_holdings: 3,
        stop_loss_ratio: 0.97,
        trailing_arm_profit_pct: 3.0,
        trailing_giveback_pct: 1.5,
        collapse_profit_pct: 0.5,
        collapse_bid_ratio: 0.2,
        candle_count: 100,
        rate_limit_batch: 50,
        rate_limit_pause_ms: 0,
        scan_interval_secs: 30,
        position_check_secs: 5,
        log_level: "ERROR".to_string(),
    }
}
