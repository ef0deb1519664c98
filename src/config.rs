use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedConfig = Arc<RwLock<Config>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Exchange
    pub upbit_access_key: String,
    pub upbit_secret_key: String,
    pub fiat: String,

    // Telegram
    pub telegram_token: String,
    pub telegram_chat_id: String,

    // Scoring thresholds
    pub accept_score: u8,
    pub vip_score: u8,
    pub strength_gate: f64,
    pub relative_volume_threshold: f64,

    // Bet sizing (KRW)
    pub vip_bet_ratio: f64,
    pub standard_bet_ratio: f64,
    pub profit_floor: f64,
    pub fee_buffer_ratio: f64,
    pub min_order_krw: f64,

    // Signal lifecycle
    pub signal_ttl_secs: i64,

    // Auto trading
    pub auto_buy: bool,
    pub auto_sell: bool,
    pub ghost_tickers: Vec<String>,
    pub max_active_holdings: usize,

    // Exit conditions
    pub stop_loss_ratio: f64,
    pub trailing_arm_profit_pct: f64,
    pub trailing_giveback_pct: f64,
    pub collapse_profit_pct: f64,
    pub collapse_bid_ratio: f64,

    // Scan pacing
    pub candle_count: usize,
    pub rate_limit_batch: usize,
    pub rate_limit_pause_ms: u64,
    pub scan_interval_secs: u64,
    pub position_check_secs: u64,

    // Logging
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = |key: &str, default: &str| -> String {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        let ghost_tickers: Vec<String> = env("GHOST_TICKERS", "KRW-LINK,KRW-ERA")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Config {
            upbit_access_key: env("UPBIT_ACCESS_KEY", ""),
            upbit_secret_key: env("UPBIT_SECRET_KEY", ""),
            fiat: "KRW".to_string(),
            telegram_token: env("TELEGRAM_TOKEN", ""),
            telegram_chat_id: env("TELEGRAM_CHAT_ID", ""),
            accept_score: 70,
            vip_score: 90,
            strength_gate: 100.0,
            relative_volume_threshold: 2.0,
            vip_bet_ratio: 0.5,
            standard_bet_ratio: 0.1,
            profit_floor: env("PROFIT_FLOOR", "17000").parse().unwrap_or(17000.0),
            fee_buffer_ratio: 0.999,
            min_order_krw: 5000.0,
            signal_ttl_secs: 3600,
            auto_buy: env("AUTO_BUY", "false").to_lowercase() == "true",
            auto_sell: env("AUTO_SELL", "false").to_lowercase() == "true",
            ghost_tickers,
            max_active_holdings: 3,
            stop_loss_ratio: 0.97,
            trailing_arm_profit_pct: 3.0,
            trailing_giveback_pct: 1.5,
            collapse_profit_pct: 0.5,
            collapse_bid_ratio: 0.2,
            candle_count: 100,
            rate_limit_batch: 50,
            rate_limit_pause_ms: env("RATE_LIMIT_PAUSE_MS", "100").parse().unwrap_or(100),
            scan_interval_secs: env("SCAN_INTERVAL", "30").parse().unwrap_or(30),
            position_check_secs: env("POSITION_CHECK_SECS", "5").parse().unwrap_or(5),
            log_level: env("LOG_LEVEL", "INFO").to_string(),
        }
    }

    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }
}
