use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

use upbit_scout::config::SharedConfig;
use upbit_scout::exchange::MarketApi;
use upbit_scout::trading::{MarketScanner, Notifier, PositionMonitor, ScanContext};

/// Holdings worth less than this are dust, not positions.
const HELD_VALUATION_FLOOR: f64 = 1000.0;

/// Pull-based driver: one thread, one cycle at a time. All registry and
/// peak-tracker state is owned here, so no locking is needed around it.
pub struct ScoutBot {
    config: SharedConfig,
    market: Box<dyn MarketApi>,
    scanner: MarketScanner,
    monitor: PositionMonitor,
    notifier: Notifier,

    last_scan: Instant,
    last_position_check: Instant,
    scan_interval_secs: u64,
    position_check_secs: u64,
}

impl ScoutBot {
    pub async fn new(config: SharedConfig, market: Box<dyn MarketApi>) -> Self {
        let cfg = config.read().await.clone();

        info!("{}", "=".repeat(60));
        info!("Upbit scout starting up");
        info!(
            "Auto-buy: {} | Auto-sell: {}",
            if cfg.auto_buy { "ON" } else { "off" },
            if cfg.auto_sell { "ON" } else { "off" }
        );
        info!(
            "Scan every {}s, position check every {}s",
            cfg.scan_interval_secs, cfg.position_check_secs
        );
        info!("Ghost tickers: {:?}", cfg.ghost_tickers);
        info!("{}", "=".repeat(60));

        let scanner = MarketScanner::new(&cfg);
        let monitor = PositionMonitor::new(&cfg);
        let notifier = Notifier::new(&cfg);
        let scan_interval_secs = cfg.scan_interval_secs;
        let position_check_secs = cfg.position_check_secs;

        let now = Instant::now();
        Self {
            config,
            market,
            scanner,
            monitor,
            notifier,
            last_scan: now,
            last_position_check: now,
            scan_interval_secs,
            position_check_secs,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!("Bot is now running. Press Ctrl+C to stop.");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down.");
                    return Ok(());
                }
                _ = self.tick() => {}
            }
        }
    }

    async fn tick(&mut self) {
        if self.last_position_check.elapsed().as_secs() >= self.position_check_secs {
            self.check_positions().await;
            self.last_position_check = Instant::now();
        }

        if self.last_scan.elapsed().as_secs() >= self.scan_interval_secs {
            self.run_scan().await;
            self.last_scan = Instant::now();
        }

        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }

    async fn run_scan(&mut self) {
        let cfg = self.config.read().await.clone();

        // A whole-scan failure degrades to an empty cycle with a diagnostic,
        // never a crash.
        let tickers = match self.market.fetch_tickers().await {
            Ok(t) => t,
            Err(e) => {
                warn!("scan skipped: ticker list unavailable: {e}");
                return;
            }
        };

        let holdings = self.market.fetch_holdings().await.unwrap_or_default();
        let held: HashSet<String> = holdings
            .iter()
            .filter(|h| h.quantity * h.avg_buy_price > HELD_VALUATION_FLOOR)
            .map(|h| h.ticker.clone())
            .collect();
        let cash = self.market.fetch_cash().await.unwrap_or(0.0);
        let risk_flags = self.market.fetch_risk_flags().await.unwrap_or_default();

        let ctx = ScanContext::new(
            cash,
            held,
            cfg.ghost_tickers.iter().cloned().collect(),
            risk_flags,
            cfg.auto_buy,
        );

        let (signals, status) = self
            .scanner
            .scan_market(self.market.as_mut(), &self.notifier, &tickers, &ctx)
            .await;

        info!("{status} -> {} active signal(s)", signals.len());
    }

    async fn check_positions(&mut self) {
        let cfg = self.config.read().await.clone();

        let holdings = match self.market.fetch_holdings().await {
            Ok(h) => h,
            Err(e) => {
                debug!("position check skipped: {e}");
                return;
            }
        };

        // Positions that disappeared from the wallet were closed externally.
        let held_names: Vec<String> = holdings.iter().map(|h| h.ticker.clone()).collect();
        self.monitor.retain_tickers(&held_names);

        for holding in &holdings {
            if holding.valuation(holding.avg_buy_price) < HELD_VALUATION_FLOOR {
                continue;
            }

            let price = match self.market.fetch_current_price(&holding.ticker).await {
                Ok(p) => p,
                Err(e) => {
                    debug!("{}: price unavailable ({e})", holding.ticker);
                    continue;
                }
            };
            let book = self.market.fetch_order_book(&holding.ticker).await.ok();

            let Some(decision) = self.monitor.evaluate(holding, price, book.as_ref()) else {
                continue;
            };

            info!(
                "exit signal {} [{}] at {:.2} ({:+.2}%)",
                decision.ticker, decision.reason, decision.current_price, decision.profit_pct
            );

            if !cfg.auto_sell {
                continue;
            }

            match self
                .market
                .place_market_sell(&holding.ticker, holding.quantity)
                .await
            {
                Ok(order_id) => {
                    // Notify only once the exchange acknowledged the order.
                    info!("sell submitted {} order {}", holding.ticker, order_id);
                    self.notifier
                        .notify(&format!(
                            "*Sell submitted*\n{} ({})",
                            holding.ticker, decision.reason
                        ))
                        .await;
                }
                Err(e) => warn!("sell {} failed: {e}", holding.ticker),
            }
        }
    }
}
