use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::core::bet::size_bet;
use crate::core::depth::analyze_depth;
use crate::core::indicators::{IndicatorSet, MIN_CANDLES};
use crate::error::EngineError;
use crate::exchange::MarketApi;
use crate::models::{Signal, TierLabel};
use crate::strategies::StrategyScorer;
use crate::trading::notifier::Notifier;
use crate::trading::registry::SignalRegistry;

/// Discoveries older than this are not worth a push notification.
const FRESH_FIND_SECS: i64 = 60;

/// Ephemeral per-cycle inputs for one market scan.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    pub available_cash: f64,
    pub held_tickers: HashSet<String>,
    pub ghost_tickers: HashSet<String>,
    pub risk_flagged_tickers: HashSet<String>,
    pub auto_buy: bool,
    pub active_held_count: usize,
}

impl ScanContext {
    pub fn new(
        available_cash: f64,
        held_tickers: HashSet<String>,
        ghost_tickers: HashSet<String>,
        risk_flagged_tickers: HashSet<String>,
        auto_buy: bool,
    ) -> Self {
        // Ghost tickers are deliberately invisible to the holdings count that
        // gates automated buying.
        let active_held_count = held_tickers
            .iter()
            .filter(|t| !ghost_tickers.contains(*t))
            .count();
        Self {
            available_cash,
            held_tickers,
            ghost_tickers,
            risk_flagged_tickers,
            auto_buy,
            active_held_count,
        }
    }
}

/// One pull-based scan cycle over the ticker universe.
///
/// Strictly sequential: per-ticker evaluation is independent, every failure
/// is contained to its ticker, and after each batch of evaluations the loop
/// yields briefly as a courtesy to the upstream rate limit.
pub struct MarketScanner {
    cfg: Config,
    registry: SignalRegistry,
}

impl MarketScanner {
    pub fn new(cfg: &Config) -> Self {
        Self {
            cfg: cfg.clone(),
            registry: SignalRegistry::new(cfg.signal_ttl_secs),
        }
    }

    pub fn registry_mut(&mut self) -> &mut SignalRegistry {
        &mut self.registry
    }

    /// Evaluate every ticker and return the live signal list (newest first)
    /// plus a one-line status for the caller to display.
    pub async fn scan_market(
        &mut self,
        market: &mut dyn MarketApi,
        notifier: &Notifier,
        tickers: &[String],
        ctx: &ScanContext,
    ) -> (Vec<Signal>, String) {
        let can_auto_buy = ctx.active_held_count < self.cfg.max_active_holdings;
        let status = if ctx.auto_buy && !can_auto_buy {
            format!(
                "scanning {} tickers (active {} >= {}, auto-buy paused)",
                tickers.len(),
                ctx.active_held_count,
                self.cfg.max_active_holdings
            )
        } else {
            format!(
                "scanning {} tickers (held {} / active {})",
                tickers.len(),
                ctx.held_tickers.len(),
                ctx.active_held_count
            )
        };

        let scorer = StrategyScorer::new(&self.cfg);
        let mut new_findings: Vec<Signal> = Vec::new();

        for (i, ticker) in tickers.iter().enumerate() {
            match self.evaluate_ticker(market, &scorer, ticker, ctx).await {
                Ok(Some(mut signal)) => {
                    if ctx.auto_buy && can_auto_buy && self.auto_buy_eligible(&signal) {
                        match self
                            .execute_buy(
                                market,
                                notifier,
                                &signal.ticker,
                                signal.bet_amount,
                                signal.cut_price,
                                &signal.strategy,
                            )
                            .await
                        {
                            Ok(order_id) => {
                                info!("auto-buy {} order {}", signal.ticker, order_id);
                                signal.mark_auto_bought();
                            }
                            Err(e) => warn!("auto-buy {} failed: {e}", signal.ticker),
                        }
                    }

                    info!(
                        "signal {} [{}] score {} strength {:.0}%",
                        signal.ticker, signal.strategy, signal.score, signal.trade_strength
                    );
                    self.registry.upsert(signal.clone());
                    new_findings.push(signal);
                }
                Ok(None) => {}
                Err(e) => debug!("{ticker}: {e}"),
            }

            if (i + 1) % self.cfg.rate_limit_batch == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(
                    self.cfg.rate_limit_pause_ms,
                ))
                .await;
            }
        }

        self.notify_best_find(notifier, &new_findings, ctx).await;

        (self.registry.list_active(), status)
    }

    /// Fetch, score and size one instrument. Failures bubble up as
    /// [`EngineError`] values the scan loop downgrades to a skip.
    async fn evaluate_ticker(
        &self,
        market: &mut dyn MarketApi,
        scorer: &StrategyScorer,
        ticker: &str,
        ctx: &ScanContext,
    ) -> Result<Option<Signal>, EngineError> {
        let series = market
            .fetch_candles(ticker, self.cfg.candle_count)
            .await
            .map_err(|e| EngineError::UpstreamUnavailable(e.to_string()))?;

        if series.len() < MIN_CANDLES {
            return Err(EngineError::InsufficientData {
                got: series.len(),
                need: MIN_CANDLES,
            });
        }

        let indicators = IndicatorSet::compute(&series);

        // A missing book is "no depth signal", not a failed ticker.
        let depth = match market.fetch_order_book(ticker).await {
            Ok(book) => analyze_depth(&book),
            Err(e) => {
                debug!("{ticker}: no order book ({e})");
                Default::default()
            }
        };

        let Some(outcome) = scorer.evaluate(&series, &indicators, &depth) else {
            return Ok(None);
        };

        let close = series.last().map_or(0.0, |c| c.close);
        let bet = size_bet(outcome.score, ctx.available_cash, &self.cfg);

        Ok(Some(Signal {
            ticker: ticker.to_string(),
            price: close,
            score: outcome.score,
            tier: bet.tier,
            strategy: outcome.strategy,
            reasons: outcome.reasons,
            cut_price: outcome.cut_price,
            target_price: outcome.target_price,
            vwap: indicators.vwap,
            divergence: indicators.divergence,
            rsi: indicators.rsi,
            trade_strength: indicators.trade_strength,
            ma20: indicators.ma20,
            bet_amount: bet.amount,
            risk_flagged: ctx.risk_flagged_tickers.contains(ticker),
            found_at: Utc::now(),
        }))
    }

    fn auto_buy_eligible(&self, signal: &Signal) -> bool {
        signal.score >= self.cfg.accept_score
            && signal.trade_strength >= self.cfg.strength_gate
            && signal.price >= signal.ma20
    }

    /// Place a market buy, clamped to the available balance and the exchange
    /// minimum. Rejections are surfaced verbatim; nothing is retried.
    pub async fn execute_buy(
        &self,
        market: &mut dyn MarketApi,
        notifier: &Notifier,
        ticker: &str,
        amount: f64,
        cut_price: f64,
        label: &str,
    ) -> anyhow::Result<String> {
        let cash = market.fetch_cash().await?;
        let amount = if cash < amount {
            cash * self.cfg.fee_buffer_ratio
        } else {
            amount
        };
        if amount < self.cfg.min_order_krw {
            return Err(EngineError::OrderRejected(format!(
                "balance below the {:.0} KRW minimum order",
                self.cfg.min_order_krw
            ))
            .into());
        }

        let order_id = market.place_market_buy(ticker, amount).await?;

        notifier
            .notify(&format!(
                "*Buy filled*\n{ticker} [{label}]\namount {amount:.0} KRW\nstop {cut_price:.2}"
            ))
            .await;

        Ok(order_id)
    }

    /// Market-sell every holding above the dust threshold. Returns how many
    /// sells were submitted; individual failures are logged and skipped.
    pub async fn liquidate_all(
        &self,
        market: &mut dyn MarketApi,
        notifier: &Notifier,
    ) -> anyhow::Result<usize> {
        let holdings = market.fetch_holdings().await?;
        let mut sold = 0usize;

        for h in holdings {
            let price = match market.fetch_current_price(&h.ticker).await {
                Ok(p) => p,
                Err(e) => {
                    debug!("{}: price unavailable ({e})", h.ticker);
                    continue;
                }
            };
            if h.valuation(price) <= self.cfg.min_order_krw {
                continue;
            }
            match market.place_market_sell(&h.ticker, h.quantity).await {
                Ok(_) => sold += 1,
                Err(e) => warn!("liquidation of {} failed: {e}", h.ticker),
            }
        }

        if sold > 0 {
            notifier
                .notify(&format!("*Liquidated* {sold} position(s)"))
                .await;
        }
        Ok(sold)
    }

    /// Push the best fresh discovery of this cycle, unless it is already in
    /// the wallet or was just auto-bought.
    async fn notify_best_find(
        &self,
        notifier: &Notifier,
        findings: &[Signal],
        ctx: &ScanContext,
    ) {
        let best = findings
            .iter()
            .filter(|s| !ctx.held_tickers.contains(&s.ticker))
            .filter(|s| !s.is_auto_bought())
            .filter(|s| s.age_secs(Utc::now()) < FRESH_FIND_SECS)
            .max_by_key(|s| s.score);

        let Some(best) = best else { return };

        let tier = if best.score >= self.cfg.vip_score {
            TierLabel::Vip
        } else {
            TierLabel::Standard
        };
        notifier
            .notify(&format!(
                "*Signal found*\n{} [{}]\nscore {} (strength {:.0}%)\nsuggested bet {:.0} KRW",
                best.ticker, tier, best.score, best.trade_strength, best.bet_amount
            ))
            .await;
    }
}
