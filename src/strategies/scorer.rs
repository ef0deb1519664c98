use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::indicators::IndicatorSet;
use crate::models::{CandleSeries, DepthSnapshot};

pub const MOMENTUM_BREAKOUT: &str = "momentum-breakout";
pub const STEALTH_ACCUMULATION: &str = "stealth-accumulation";

const OVERBOUGHT_RSI: f64 = 70.0;
const BREAKOUT_HEADROOM: f64 = 1.03;
const TREND_ALIGNMENT_POINTS: u8 = 40;
const STRENGTH_POINTS: u8 = 20;
const VOLUME_POINTS: u8 = 20;
const DIVERGENCE_POINTS: u8 = 10;
const STEALTH_LOOKBACK: usize = 20;
const STEALTH_PRICE_CAP: f64 = 0.98;
const STEALTH_OBV_FLOOR: f64 = 0.99;
const STEALTH_SCORE: u8 = 85;
const SHADOW_BODY_VETO: f64 = 2.0;
const CUT_PRICE_RATIO: f64 = 0.97;
const TARGET_PRICE_RATIO: f64 = 1.03;

/// What the scorer hands back for an accepted instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub score: u8,
    pub strategy: String,
    pub reasons: Vec<String>,
    pub cut_price: f64,
    pub target_price: f64,
}

/// Dual-strategy scorer.
///
/// Momentum breakout is tried first; stealth accumulation only when it did
/// not fire, so a single evaluation can never carry both tags.
pub struct StrategyScorer {
    accept_score: u8,
    strength_gate: f64,
    rvol_threshold: f64,
}

impl StrategyScorer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            accept_score: cfg.accept_score,
            strength_gate: cfg.strength_gate,
            rvol_threshold: cfg.relative_volume_threshold,
        }
    }

    pub fn evaluate(
        &self,
        series: &CandleSeries,
        ind: &IndicatorSet,
        depth: &DepthSnapshot,
    ) -> Option<ScoreOutcome> {
        let last = series.last()?;
        let close = last.close;

        // Hard vetoes before either strategy gets a look.
        if depth.is_fake_wall {
            return None;
        }
        if ind.rsi >= OVERBOUGHT_RSI {
            return None;
        }

        let mut matched: Option<(u8, &'static str, Vec<String>)> = None;

        // Strategy A: just broke above the 20-bar mean, not overextended.
        if close > ind.ma20 && ind.ma20 > 0.0 && close <= ind.ma20 * BREAKOUT_HEADROOM {
            let mut score = TREND_ALIGNMENT_POINTS;
            if ind.trade_strength >= self.strength_gate {
                score += STRENGTH_POINTS;
            }
            if ind.relative_volume >= self.rvol_threshold {
                score += VOLUME_POINTS;
            }
            if ind.divergence {
                score += DIVERGENCE_POINTS;
            }
            if score >= self.accept_score {
                matched = Some((
                    score,
                    MOMENTUM_BREAKOUT,
                    vec![
                        "trend breakout".to_string(),
                        format!("strength {:.0}%", ind.trade_strength),
                    ],
                ));
            }
        }

        // Strategy B: price capped below its local high while volume flow
        // holds at its peak, the accumulation signature.
        if matched.is_none() {
            let recent = series.tail(STEALTH_LOOKBACK);
            let obv_tail = &ind.obv[ind.obv.len().saturating_sub(STEALTH_LOOKBACK)..];
            if let Some(&last_obv) = obv_tail.last() {
                let max_close = recent.max_close();
                let max_obv = obv_tail.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if close < max_close * STEALTH_PRICE_CAP && last_obv >= max_obv * STEALTH_OBV_FLOOR
                {
                    matched = Some((
                        STEALTH_SCORE,
                        STEALTH_ACCUMULATION,
                        vec![
                            "price consolidating".to_string(),
                            "obv holding its peak".to_string(),
                        ],
                    ));
                }
            }
        }

        let (score, strategy, mut reasons) = matched?;
        if score < self.accept_score {
            return None;
        }

        // Blow-off-top candle: long upper shadow over a real body.
        let body = last.body();
        if body > 0.0 && last.upper_shadow() > body * SHADOW_BODY_VETO {
            return None;
        }

        reasons.insert(0, strategy.to_string());

        Some(ScoreOutcome {
            score,
            strategy: strategy.to_string(),
            reasons,
            cut_price: ind.vwap * CUT_PRICE_RATIO,
            target_price: close * TARGET_PRICE_RATIO,
        })
    }
}
