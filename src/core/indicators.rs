use serde::{Deserialize, Serialize};

use crate::models::CandleSeries;

/// Minimum window for a scoreable instrument.
pub const MIN_CANDLES: usize = 20;

const FLOW_PERIOD: usize = 14;
const MA_PERIOD: usize = 20;
const SLOPE_LOOKBACK: usize = 5;
const DIVERGENCE_MFI_SLOPE: f64 = 5.0;

/// Full feature set derived from one OHLCV window.
///
/// Recomputed fresh every cycle, never persisted. Any internal failure
/// (non-finite intermediate, degenerate window) degrades to
/// [`IndicatorSet::neutral`] instead of propagating an error; the caller
/// treats the instrument as unscoreable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub mfi: f64,
    pub vwap: f64,
    pub rsi: f64,
    pub obv: Vec<f64>,
    pub trade_strength: f64,
    pub ma20: f64,
    pub divergence: bool,
    pub relative_volume: f64,
}

impl IndicatorSet {
    pub fn neutral() -> Self {
        Self {
            mfi: 50.0,
            vwap: 0.0,
            rsi: 50.0,
            obv: Vec::new(),
            trade_strength: 0.0,
            ma20: 0.0,
            divergence: false,
            relative_volume: 0.0,
        }
    }

    /// Compute the indicator set for a candle window.
    ///
    /// Total: windows shorter than [`MIN_CANDLES`] and degenerate inputs both
    /// yield the neutral defaults rather than an error.
    pub fn compute(series: &CandleSeries) -> IndicatorSet {
        if series.len() < MIN_CANDLES {
            return Self::neutral();
        }
        compute_inner(series).unwrap_or_else(Self::neutral)
    }
}

fn compute_inner(series: &CandleSeries) -> Option<IndicatorSet> {
    let len = series.len();
    let closes = series.closes();

    // Money flow split by the direction of the typical price move.
    let tp: Vec<f64> = series.iter().map(|c| c.typical_price()).collect();
    let mf: Vec<f64> = series.iter().map(|c| c.typical_price() * c.volume).collect();

    let mut pos_flow = vec![0.0; len];
    let mut neg_flow = vec![0.0; len];
    for i in 1..len {
        if tp[i] > tp[i - 1] {
            pos_flow[i] = mf[i];
        } else if tp[i] < tp[i - 1] {
            neg_flow[i] = mf[i];
        }
    }

    // Rolling 14-bar MFI series; entries before a full window stay NaN.
    let mut mfi_series = vec![f64::NAN; len];
    for i in (FLOW_PERIOD - 1)..len {
        let window = (i + 1 - FLOW_PERIOD)..=i;
        let pos_sum: f64 = window.clone().map(|j| pos_flow[j]).sum();
        let neg_sum: f64 = window.map(|j| neg_flow[j]).sum();
        mfi_series[i] = if neg_sum == 0.0 {
            // Zero outflow: the ratio blows up, oscillator pins at the top.
            100.0
        } else {
            100.0 - 100.0 / (1.0 + pos_sum / neg_sum)
        };
    }
    let mfi = mfi_series[len - 1];

    // Cumulative VWAP at the latest bar.
    let cum_mf: f64 = mf.iter().sum();
    let cum_vol: f64 = series.iter().map(|c| c.volume).sum();
    let vwap = if cum_vol > 0.0 { cum_mf / cum_vol } else { 0.0 };

    // RSI from 14-bar means of positive / negative close deltas.
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len() - FLOW_PERIOD..];
    let gain: f64 = recent.iter().filter(|d| **d > 0.0).sum::<f64>() / FLOW_PERIOD as f64;
    let loss: f64 = -recent.iter().filter(|d| **d < 0.0).sum::<f64>() / FLOW_PERIOD as f64;
    let rsi = if loss == 0.0 {
        if gain > 0.0 {
            100.0
        } else {
            50.0
        }
    } else {
        100.0 - 100.0 / (1.0 + gain / loss)
    };

    // Buying vs selling pressure over the whole window.
    let up_vol: f64 = series
        .iter()
        .filter(|c| c.is_bullish())
        .map(|c| c.volume)
        .sum();
    let down_vol: f64 = series
        .iter()
        .filter(|c| c.is_bearish())
        .map(|c| c.volume)
        .sum();
    let trade_strength = up_vol / down_vol.max(1.0) * 100.0;

    // 20-bar SMA; falls back to the mean of all bars when fewer exist.
    // The fallback changes the statistical meaning of the value but matches
    // the documented policy.
    let ma_window = if len >= MA_PERIOD {
        &closes[len - MA_PERIOD..]
    } else {
        &closes[..]
    };
    let ma20 = ma_window.iter().sum::<f64>() / ma_window.len() as f64;

    // On-balance volume, cumulative signed volume starting at 0.
    let mut obv = vec![0.0; len];
    for i in 1..len {
        obv[i] = if closes[i] > closes[i - 1] {
            obv[i - 1] + series[i].volume
        } else if closes[i] < closes[i - 1] {
            obv[i - 1] - series[i].volume
        } else {
            obv[i - 1]
        };
    }

    // Bullish hidden divergence: price flat or falling over 5 bars while
    // money flow climbs.
    let price_slope = closes[len - 1] - closes[len - SLOPE_LOOKBACK];
    let mfi_slope = mfi_series[len - 1] - mfi_series[len - SLOPE_LOOKBACK];
    let divergence = price_slope <= 0.0 && mfi_slope > DIVERGENCE_MFI_SLOPE;

    let avg_vol = series.mean_volume(MA_PERIOD);
    let relative_volume = if avg_vol > 0.0 {
        series.last()?.volume / avg_vol
    } else {
        0.0
    };

    let set = IndicatorSet {
        mfi,
        vwap,
        rsi,
        obv,
        trade_strength,
        ma20: if ma20.is_finite() { ma20 } else { 0.0 },
        divergence,
        relative_volume,
    };

    if set.mfi.is_finite() && set.vwap.is_finite() && set.rsi.is_finite() {
        Some(set)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{make_candles_v, make_rising_series};

    #[test]
    fn short_series_yields_neutral_defaults() {
        for n in 0..MIN_CANDLES {
            let series = make_rising_series(n, 100.0);
            let set = IndicatorSet::compute(&series);
            assert!((set.mfi - 50.0).abs() < 1e-9);
            assert!((set.rsi - 50.0).abs() < 1e-9);
            assert!((set.vwap - 0.0).abs() < 1e-9);
            assert!((set.trade_strength - 0.0).abs() < 1e-9);
            assert!((set.ma20 - 0.0).abs() < 1e-9);
            assert!(!set.divergence);
        }
    }

    #[test]
    fn rising_series_pins_mfi_and_rsi_high() {
        let series = make_rising_series(30, 100.0);
        let set = IndicatorSet::compute(&series);
        // Every typical price rises, so the negative flow sum is zero.
        assert!((set.mfi - 100.0).abs() < 1e-9);
        assert!((set.rsi - 100.0).abs() < 1e-9);
        assert!(set.vwap > 0.0);
    }

    #[test]
    fn obv_follows_sign_of_close_delta() {
        // 17 flat bars, then up / flat / down with distinct volumes.
        let mut bars: Vec<(f64, f64, f64, f64, f64)> =
            (0..17).map(|_| (100.0, 100.5, 99.5, 100.0, 10.0)).collect();
        bars.push((100.0, 101.5, 99.5, 101.0, 20.0)); // up: +20
        bars.push((101.0, 101.5, 100.5, 101.0, 30.0)); // flat: unchanged
        bars.push((101.0, 101.2, 98.5, 99.0, 40.0)); // down: -40
        let series = make_candles_v(&bars);
        let set = IndicatorSet::compute(&series);
        assert_eq!(set.obv.len(), 20);
        assert!((set.obv[16] - 0.0).abs() < 1e-9);
        assert!((set.obv[17] - 20.0).abs() < 1e-9);
        assert!((set.obv[18] - 20.0).abs() < 1e-9);
        assert!((set.obv[19] - -20.0).abs() < 1e-9);
    }

    #[test]
    fn obv_is_monotone_in_sign_of_delta() {
        // c0 <= c1 <= c2 implies obv never decreases across those bars.
        let mut bars: Vec<(f64, f64, f64, f64, f64)> =
            (0..17).map(|_| (100.0, 100.5, 99.5, 100.0, 10.0)).collect();
        bars.push((100.0, 100.5, 99.5, 100.0, 20.0));
        bars.push((100.0, 101.5, 99.5, 101.0, 30.0));
        bars.push((101.0, 102.5, 100.5, 102.0, 40.0));
        let series = make_candles_v(&bars);
        let set = IndicatorSet::compute(&series);
        assert!(set.obv[18] >= set.obv[17]);
        assert!(set.obv[19] >= set.obv[18]);
    }

    #[test]
    fn ma20_uses_last_twenty_closes() {
        let series = make_rising_series(40, 100.0);
        let set = IndicatorSet::compute(&series);
        let closes = series.closes();
        let expected: f64 = closes[20..].iter().sum::<f64>() / 20.0;
        assert!((set.ma20 - expected).abs() < 1e-6);
    }

    #[test]
    fn trade_strength_floors_down_volume_at_one() {
        // All candles bullish: down volume is zero, floored to 1.
        let series = make_rising_series(25, 100.0);
        let set = IndicatorSet::compute(&series);
        let up_vol: f64 = series.iter().map(|c| c.volume).sum();
        assert!((set.trade_strength - up_vol * 100.0).abs() < 1e-6);
    }

    #[test]
    fn divergence_fires_on_flat_price_with_rising_money_flow() {
        // 15 declining bars followed by 5 bars of flat closes whose highs and
        // volume push the typical price (and money flow) up hard.
        let mut bars: Vec<(f64, f64, f64, f64, f64)> = (0..15)
            .map(|i| {
                let c = 100.0 - i as f64;
                (c + 0.5, c + 1.0, c - 1.0, c, 10.0)
            })
            .collect();
        for k in 0..5u32 {
            let high = 90.0 + k as f64 * 3.0;
            bars.push((85.0, high, 84.0, 85.0, 100.0));
        }
        let series = make_candles_v(&bars);
        let set = IndicatorSet::compute(&series);
        assert!(set.divergence, "mfi={} obv tail flat", set.mfi);
    }

    #[test]
    fn no_divergence_in_plain_uptrend() {
        let series = make_rising_series(30, 100.0);
        let set = IndicatorSet::compute(&series);
        assert!(!set.divergence);
    }

    #[test]
    fn relative_volume_spikes_on_last_bar() {
        let mut bars: Vec<(f64, f64, f64, f64, f64)> = (0..24)
            .map(|i| {
                let c = 100.0 + i as f64;
                (c - 0.5, c + 1.0, c - 1.0, c, 100.0)
            })
            .collect();
        bars.push((124.0, 126.0, 123.0, 125.0, 1000.0));
        let series = make_candles_v(&bars);
        let set = IndicatorSet::compute(&series);
        // 19 bars of 100 plus the 1000 spike: mean 145, rvol ~6.9
        assert!(set.relative_volume > 2.0);
    }
}
