use crate::config::Config;
use crate::models::TierLabel;

/// Capital allocation for one accepted signal.
#[derive(Debug, Clone, Copy)]
pub struct BetSize {
    pub amount: f64,
    pub tier: TierLabel,
}

/// Map a score and the available cash into a bet.
///
/// VIP signals take half the cash, everything else a tenth. The result is
/// floored at the configured profit floor so a fill can still clear a
/// meaningful absolute profit at the target move, then capped just below the
/// full balance to leave room for trading fees.
pub fn size_bet(score: u8, total_cash: f64, cfg: &Config) -> BetSize {
    let (tier, ratio) = if score >= cfg.vip_score {
        (TierLabel::Vip, cfg.vip_bet_ratio)
    } else {
        (TierLabel::Standard, cfg.standard_bet_ratio)
    };

    let allocation = total_cash * ratio;
    let amount = allocation
        .max(cfg.profit_floor)
        .min(total_cash * cfg.fee_buffer_ratio);

    BetSize { amount, tier }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::default_test_config;

    #[test]
    fn vip_score_takes_half_the_cash() {
        let cfg = default_test_config();
        let bet = size_bet(95, 100_000.0, &cfg);
        assert_eq!(bet.tier, TierLabel::Vip);
        assert!((bet.amount - 50_000.0).abs() < 1e-9);
    }

    #[test]
    fn standard_score_is_raised_to_profit_floor() {
        let cfg = default_test_config();
        // 10% of 100_000 = 10_000, below the 17_000 floor.
        let bet = size_bet(60, 100_000.0, &cfg);
        assert_eq!(bet.tier, TierLabel::Standard);
        assert!((bet.amount - 17_000.0).abs() < 1e-9);
    }

    #[test]
    fn bet_never_exceeds_fee_buffered_cash() {
        let cfg = default_test_config();
        // Floor exceeds the whole balance: cap wins.
        let bet = size_bet(60, 10_000.0, &cfg);
        assert!((bet.amount - 9_990.0).abs() < 1e-9);
    }

    #[test]
    fn vip_boundary_is_inclusive() {
        let cfg = default_test_config();
        assert_eq!(size_bet(90, 100_000.0, &cfg).tier, TierLabel::Vip);
        assert_eq!(size_bet(89, 100_000.0, &cfg).tier, TierLabel::Standard);
    }
}
