use crate::models::{DepthSnapshot, OrderBook};

const TOP_LEVELS: usize = 5;
const ASK_VOLUME_EPSILON: f64 = 1e-4;
const FAKE_WALL_RATIO: f64 = 5.0;
const REAL_WALL_CONCENTRATION: f64 = 2.0;

/// Classify an order-book snapshot from its top five levels.
///
/// A bid/ask ratio above 5.0 is treated as spoofed support (fake wall); a
/// genuine wall needs concentration at the best bid without tripping the
/// fake-wall check, so the two flags can never both be set.
pub fn analyze_depth(book: &OrderBook) -> DepthSnapshot {
    if book.bids.is_empty() || book.asks.is_empty() {
        // No depth signal, not an error.
        return DepthSnapshot::default();
    }

    let ask_vol = book.top_ask_volume(TOP_LEVELS).max(ASK_VOLUME_EPSILON);
    let bid_vol = book.top_bid_volume(TOP_LEVELS);

    let ratio = bid_vol / ask_vol;
    let is_fake_wall = ratio > FAKE_WALL_RATIO;

    let top_bid = book.best_bid_size();
    let avg_bid = bid_vol / TOP_LEVELS as f64;
    let is_real_wall = top_bid > avg_bid * REAL_WALL_CONCENTRATION && !is_fake_wall;

    DepthSnapshot {
        bid_ask_ratio: ratio,
        is_real_wall,
        is_fake_wall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_book;

    #[test]
    fn empty_book_is_no_signal() {
        let snap = analyze_depth(&OrderBook::default());
        assert!((snap.bid_ask_ratio - 0.0).abs() < 1e-9);
        assert!(!snap.is_real_wall);
        assert!(!snap.is_fake_wall);
    }

    #[test]
    fn lopsided_bids_flag_fake_wall() {
        // 60 bid size vs 10 ask size: ratio 6 > 5
        let book = make_book(&[12.0, 12.0, 12.0, 12.0, 12.0], &[2.0, 2.0, 2.0, 2.0, 2.0]);
        let snap = analyze_depth(&book);
        assert!(snap.is_fake_wall);
        assert!(!snap.is_real_wall, "fake wall must dominate");
    }

    #[test]
    fn concentrated_best_bid_is_real_wall() {
        // top bid 10 vs avg bid 3.6, ratio 18/18 = 1.0
        let book = make_book(&[10.0, 2.0, 2.0, 2.0, 2.0], &[4.0, 4.0, 4.0, 3.0, 3.0]);
        let snap = analyze_depth(&book);
        assert!(snap.is_real_wall);
        assert!(!snap.is_fake_wall);
        assert!((snap.bid_ask_ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn concentration_inside_fake_wall_stays_fake() {
        // Best bid dominates AND the whole bid side dwarfs the asks.
        let book = make_book(&[50.0, 2.0, 2.0, 2.0, 2.0], &[1.0, 1.0, 1.0, 1.0, 1.0]);
        let snap = analyze_depth(&book);
        assert!(snap.is_fake_wall);
        assert!(!snap.is_real_wall);
    }

    #[test]
    fn zero_ask_volume_is_floored() {
        let book = make_book(&[1.0, 1.0, 1.0, 1.0, 1.0], &[0.0, 0.0, 0.0, 0.0, 0.0]);
        let snap = analyze_depth(&book);
        assert!(snap.bid_ask_ratio.is_finite());
        assert!(snap.is_fake_wall);
    }
}
