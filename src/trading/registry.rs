use chrono::Utc;
use std::collections::HashMap;

use crate::models::Signal;

/// Time-boxed store of active signals, keyed by ticker.
///
/// Expiry is evaluated lazily on every read and write, consistent with the
/// pull-based refresh model. No background timer. Owned by the single scan
/// thread; nothing else reads or writes it concurrently.
pub struct SignalRegistry {
    signals: HashMap<String, Signal>,
    ttl_secs: i64,
}

impl SignalRegistry {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            signals: HashMap::new(),
            ttl_secs,
        }
    }

    /// Insert or overwrite by ticker: the latest detection wins.
    pub fn upsert(&mut self, signal: Signal) {
        self.purge_expired();
        self.signals.insert(signal.ticker.clone(), signal);
    }

    /// Purge expired entries, then return the rest newest-first.
    pub fn list_active(&mut self) -> Vec<Signal> {
        self.purge_expired();
        let mut out: Vec<Signal> = self.signals.values().cloned().collect();
        out.sort_by(|a, b| b.found_at.cmp(&a.found_at));
        out
    }

    pub fn get(&self, ticker: &str) -> Option<&Signal> {
        self.signals.get(ticker)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn clear(&mut self) {
        self.signals.clear();
    }

    fn purge_expired(&mut self) {
        let now = Utc::now();
        let ttl = self.ttl_secs;
        self.signals.retain(|_, s| s.age_secs(now) <= ttl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::make_signal;
    use chrono::Duration;

    #[test]
    fn upsert_deduplicates_by_ticker() {
        let mut reg = SignalRegistry::new(3600);
        let mut first = make_signal("KRW-BTC", 80);
        first.price = 100.0;
        let mut second = make_signal("KRW-BTC", 92);
        second.price = 110.0;

        reg.upsert(first);
        reg.upsert(second);

        assert_eq!(reg.len(), 1);
        let active = reg.list_active();
        assert_eq!(active[0].score, 92);
        assert!((active[0].price - 110.0).abs() < 1e-9);
    }

    #[test]
    fn expired_entries_vanish_from_reads() {
        let mut reg = SignalRegistry::new(3600);
        let mut stale = make_signal("KRW-ETH", 75);
        stale.found_at = Utc::now() - Duration::seconds(3601);
        let fresh = make_signal("KRW-BTC", 75);

        reg.upsert(stale);
        reg.upsert(fresh);

        let active = reg.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].ticker, "KRW-BTC");
    }

    #[test]
    fn list_is_sorted_newest_first() {
        let mut reg = SignalRegistry::new(3600);
        let mut older = make_signal("KRW-ETH", 75);
        older.found_at = Utc::now() - Duration::minutes(10);
        let newer = make_signal("KRW-BTC", 75);

        reg.upsert(older);
        reg.upsert(newer);

        let active = reg.list_active();
        assert_eq!(active[0].ticker, "KRW-BTC");
        assert_eq!(active[1].ticker, "KRW-ETH");
    }

    #[test]
    fn clear_empties_the_store() {
        let mut reg = SignalRegistry::new(3600);
        reg.upsert(make_signal("KRW-BTC", 75));
        reg.clear();
        assert!(reg.is_empty());
        assert!(reg.list_active().is_empty());
    }
}
