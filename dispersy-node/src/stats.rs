//! Process-lifetime counters, exposed read-only for diagnostics and
//! asserted against directly in tests instead of scraping log output.

use std::collections::HashMap;

/// Accumulates named drop/delay/success reasons the way a `dict_inc` call
/// does: missing keys start at zero.
#[derive(Default, Clone, Debug)]
pub struct ReasonCounters(HashMap<&'static str, u64>);

impl ReasonCounters {
    pub fn inc(&mut self, key: &'static str) {
        *self.0.entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: &'static str) -> u64 {
        *self.0.get(key).unwrap_or(&0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

#[derive(Default, Clone, Debug)]
pub struct Statistics {
    pub drop_count: u64,
    pub delay_count: u64,
    pub delay_send: u64,
    pub delay_success: u64,
    pub delay_timeout: u64,
    pub success_count: u64,
    pub created_count: u64,
    pub received_count: u64,

    pub walk_attempt: u64,
    pub walk_reset: u64,
    pub walk_success: u64,
    pub walk_bootstrap_attempt: u64,
    pub walk_bootstrap_success: u64,

    pub drop: ReasonCounters,
    pub delay: ReasonCounters,
    pub success: ReasonCounters,
    pub outgoing: ReasonCounters,
    pub created: ReasonCounters,
    pub walk_fail: ReasonCounters,
}

impl Statistics {
    pub fn reset(&mut self) {
        self.success_count = 0;
        self.drop_count = 0;
        self.delay_count = 0;
        self.delay_send = 0;
        self.delay_success = 0;
        self.delay_timeout = 0;
        self.received_count = 0;
        self.created_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_counters_default_to_zero() {
        let counters = ReasonCounters::default();
        assert_eq!(counters.get("unseen-key"), 0);
    }

    #[test]
    fn reason_counters_accumulate() {
        let mut counters = ReasonCounters::default();
        counters.inc("duplicate");
        counters.inc("duplicate");
        counters.inc("old");
        assert_eq!(counters.get("duplicate"), 2);
        assert_eq!(counters.get("old"), 1);
        assert_eq!(counters.total(), 3);
    }
}
