//! Per-unit rewrite counters.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::rewrite_table::RedirectTarget;

/// What the engine changed in one unit (or, merged, in a batch).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    /// Calls redirected to the shim through the rewrite table
    pub redirected_calls: usize,
    /// Calls to the unit's own call-site factory redirected to the wrapper
    pub factory_calls: usize,
    /// Wrapper methods synthesized
    pub wrappers_synthesized: usize,
    /// Breakdown of redirected calls by shim method
    pub by_target: BTreeMap<String, usize>,
}

impl RewriteStats {
    pub fn record_redirect(&mut self, target: &RedirectTarget) {
        self.redirected_calls += 1;
        *self.by_target.entry(target.name.to_string()).or_insert(0) += 1;
    }

    pub fn record_factory_call(&mut self) {
        self.factory_calls += 1;
    }

    pub fn record_wrapper(&mut self) {
        self.wrappers_synthesized += 1;
    }

    /// Total rewritten call instructions.
    pub fn total_rewrites(&self) -> usize {
        self.redirected_calls + self.factory_calls
    }

    pub fn is_unchanged(&self) -> bool {
        self.total_rewrites() == 0 && self.wrappers_synthesized == 0
    }

    pub fn merge(&mut self, other: &RewriteStats) {
        self.redirected_calls += other.redirected_calls;
        self.factory_calls += other.factory_calls;
        self.wrappers_synthesized += other.wrappers_synthesized;
        for (name, count) in &other.by_target {
            *self.by_target.entry(name.clone()).or_insert(0) += count;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite_table::rules;

    #[test]
    fn test_json_shape() {
        let mut stats = RewriteStats::default();
        stats.record_redirect(&rules()[0].target);
        stats.record_wrapper();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "redirected_calls": 1,
                "factory_calls": 0,
                "wrappers_synthesized": 1,
                "by_target": { "systemProperty": 1 }
            })
        );
    }

    #[test]
    fn test_record_and_merge() {
        let mut a = RewriteStats::default();
        assert!(a.is_unchanged());
        a.record_redirect(&rules()[0].target);
        a.record_redirect(&rules()[1].target);
        a.record_factory_call();

        let mut b = RewriteStats::default();
        b.record_redirect(&rules()[9].target);
        b.record_wrapper();

        a.merge(&b);
        assert_eq!(a.redirected_calls, 3);
        assert_eq!(a.total_rewrites(), 4);
        assert_eq!(a.wrappers_synthesized, 1);
        assert_eq!(a.by_target.get("systemProperty"), Some(&2));
        assert_eq!(a.by_target.get("getBoolean"), Some(&1));
        assert!(!a.is_unchanged());
    }
}
