// trail.rs — Bounded in-memory audit trail.
//
// The in-memory counterpart to the JSONL decision log: a fixed-capacity
// ring of decision records for runtimes that want recent-history queries
// (what got denied, what did policy X decide) without touching disk.
// At capacity the oldest record is evicted first — the trail can never
// grow without bound.

use std::collections::VecDeque;
use std::sync::Mutex;

use aw_policy::{Action, Decision, DecisionSink, SinkError};

use crate::record::DecisionRecord;

/// A bounded, queryable, in-memory history of decisions.
pub struct AuditTrail {
    entries: Mutex<VecDeque<DecisionRecord>>,
    capacity: usize,
}

impl AuditTrail {
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Create a trail retaining at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            capacity: capacity.max(1),
        }
    }

    /// Record one decision, evicting the oldest entry at capacity.
    pub fn record(&self, decision: &Decision, action: &Action) {
        let record = DecisionRecord::new(decision, action);
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(record);
    }

    /// All retained records, oldest first.
    pub fn get_all(&self) -> Vec<DecisionRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Only the retained denials.
    pub fn get_denied(&self) -> Vec<DecisionRecord> {
        self.lock()
            .iter()
            .filter(|r| r.is_denied())
            .cloned()
            .collect()
    }

    /// Records produced by one policy (including the sentinel ids).
    pub fn get_by_policy(&self, policy_id: &str) -> Vec<DecisionRecord> {
        self.lock()
            .iter()
            .filter(|r| r.policy_id == policy_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DecisionRecord>> {
        // Recover from poisoning: the ring holds plain values, so a
        // panicked writer cannot leave it half-updated in a harmful way.
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl DecisionSink for AuditTrail {
    fn record(&self, decision: &Decision, action: &Action) -> Result<(), SinkError> {
        AuditTrail::record(self, decision, action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aw_policy::{ActionMetadata, PolicyEngine, PolicyRegistry};

    fn engine() -> PolicyEngine {
        PolicyEngine::new(PolicyRegistry::builtin()).unwrap()
    }

    fn adjudicate(engine: &PolicyEngine, action_type: &str, target: &str) -> (Decision, Action) {
        let action = Action::create(action_type, target, ActionMetadata::new());
        let decision = engine.evaluate(&action);
        (decision, action)
    }

    #[test]
    fn records_and_returns_all() {
        let trail = AuditTrail::new(10);
        let engine = engine();

        let (d1, a1) = adjudicate(&engine, "file.write", ".github/workflows/ci.yml");
        let (d2, a2) = adjudicate(&engine, "file.read", "/tmp/test.txt");
        trail.record(&d1, &a1);
        trail.record(&d2, &a2);

        let all = trail.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].decision_id, d1.decision_id);
        assert_eq!(all[1].decision_id, d2.decision_id);
    }

    #[test]
    fn get_denied_filters_allows_out() {
        let trail = AuditTrail::new(10);
        let engine = engine();

        let (d1, a1) = adjudicate(&engine, "file.write", ".github/workflows/ci.yml");
        let (d2, a2) = adjudicate(&engine, "file.read", "/tmp/test.txt");
        trail.record(&d1, &a1);
        trail.record(&d2, &a2);

        let denied = trail.get_denied();
        assert_eq!(denied.len(), 1);
        assert_eq!(denied[0].policy_id, "AW-GOV-001");
    }

    #[test]
    fn get_by_policy_matches_exact_id() {
        let trail = AuditTrail::new(10);
        let engine = engine();

        let (d1, a1) = adjudicate(&engine, "git.push", "refs/heads/main");
        let (d2, a2) = adjudicate(&engine, "git.push", "refs/heads/feature/x");
        trail.record(&d1, &a1);
        trail.record(&d2, &a2);

        assert_eq!(trail.get_by_policy("AW-GIT-001").len(), 1);
        assert_eq!(trail.get_by_policy("AW-GIT-ALLOW-001").len(), 1);
        assert!(trail.get_by_policy("AW-NOPE-001").is_empty());
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let trail = AuditTrail::new(3);
        let engine = engine();

        let mut ids = Vec::new();
        for i in 0..5 {
            let (d, a) = adjudicate(&engine, "file.read", &format!("/tmp/{}.txt", i));
            ids.push(d.decision_id);
            trail.record(&d, &a);
        }

        let all = trail.get_all();
        assert_eq!(all.len(), 3);
        // The two oldest records are gone.
        assert_eq!(all[0].decision_id, ids[2]);
        assert_eq!(all[2].decision_id, ids[4]);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let trail = AuditTrail::new(0);
        assert_eq!(trail.capacity(), 1);
        let engine = engine();
        let (d, a) = adjudicate(&engine, "file.read", "/tmp/x.txt");
        trail.record(&d, &a);
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn concurrent_writers_do_not_lose_individual_records() {
        let trail = std::sync::Arc::new(AuditTrail::new(1000));
        let engine = std::sync::Arc::new(engine());

        let mut handles = Vec::new();
        for t in 0..4 {
            let trail = trail.clone();
            let engine = engine.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..25 {
                    let (d, a) = adjudicate(&engine, "file.read", &format!("/tmp/{}-{}.txt", t, i));
                    trail.record(&d, &a);
                }
            }));
        }
        for handle in handles {
            handle.join().expect("thread");
        }

        assert_eq!(trail.len(), 100);
    }
}
