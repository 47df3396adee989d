use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Fixed set of named counters, incremented lock-free.
///
/// Labels are registered up front; recording an unknown label is ignored
/// (and reported by the return value) rather than growing the set.
#[derive(Debug)]
pub struct OutcomeCounters {
    counters: Vec<(&'static str, AtomicU64)>,
}

impl OutcomeCounters {
    pub fn new(labels: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            counters: labels
                .into_iter()
                .map(|label| (label, AtomicU64::new(0)))
                .collect(),
        }
    }

    /// Increment `label`. Returns `false` if the label was never registered.
    pub fn record(&self, label: &str) -> bool {
        match self.counters.iter().find(|(l, _)| *l == label) {
            Some((_, counter)) => {
                counter.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, label: &str) -> u64 {
        self.counters
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, c)| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.counters
            .iter()
            .map(|(label, c)| (*label, c.load(Ordering::Relaxed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_registered_labels_only() {
        let counters = OutcomeCounters::new(["allowed", "denied"]);
        assert!(counters.record("allowed"));
        assert!(counters.record("allowed"));
        assert!(counters.record("denied"));
        assert!(!counters.record("exploded"));

        assert_eq!(counters.get("allowed"), 2);
        assert_eq!(counters.get("exploded"), 0);
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.get("denied"), Some(&1));
        assert_eq!(snapshot.len(), 2);
    }
}
