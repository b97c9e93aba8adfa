use scout_core::{Decision, DecisionRecord, ProductRecord};
use serde::{Deserialize, Serialize};

/// Everything the agent remembers across cycles.
///
/// Every field defaults so files written by older versions still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryRecord {
    pub decisions: Vec<DecisionRecord>,
    pub products_created: Vec<ProductRecord>,
    /// Insertion-ordered, duplicate-free.
    pub successful_niches: Vec<String>,
    /// Insertion-ordered, duplicate-free. Disjoint from `successful_niches`.
    pub failed_niches: Vec<String>,
    pub total_revenue: f64,
}

/// Aggregate counters over a [`MemoryRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryStats {
    pub decisions: usize,
    pub create_decisions: usize,
    pub monitor_decisions: usize,
    pub skip_decisions: usize,
    pub products_created: usize,
    pub successful_niches: usize,
    pub failed_niches: usize,
    pub total_revenue: f64,
}

impl MemoryRecord {
    pub fn is_failed(&self, niche: &str) -> bool {
        self.failed_niches.iter().any(|entry| entry == niche)
    }

    pub fn is_successful(&self, niche: &str) -> bool {
        self.successful_niches.iter().any(|entry| entry == niche)
    }

    /// Up to `limit` most recently labeled successes, newest first.
    pub fn recent_successes(&self, limit: usize) -> Vec<&str> {
        recent(&self.successful_niches, limit)
    }

    /// Up to `limit` most recently labeled failures, newest first.
    pub fn recent_failures(&self, limit: usize) -> Vec<&str> {
        recent(&self.failed_niches, limit)
    }

    pub fn stats(&self) -> MemoryStats {
        let count = |kind: Decision| {
            self.decisions
                .iter()
                .filter(|record| record.decision == kind)
                .count()
        };
        MemoryStats {
            decisions: self.decisions.len(),
            create_decisions: count(Decision::Create),
            monitor_decisions: count(Decision::Monitor),
            skip_decisions: count(Decision::Skip),
            products_created: self.products_created.len(),
            successful_niches: self.successful_niches.len(),
            failed_niches: self.failed_niches.len(),
            total_revenue: self.total_revenue,
        }
    }

    /// Drop duplicates and resolve niches labeled both ways.
    ///
    /// A niche found in both sets is kept as failed. Returns how many
    /// entries were dropped.
    pub(crate) fn normalize_labels(&mut self) -> usize {
        let before = self.successful_niches.len() + self.failed_niches.len();
        dedup_in_order(&mut self.failed_niches);
        dedup_in_order(&mut self.successful_niches);
        let failed = self.failed_niches.clone();
        self.successful_niches
            .retain(|niche| !failed.iter().any(|entry| entry == niche));
        before - (self.successful_niches.len() + self.failed_niches.len())
    }
}

fn recent(entries: &[String], limit: usize) -> Vec<&str> {
    entries.iter().rev().take(limit).map(String::as_str).collect()
}

fn dedup_in_order(entries: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::with_capacity(entries.len());
    entries.retain(|entry| {
        if seen.contains(entry) {
            false
        } else {
            seen.push(entry.clone());
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::Judgment;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn test_empty_json_loads_defaults() {
        let record: MemoryRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, MemoryRecord::default());
    }

    #[test]
    fn test_legacy_file_loads() {
        let json = r#"{
            "decisions": [{
                "timestamp": "2025-01-05T10:00:00Z",
                "trend": "AI prompt templates",
                "decision": "create",
                "confidence": 0.7,
                "reason": "Score: 0.7"
            }],
            "products_created": [],
            "successful_niches": [],
            "failed_niches": ["Resume templates 2025"],
            "total_revenue": 0
        }"#;
        let record: MemoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.decisions.len(), 1);
        assert!(record.is_failed("Resume templates 2025"));
        assert_eq!(record.total_revenue, 0.0);
    }

    #[test]
    fn test_recent_is_newest_first_and_bounded() {
        let record = MemoryRecord {
            successful_niches: labels(&["a", "b", "c"]),
            ..MemoryRecord::default()
        };
        assert_eq!(record.recent_successes(2), vec!["c", "b"]);
        assert_eq!(record.recent_failures(5), Vec::<&str>::new());
    }

    #[test]
    fn test_stats_counts_by_kind() {
        let mut record = MemoryRecord::default();
        for judgment in [
            Judgment::proven_success(),
            Judgment::previously_failed(),
            Judgment::fallback("x"),
            Judgment::fallback("y"),
        ] {
            record
                .decisions
                .push(DecisionRecord::from_judgment("niche", &judgment));
        }
        record.total_revenue = 12.5;

        let stats = record.stats();
        assert_eq!(stats.decisions, 4);
        assert_eq!(stats.create_decisions, 1);
        assert_eq!(stats.skip_decisions, 1);
        assert_eq!(stats.monitor_decisions, 2);
        assert_eq!(stats.total_revenue, 12.5);
    }

    #[test]
    fn test_normalize_labels_resolves_overlap_as_failed() {
        let mut record = MemoryRecord {
            successful_niches: labels(&["a", "b", "a"]),
            failed_niches: labels(&["b", "c", "c"]),
            ..MemoryRecord::default()
        };
        let removed = record.normalize_labels();
        assert_eq!(removed, 3);
        assert_eq!(record.successful_niches, labels(&["a"]));
        assert_eq!(record.failed_niches, labels(&["b", "c"]));
    }
}
