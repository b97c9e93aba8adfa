//! Per-candidate classification into create / monitor / skip.

use scout_core::{Candidate, Judgment};
use scout_memory::MemoryRecord;
use scout_oracle::{OracleClient, OracleTransport};
use tracing::info;

/// Number of recent labels of each kind shown to the oracle.
pub const CONTEXT_WINDOW: usize = 5;

/// Classify one candidate against memory.
///
/// Known failures and known successes are answered from memory without an
/// oracle call. The engine only reads `memory`; recording the outcome is
/// the caller's job.
pub async fn decide<T: OracleTransport>(
    candidate: &Candidate,
    memory: &MemoryRecord,
    oracle: &OracleClient<T>,
) -> Judgment {
    if memory.is_failed(&candidate.keyword) {
        info!(trend = %candidate.keyword, "previously failed, skipping");
        return Judgment::previously_failed();
    }
    if memory.is_successful(&candidate.keyword) {
        info!(trend = %candidate.keyword, "proven success, creating");
        return Judgment::proven_success();
    }

    let judgment = oracle
        .evaluate(candidate, &context_summary(memory))
        .await;
    info!(
        trend = %candidate.keyword,
        decision = %judgment.decision,
        confidence = judgment.confidence,
        "oracle judgment"
    );
    judgment
}

/// Short history digest sent along with every evaluation request.
pub fn context_summary(memory: &MemoryRecord) -> String {
    let stats = memory.stats();
    let successes = memory.recent_successes(CONTEXT_WINDOW);
    let failures = memory.recent_failures(CONTEXT_WINDOW);

    let list = |items: &[&str]| {
        if items.is_empty() {
            "none".to_string()
        } else {
            items.join(", ")
        }
    };

    format!(
        "Proven niches: {}\nFailed niches: {}\nDecisions so far: {} ({} create, {} monitor, {} skip)\nProducts created: {}\nTotal revenue: {:.2}",
        list(&successes),
        list(&failures),
        stats.decisions,
        stats.create_decisions,
        stats.monitor_decisions,
        stats.skip_decisions,
        stats.products_created,
        stats.total_revenue,
    )
}
