use anyhow::Result;
use async_trait::async_trait;
use scout_config::TrendsConfig;
use scout_core::Candidate;
use tracing::warn;

/// Supplier of candidate niches, in priority order.
#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn list_candidates(&self) -> Result<Vec<Candidate>>;
}

/// Fixed candidate list, typically read from `[[trends.candidates]]`.
#[derive(Debug, Clone, Default)]
pub struct StaticTrendSource {
    candidates: Vec<Candidate>,
}

impl StaticTrendSource {
    /// Entries without a keyword are dropped.
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let total = candidates.len();
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| !candidate.keyword.trim().is_empty())
            .collect();
        if candidates.len() < total {
            warn!(
                dropped = total - candidates.len(),
                "ignoring trend candidates without a keyword"
            );
        }
        Self { candidates }
    }

    pub fn from_config(config: &TrendsConfig) -> Self {
        Self::new(config.to_candidates())
    }
}

#[async_trait]
impl TrendSource for StaticTrendSource {
    async fn list_candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.candidates.clone())
    }
}
