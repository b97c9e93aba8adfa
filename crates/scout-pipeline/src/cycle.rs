//! One survey cycle: list, decide, record, create.

use std::fmt;

use anyhow::{Context, Result};
use scout_config::CycleConfig;
use scout_core::{Decision, DecisionRecord, ProductRecord};
use scout_memory::MemoryStore;
use scout_oracle::{OracleClient, OracleTransport};
use serde::Serialize;
use tracing::info;

use crate::creation::{Evaluated, create_products, eligible_for_creation};
use crate::decision::decide;
use crate::render::Renderer;
use crate::trends::TrendSource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSettings {
    pub max_candidates: usize,
    pub creation_gate: f64,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self::from(&CycleConfig::default())
    }
}

impl From<&CycleConfig> for CycleSettings {
    fn from(config: &CycleConfig) -> Self {
        Self {
            max_candidates: config.max_candidates,
            creation_gate: config.creation_gate,
        }
    }
}

/// Counters printed at the end of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleSummary {
    /// Candidates classified this cycle.
    pub evaluated: usize,
    /// `create` decisions this cycle, gated or not.
    pub created: usize,
    pub monitored: usize,
    pub skipped: usize,
    /// Products rendered this cycle.
    pub products_created: usize,
    /// Products rendered across all cycles.
    pub catalog_size: usize,
    /// Decisions recorded across all cycles.
    pub total_decisions: usize,
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluated:        {}", self.evaluated)?;
        writeln!(
            f,
            "Decisions:        {} create, {} monitor, {} skip",
            self.created, self.monitored, self.skipped
        )?;
        writeln!(f, "Products created: {}", self.products_created)?;
        writeln!(f, "Catalog size:     {}", self.catalog_size)?;
        write!(f, "Total decisions:  {}", self.total_decisions)
    }
}

/// What a cycle did, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    pub summary: CycleSummary,
    pub decisions: Vec<DecisionRecord>,
    pub products: Vec<ProductRecord>,
}

/// Owns every collaborator needed for one run.
pub struct Cycle<T> {
    store: MemoryStore,
    oracle: OracleClient<T>,
    trends: Box<dyn TrendSource>,
    renderer: Box<dyn Renderer>,
    settings: CycleSettings,
}

impl<T: OracleTransport> Cycle<T> {
    pub fn new(
        store: MemoryStore,
        oracle: OracleClient<T>,
        trends: Box<dyn TrendSource>,
        renderer: Box<dyn Renderer>,
        settings: CycleSettings,
    ) -> Self {
        Self {
            store,
            oracle,
            trends,
            renderer,
            settings,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn into_store(self) -> MemoryStore {
        self.store
    }

    /// Run one cycle.
    ///
    /// Decisions are persisted as they are made, so a renderer failure
    /// still leaves this cycle's decisions on disk.
    pub async fn run(&mut self) -> Result<CycleReport> {
        let mut candidates = self
            .trends
            .list_candidates()
            .await
            .context("failed to list trend candidates")?;
        let listed = candidates.len();
        candidates.truncate(self.settings.max_candidates);
        info!(
            listed,
            evaluating = candidates.len(),
            "cycle started"
        );

        let mut summary = CycleSummary::default();
        let mut decisions = Vec::with_capacity(candidates.len());
        let mut evaluated = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let judgment = decide(&candidate, self.store.record(), &self.oracle).await;
            let record = DecisionRecord::from_judgment(&candidate.keyword, &judgment);
            self.store.record_decision(record.clone())?;

            summary.evaluated += 1;
            match judgment.decision {
                Decision::Create => summary.created += 1,
                Decision::Monitor => summary.monitored += 1,
                Decision::Skip => summary.skipped += 1,
            }
            evaluated.push(Evaluated {
                candidate,
                judgment,
                decision_id: record.id,
            });
            decisions.push(record);
        }

        let eligible = eligible_for_creation(&evaluated, self.settings.creation_gate);
        let products = create_products(
            &eligible,
            &self.oracle,
            self.renderer.as_ref(),
            &mut self.store,
        )
        .await?;

        let record = self.store.record();
        summary.products_created = products.len();
        summary.catalog_size = record.products_created.len();
        summary.total_decisions = record.decisions.len();
        info!(
            evaluated = summary.evaluated,
            products = summary.products_created,
            catalog = summary.catalog_size,
            "cycle finished"
        );

        Ok(CycleReport {
            summary,
            decisions,
            products,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MarkdownRenderer;
    use crate::trends::StaticTrendSource;
    use scout_core::{AppError, Candidate, ContentDraft};
    use scout_memory::{InMemoryBackend, MemoryRecord};
    use scout_oracle::ScriptedTransport;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const CREATE_REPLY: &str = r#"Here you go: {"decision": "create", "confidence": 0.9, "reasoning": "evergreen", "estimated_price": 12.5}"#;
    const DRAFT_REPLY: &str = r#"{"title": "Budget Planner Kit", "subtitle": "Plan it", "sections": [{"heading": "Start", "body": "Track spending."}]}"#;

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn render(&self, _draft: &ContentDraft, _destination: &str) -> Result<PathBuf> {
            anyhow::bail!("read-only filesystem")
        }
    }

    fn cycle(
        keywords: &[&str],
        memory: MemoryRecord,
        transport: ScriptedTransport,
        renderer: Box<dyn Renderer>,
        max_candidates: usize,
    ) -> (Cycle<ScriptedTransport>, InMemoryBackend) {
        let backend = InMemoryBackend::with_record(memory);
        let store = MemoryStore::open(backend.clone()).unwrap();
        let trends = StaticTrendSource::new(keywords.iter().map(|k| Candidate::new(*k)).collect());
        let cycle = Cycle::new(
            store,
            OracleClient::new(transport),
            Box::new(trends),
            renderer,
            CycleSettings {
                max_candidates,
                creation_gate: 0.7,
            },
        );
        (cycle, backend)
    }

    #[tokio::test]
    async fn test_create_decision_produces_one_product() {
        let dir = tempdir().unwrap();
        let transport = ScriptedTransport::new([
            Ok(CREATE_REPLY.to_string()),
            Ok(DRAFT_REPLY.to_string()),
        ]);
        let (mut cycle, backend) = cycle(
            &["Budget planner templates"],
            MemoryRecord::default(),
            transport.clone(),
            Box::new(MarkdownRenderer::new(dir.path(), "Niche Scout")),
            3,
        );

        let report = cycle.run().await.unwrap();

        assert_eq!(report.decisions.len(), 1);
        assert_eq!(report.decisions[0].decision, Decision::Create);
        assert_eq!(report.decisions[0].confidence, 0.9);
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].title, "Budget Planner Kit");
        assert_eq!(report.products[0].estimated_price, Some(12.5));
        assert_eq!(report.products[0].decision_id, Some(report.decisions[0].id));
        assert!(PathBuf::from(&report.products[0].path).exists());

        assert_eq!(transport.calls(), 2);
        assert_eq!(backend.saves(), 2);
        let persisted = backend.snapshot().unwrap();
        assert_eq!(persisted.decisions, report.decisions);
        assert_eq!(persisted.products_created, report.products);

        assert_eq!(
            report.summary,
            CycleSummary {
                evaluated: 1,
                created: 1,
                monitored: 0,
                skipped: 0,
                products_created: 1,
                catalog_size: 1,
                total_decisions: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_niche_is_skipped_without_oracle() {
        let dir = tempdir().unwrap();
        let transport = ScriptedTransport::default();
        let memory = MemoryRecord {
            failed_niches: vec!["Resume templates 2025".to_string()],
            ..MemoryRecord::default()
        };
        let (mut cycle, backend) = cycle(
            &["Resume templates 2025"],
            memory,
            transport.clone(),
            Box::new(MarkdownRenderer::new(dir.path(), "")),
            3,
        );

        let report = cycle.run().await.unwrap();

        assert_eq!(transport.calls(), 0);
        assert_eq!(report.decisions.len(), 1);
        assert_eq!(report.decisions[0].decision, Decision::Skip);
        assert_eq!(report.decisions[0].confidence, 0.0);
        assert!(report.products.is_empty());
        assert_eq!(report.summary.skipped, 1);
        assert_eq!(backend.saves(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_monitors_without_product() {
        let dir = tempdir().unwrap();
        let transport = ScriptedTransport::new([Ok("I cannot answer that.".to_string())]);
        let (mut cycle, _backend) = cycle(
            &["Niche"],
            MemoryRecord::default(),
            transport.clone(),
            Box::new(MarkdownRenderer::new(dir.path(), "")),
            3,
        );

        let report = cycle.run().await.unwrap();

        assert_eq!(report.decisions[0].decision, Decision::Monitor);
        assert_eq!(report.decisions[0].confidence, 0.5);
        assert!(report.decisions[0].reasoning.starts_with("Fallback"));
        assert!(report.products.is_empty());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_fan_out_is_capped() {
        let dir = tempdir().unwrap();
        let monitor = r#"{"decision": "monitor", "confidence": 0.4}"#;
        let transport = ScriptedTransport::new(vec![Ok(monitor.to_string()); 5]);
        let (mut cycle, _backend) = cycle(
            &["a", "b", "c", "d", "e"],
            MemoryRecord::default(),
            transport.clone(),
            Box::new(MarkdownRenderer::new(dir.path(), "")),
            3,
        );

        let report = cycle.run().await.unwrap();

        assert_eq!(report.summary.evaluated, 3);
        assert_eq!(transport.calls(), 3);
        let trends: Vec<&str> = report.decisions.iter().map(|d| d.trend.as_str()).collect();
        assert_eq!(trends, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fewer_candidates_than_cap() {
        let dir = tempdir().unwrap();
        let transport = ScriptedTransport::new([Ok(r#"{"decision": "skip", "confidence": 0.8}"#.to_string())]);
        let (mut cycle, _backend) = cycle(
            &["only"],
            MemoryRecord::default(),
            transport,
            Box::new(MarkdownRenderer::new(dir.path(), "")),
            3,
        );

        let report = cycle.run().await.unwrap();
        assert_eq!(report.summary.evaluated, 1);
    }

    #[tokio::test]
    async fn test_create_below_gate_is_not_built() {
        let dir = tempdir().unwrap();
        let transport = ScriptedTransport::new([Ok(
            r#"{"decision": "create", "confidence": 0.6}"#.to_string(),
        )]);
        let (mut cycle, _backend) = cycle(
            &["lukewarm"],
            MemoryRecord::default(),
            transport.clone(),
            Box::new(MarkdownRenderer::new(dir.path(), "")),
            3,
        );

        let report = cycle.run().await.unwrap();

        assert_eq!(report.summary.created, 1);
        assert_eq!(report.summary.products_created, 0);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_fails_cycle_after_decisions_persist() {
        let memory = MemoryRecord {
            successful_niches: vec!["proven".to_string()],
            ..MemoryRecord::default()
        };
        let transport = ScriptedTransport::new([Ok(DRAFT_REPLY.to_string())]);
        let (mut cycle, backend) = cycle(
            &["proven"],
            memory,
            transport,
            Box::new(FailingRenderer),
            3,
        );

        let err = cycle.run().await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::RenderFailed { .. })
        ));
        let persisted = backend.snapshot().unwrap();
        assert_eq!(persisted.decisions.len(), 1);
        assert!(persisted.products_created.is_empty());
        assert!(cycle.into_store().record().products_created.is_empty());
    }

    #[test]
    fn test_summary_display() {
        let summary = CycleSummary {
            evaluated: 3,
            created: 1,
            monitored: 1,
            skipped: 1,
            products_created: 1,
            catalog_size: 4,
            total_decisions: 9,
        };
        let text = summary.to_string();
        assert!(text.contains("Evaluated:        3"));
        assert!(text.contains("1 create, 1 monitor, 1 skip"));
        assert!(text.contains("Catalog size:     4"));
    }
}
