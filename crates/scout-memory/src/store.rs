use anyhow::{Context, Result};
use scout_core::{AppError, DecisionRecord, ProductRecord};
use tracing::{debug, info, warn};

use crate::backend::StateBackend;
use crate::record::{MemoryRecord, MemoryStats};

/// Owner of the [`MemoryRecord`] for one process run.
///
/// Every mutator persists the whole record before returning, so a crash
/// loses at most the step that was in flight.
pub struct MemoryStore {
    backend: Box<dyn StateBackend>,
    record: MemoryRecord,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("record", &self.record.stats())
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Load the record from `backend`, starting empty when there is none.
    pub fn open(backend: impl StateBackend + 'static) -> Result<Self> {
        let mut record = backend
            .load()
            .context("failed to load memory")?
            .unwrap_or_default();

        let dropped = record.normalize_labels();
        if dropped > 0 {
            warn!(dropped, "dropped duplicate or conflicting niche labels");
        }

        debug!(
            decisions = record.decisions.len(),
            products = record.products_created.len(),
            "memory loaded"
        );
        Ok(Self {
            backend: Box::new(backend),
            record,
        })
    }

    pub fn record(&self) -> &MemoryRecord {
        &self.record
    }

    pub fn into_record(self) -> MemoryRecord {
        self.record
    }

    pub fn stats(&self) -> MemoryStats {
        self.record.stats()
    }

    /// Persist the entire record, replacing what was stored before.
    pub fn save(&self) -> Result<()> {
        self.backend
            .save(&self.record)
            .context("failed to persist memory")
    }

    pub fn record_decision(&mut self, decision: DecisionRecord) -> Result<()> {
        debug!(
            trend = %decision.trend,
            decision = %decision.decision,
            confidence = decision.confidence,
            "recording decision"
        );
        self.record.decisions.push(decision);
        self.save()
    }

    pub fn record_product(&mut self, product: ProductRecord) -> Result<()> {
        info!(trend = %product.trend, path = %product.path, "recording product");
        self.record.products_created.push(product);
        self.save()
    }

    /// Label `niche` as a proven success, removing any failure label.
    ///
    /// Returns `false` when the niche already carried exactly this label.
    pub fn mark_success(&mut self, niche: &str) -> Result<bool> {
        let niche = normalized_label(niche)?;
        if self.record.is_successful(niche) {
            return Ok(false);
        }
        self.record.failed_niches.retain(|entry| entry != niche);
        self.record.successful_niches.push(niche.to_string());
        self.save()?;
        Ok(true)
    }

    /// Label `niche` as failed, removing any success label.
    pub fn mark_failure(&mut self, niche: &str) -> Result<bool> {
        let niche = normalized_label(niche)?;
        if self.record.is_failed(niche) {
            return Ok(false);
        }
        self.record.successful_niches.retain(|entry| entry != niche);
        self.record.failed_niches.push(niche.to_string());
        self.save()?;
        Ok(true)
    }

    /// Remove `niche` from both label sets.
    pub fn clear_label(&mut self, niche: &str) -> Result<bool> {
        let niche = normalized_label(niche)?;
        let before = self.record.successful_niches.len() + self.record.failed_niches.len();
        self.record.successful_niches.retain(|entry| entry != niche);
        self.record.failed_niches.retain(|entry| entry != niche);
        let after = self.record.successful_niches.len() + self.record.failed_niches.len();
        if before == after {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    pub fn add_revenue(&mut self, amount: f64) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(AppError::InvalidRevenue(amount).into());
        }
        self.record.total_revenue += amount;
        self.save()
    }
}

fn normalized_label(niche: &str) -> Result<&str> {
    let niche = niche.trim();
    if niche.is_empty() {
        return Err(AppError::InvalidLabel.into());
    }
    Ok(niche)
}
