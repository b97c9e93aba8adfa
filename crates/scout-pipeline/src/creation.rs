//! Turning gated `create` decisions into rendered, recorded products.

use anyhow::Result;
use chrono::Utc;
use scout_core::{AppError, Candidate, Decision, Judgment, PRODUCT_STATUS_CREATED, ProductRecord};
use scout_memory::MemoryStore;
use scout_oracle::{OracleClient, OracleTransport};
use tracing::{info, warn};
use ulid::Ulid;

use crate::render::{Renderer, destination_name};

/// A candidate together with the judgment recorded for it this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    pub candidate: Candidate,
    pub judgment: Judgment,
    /// Id of the `DecisionRecord` written for this judgment.
    pub decision_id: Ulid,
}

/// `create` judgments at or above `gate`, in evaluation order.
pub fn eligible_for_creation(evaluated: &[Evaluated], gate: f64) -> Vec<&Evaluated> {
    evaluated
        .iter()
        .filter(|entry| entry.judgment.decision == Decision::Create)
        .filter(|entry| entry.judgment.confidence >= gate)
        .collect()
}

/// Generate, render and record one product per eligible entry.
///
/// A missing draft skips the entry. A renderer or persistence failure
/// aborts with an error; products recorded before it stay recorded.
pub async fn create_products<T: OracleTransport>(
    eligible: &[&Evaluated],
    oracle: &OracleClient<T>,
    renderer: &dyn Renderer,
    store: &mut MemoryStore,
) -> Result<Vec<ProductRecord>> {
    let mut created = Vec::with_capacity(eligible.len());

    for entry in eligible {
        let trend = entry.candidate.keyword.as_str();
        let price = entry.judgment.estimated_price;

        let Some(draft) = oracle.generate_content(trend, price).await else {
            warn!(%trend, "no content generated, skipping product");
            continue;
        };

        let now = Utc::now();
        let path = renderer
            .render(&draft, &destination_name(trend, now))
            .map_err(|error| AppError::RenderFailed {
                trend: trend.to_string(),
                message: format!("{error:#}"),
            })?;

        let product = ProductRecord {
            id: Ulid::new(),
            decision_id: Some(entry.decision_id),
            timestamp: now,
            trend: trend.to_string(),
            title: draft.title.clone(),
            path: path.display().to_string(),
            estimated_price: price,
            status: PRODUCT_STATUS_CREATED.to_string(),
        };
        store.record_product(product.clone())?;
        info!(%trend, title = %product.title, "product created");
        created.push(product);
    }

    Ok(created)
}
