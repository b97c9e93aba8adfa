use std::path::Path;

use anyhow::{Context, Result};
use scout_config::{ScoutConfig, validate_config};
use scout_core::OutputFormat;
use scout_oracle::{ApiClient, OracleClient};
use scout_pipeline::{Cycle, CycleReport, CycleSettings, MarkdownRenderer, StaticTrendSource};
use tracing::info;

use crate::memory_cmd::open_locked_store;

pub(crate) async fn handle_run(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = ScoutConfig::load(config_path)?;
    validate_config(&config)?;
    let api_key = config.oracle.resolve_api_key()?;

    let (_lock, store) = open_locked_store(&config, "cycle")?;
    let transport = ApiClient::from_config(&config.oracle, api_key)
        .context("failed to build oracle client")?;
    let renderer = MarkdownRenderer::new(
        config.render.resolved_output_dir(),
        config.render.author.clone(),
    );
    info!(output_dir = %renderer.output_dir().display(), "starting cycle");

    let mut cycle = Cycle::new(
        store,
        OracleClient::new(transport),
        Box::new(StaticTrendSource::from_config(&config.trends)),
        Box::new(renderer),
        CycleSettings::from(&config.cycle),
    );
    let report = cycle.run().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", format_report(&report)),
    }
    Ok(())
}

fn format_report(report: &CycleReport) -> String {
    let mut out = String::new();
    for decision in &report.decisions {
        out.push_str(&format!(
            "{:<8} {:.2}  {}  ({})\n",
            decision.decision.as_str(),
            decision.confidence,
            decision.trend,
            decision.reasoning
        ));
    }
    for product in &report.products {
        out.push_str(&format!("created  {}  -> {}\n", product.title, product.path));
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(&report.summary.to_string());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::{Decision, DecisionRecord, Judgment};
    use scout_pipeline::CycleSummary;

    #[test]
    fn test_format_report_lists_decisions_then_summary() {
        let judgment = Judgment::new(Decision::Skip, 0.0, "Previously failed");
        let report = CycleReport {
            summary: CycleSummary {
                evaluated: 1,
                skipped: 1,
                total_decisions: 1,
                ..CycleSummary::default()
            },
            decisions: vec![DecisionRecord::from_judgment("Resume templates", &judgment)],
            products: Vec::new(),
        };

        let text = format_report(&report);
        assert!(text.starts_with("skip     0.00  Resume templates  (Previously failed)\n"));
        assert!(text.contains("Evaluated:        1"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_format_report_empty_cycle() {
        let text = format_report(&CycleReport::default());
        assert!(text.starts_with("Evaluated:        0"));
    }
}
