use std::path::Path;

use anyhow::Result;
use scout_config::ScoutConfig;
use scout_core::OutputFormat;
use scout_lock::{MemoryLock, acquire_lock};
use scout_memory::{JsonFileBackend, MemoryStats, MemoryStore};

use crate::cli::LabelOutcome;

const LOCK_NAME: &str = "memory";

/// Open the memory file under the exclusive memory lock.
///
/// The lock must outlive every mutation made through the store.
pub(crate) fn open_locked_store(
    config: &ScoutConfig,
    reason: &str,
) -> Result<(MemoryLock, MemoryStore)> {
    let backend = JsonFileBackend::new(config.memory.resolved_path());
    let lock = acquire_lock(&backend.state_dir(), LOCK_NAME, reason)?;
    let store = MemoryStore::open(backend)?;
    Ok((lock, store))
}

pub(crate) fn handle_label(
    config_path: Option<&Path>,
    keyword: &str,
    outcome: LabelOutcome,
) -> Result<()> {
    let config = ScoutConfig::load(config_path)?;
    let (_lock, mut store) = open_locked_store(&config, "label")?;

    let (changed, label) = if outcome.success {
        (store.mark_success(keyword)?, "success")
    } else if outcome.failed {
        (store.mark_failure(keyword)?, "failed")
    } else {
        (store.clear_label(keyword)?, "unlabeled")
    };

    if changed {
        eprintln!("'{}' is now {label}", keyword.trim());
    } else {
        eprintln!("'{}' was already {label}", keyword.trim());
    }
    Ok(())
}

pub(crate) fn handle_revenue(config_path: Option<&Path>, amount: f64) -> Result<()> {
    let config = ScoutConfig::load(config_path)?;
    let (_lock, mut store) = open_locked_store(&config, "revenue")?;
    store.add_revenue(amount)?;
    eprintln!("Total revenue: {:.2}", store.record().total_revenue);
    Ok(())
}

/// Read-only; atomic writes make an unlocked read safe.
pub(crate) fn handle_status(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = ScoutConfig::load(config_path)?;
    let store = MemoryStore::open(JsonFileBackend::new(config.memory.resolved_path()))?;
    let stats = store.stats();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => print!("{}", format_status(&stats, store.record().recent_successes(5))),
    }
    Ok(())
}

fn format_status(stats: &MemoryStats, recent_successes: Vec<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Decisions:         {} ({} create, {} monitor, {} skip)\n",
        stats.decisions, stats.create_decisions, stats.monitor_decisions, stats.skip_decisions
    ));
    out.push_str(&format!("Products created:  {}\n", stats.products_created));
    out.push_str(&format!("Successful niches: {}\n", stats.successful_niches));
    out.push_str(&format!("Failed niches:     {}\n", stats.failed_niches));
    out.push_str(&format!("Total revenue:     {:.2}\n", stats.total_revenue));
    if !recent_successes.is_empty() {
        out.push_str(&format!("Recent successes:  {}\n", recent_successes.join(", ")));
    }
    out
}
