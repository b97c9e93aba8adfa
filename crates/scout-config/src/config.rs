use anyhow::{Context, Result};
use scout_core::{Candidate, Competition};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::oracle::OracleConfig;
use crate::paths;

const DEFAULT_MAX_CANDIDATES: usize = 3;
const DEFAULT_CREATION_GATE: f64 = 0.7;
const DEFAULT_AUTHOR: &str = "Niche Scout";
const DEFAULT_CATEGORY: &str = "digital products";

/// Niches surveyed when no trend list is configured.
const SEED_NICHES: &[&str] = &[
    "AI prompt templates",
    "Notion templates for entrepreneurs",
    "Resume templates 2025",
    "Social media content calendars",
    "Budget spreadsheet templates",
];

/// Top-level configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub cycle: CycleConfig,
    pub oracle: OracleConfig,
    pub memory: MemoryConfig,
    pub render: RenderConfig,
    pub trends: TrendsConfig,
}

/// Per-cycle cost and quality controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Maximum candidates evaluated per cycle (fan-out cap).
    pub max_candidates: usize,
    /// Minimum confidence for a `create` decision to produce a product.
    pub creation_gate: f64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            creation_gate: DEFAULT_CREATION_GATE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Memory file location. Empty = XDG state dir.
    pub path: String,
}

impl MemoryConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.trim().is_empty() {
            paths::default_memory_path()
        } else {
            PathBuf::from(&self.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory rendered products are written to. Empty = XDG data dir.
    pub output_dir: String,
    /// Author used when the generated draft does not name one.
    pub author: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: String::new(),
            author: DEFAULT_AUTHOR.to_string(),
        }
    }
}

impl RenderConfig {
    pub fn resolved_output_dir(&self) -> PathBuf {
        if self.output_dir.trim().is_empty() {
            paths::default_products_dir()
        } else {
            PathBuf::from(&self.output_dir)
        }
    }
}

/// Static trend list fed to the cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    pub candidates: Vec<CandidateConfig>,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            candidates: SEED_NICHES
                .iter()
                .map(|keyword| CandidateConfig {
                    keyword: (*keyword).to_string(),
                    ..CandidateConfig::default()
                })
                .collect(),
        }
    }
}

impl TrendsConfig {
    pub fn to_candidates(&self) -> Vec<Candidate> {
        self.candidates
            .iter()
            .map(|entry| Candidate {
                keyword: entry.keyword.trim().to_string(),
                category: entry.category.clone(),
                search_volume: entry.search_volume,
                competition: entry.competition,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateConfig {
    pub keyword: String,
    pub category: String,
    pub search_volume: Option<u64>,
    pub competition: Competition,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            search_volume: None,
            competition: Competition::Unknown,
        }
    }
}

impl ScoutConfig {
    /// Load config from an explicit path, or the default XDG location.
    ///
    /// Returns `Default` if the file does not exist or if the config
    /// directory cannot be determined (e.g., no HOME in containers).
    /// An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => match paths::default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Generate default config TOML with comments as a template.
    pub fn default_template() -> String {
        r#"# niche-scout configuration
# Location: ~/.config/niche-scout/config.toml

[cycle]
max_candidates = 3   # Candidates evaluated per cycle (cost control)
creation_gate = 0.7  # Minimum confidence for a create decision to produce a product

[oracle]
base_url = "https://api.openai.com/v1"
models = "gpt-4o-mini"              # Comma-separated; later models are failover
api_key_env = "NICHE_SCOUT_API_KEY" # The key itself stays in the environment
timeout_secs = 60
temperature = 0.7

[memory]
path = ""  # Empty = ~/.local/state/niche-scout/memory/memory.json

[render]
output_dir = ""  # Empty = ~/.local/share/niche-scout/products
author = "Niche Scout"

[[trends.candidates]]
keyword = "AI prompt templates"
category = "digital products"
# search_volume = 12000
# competition = "medium"
"#
        .to_string()
    }
}
