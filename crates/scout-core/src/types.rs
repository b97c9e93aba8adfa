use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Confidence assigned to niches that already proved themselves.
pub const PROVEN_SUCCESS_CONFIDENCE: f64 = 0.95;

/// Confidence used when the oracle reply cannot be trusted.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Status written on every product that made it through rendering.
pub const PRODUCT_STATUS_CREATED: &str = "created";

/// Outcome of evaluating one candidate niche.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Create,
    Monitor,
    Skip,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Monitor => "monitor",
            Self::Skip => "skip",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "monitor" => Ok(Self::Monitor),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "Invalid decision '{other}'. Valid values: create, monitor, skip"
            )),
        }
    }
}

/// Rough competition estimate reported by the trend source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Competition {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl std::fmt::Display for Competition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A market opportunity supplied by a trend source.
///
/// `keyword` is the natural key used for every memory lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub keyword: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub search_volume: Option<u64>,
    #[serde(default)]
    pub competition: Competition,
}

impl Candidate {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: String::new(),
            search_volume: None,
            competition: Competition::Unknown,
        }
    }
}

/// Structured evaluation of a candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub decision: Decision,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differentiator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
}

impl Judgment {
    /// Build a judgment, clamping confidence into `[0, 1]`.
    pub fn new(decision: Decision, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            decision,
            confidence: confidence.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
            estimated_price: None,
            differentiator: None,
            product_type: None,
        }
    }

    /// Judgment substituted when the oracle cannot produce a usable one.
    pub fn fallback(diagnostic: impl Into<String>) -> Self {
        Self::new(Decision::Monitor, FALLBACK_CONFIDENCE, diagnostic)
    }

    pub fn previously_failed() -> Self {
        Self::new(Decision::Skip, 0.0, "Previously failed")
    }

    pub fn proven_success() -> Self {
        Self::new(Decision::Create, PROVEN_SUCCESS_CONFIDENCE, "Proven success")
    }
}

/// One heading/body block of generated content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    #[serde(alias = "content")]
    pub body: String,
}

/// Generated product content, ready for rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentDraft {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Append-only log entry for one decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(default = "Ulid::new")]
    pub id: Ulid,
    pub timestamp: DateTime<Utc>,
    pub trend: String,
    pub decision: Decision,
    pub confidence: f64,
    #[serde(alias = "reason", default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub differentiator: Option<String>,
}

impl DecisionRecord {
    pub fn from_judgment(trend: impl Into<String>, judgment: &Judgment) -> Self {
        Self {
            id: Ulid::new(),
            timestamp: Utc::now(),
            trend: trend.into(),
            decision: judgment.decision,
            confidence: judgment.confidence,
            reasoning: judgment.reasoning.clone(),
            estimated_price: judgment.estimated_price,
            differentiator: judgment.differentiator.clone(),
        }
    }
}

/// Append-only log entry for a rendered product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(default = "Ulid::new")]
    pub id: Ulid,
    #[serde(default)]
    pub decision_id: Option<Ulid>,
    pub timestamp: DateTime<Utc>,
    pub trend: String,
    pub title: String,
    #[serde(alias = "filename")]
    pub path: String,
    #[serde(default)]
    pub estimated_price: Option<f64>,
    #[serde(default = "default_product_status")]
    pub status: String,
}

fn default_product_status() -> String {
    PRODUCT_STATUS_CREATED.to_string()
}

/// Output format for CLI responses
#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
