use anyhow::Result;
use async_trait::async_trait;
use scout_core::{Candidate, ContentDraft, Decision, Judgment, Section};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::payload::{Reply, extract_payload};
use crate::prompts;

/// Request/reply channel to the language-model oracle.
#[async_trait]
pub trait OracleTransport: Send + Sync {
    /// Send one prompt pair and return the oracle's free-text reply.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Evaluation and generation on top of an [`OracleTransport`].
///
/// Neither operation returns an error: transport and parse failures are
/// logged and replaced by a fallback value so the cycle keeps going.
#[derive(Debug)]
pub struct OracleClient<T> {
    transport: T,
}

impl<T: OracleTransport> OracleClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Score `candidate`; falls back to `{monitor, 0.5}` on any failure.
    pub async fn evaluate(&self, candidate: &Candidate, context_summary: &str) -> Judgment {
        let prompt = prompts::evaluate_prompt(candidate, context_summary);
        let reply = match self
            .transport
            .complete(prompts::EVALUATE_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(reply) => reply,
            Err(error) => {
                let detail = format!("{error:#}");
                warn!(trend = %candidate.keyword, error = %detail, "oracle evaluation failed");
                return Judgment::fallback(format!("Fallback: oracle unavailable ({error})"));
            }
        };
        debug!(trend = %candidate.keyword, %reply, "oracle evaluation reply");

        match extract_payload::<RawJudgment>(&reply) {
            Reply::Parsed(raw) => match raw.into_judgment() {
                Ok(judgment) => judgment,
                Err(problem) => {
                    warn!(trend = %candidate.keyword, %problem, "oracle judgment rejected");
                    Judgment::fallback(format!("Fallback: {problem}"))
                }
            },
            Reply::Malformed(_) => {
                warn!(trend = %candidate.keyword, "oracle evaluation reply had no JSON payload");
                Judgment::fallback("Fallback: could not parse oracle reply")
            }
        }
    }

    /// Generate product content; `None` means no product this cycle.
    pub async fn generate_content(
        &self,
        trend: &str,
        pricing_hint: Option<f64>,
    ) -> Option<ContentDraft> {
        let prompt = prompts::generate_prompt(trend, pricing_hint);
        let reply = match self
            .transport
            .complete(prompts::GENERATE_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(reply) => reply,
            Err(error) => {
                let detail = format!("{error:#}");
                warn!(%trend, error = %detail, "oracle content generation failed");
                return None;
            }
        };
        debug!(%trend, reply_len = reply.len(), "oracle content reply");

        let draft = match extract_payload::<ContentDraft>(&reply) {
            Reply::Parsed(draft) => draft,
            Reply::Malformed(_) => {
                warn!(%trend, "oracle content reply had no JSON payload");
                return None;
            }
        };
        let draft = tidy_draft(draft);
        if draft.title.is_empty() || draft.sections.is_empty() {
            warn!(%trend, "oracle content draft is missing a title or sections");
            return None;
        }
        Some(draft)
    }
}

/// Judgment as the oracle writes it, before validation.
#[derive(Debug, Deserialize)]
struct RawJudgment {
    decision: String,
    confidence: Value,
    #[serde(default, alias = "reason")]
    reasoning: String,
    #[serde(default)]
    estimated_price: Option<Value>,
    #[serde(default)]
    differentiator: Option<String>,
    #[serde(default)]
    product_type: Option<String>,
}

impl RawJudgment {
    fn into_judgment(self) -> Result<Judgment, String> {
        let decision: Decision = self.decision.parse()?;
        let confidence = lenient_number(&self.confidence)
            .filter(|confidence| confidence.is_finite())
            .ok_or_else(|| format!("oracle confidence {} is not a finite number", self.confidence))?;
        // Percent-style confidences (e.g. 85) are scaled down.
        let confidence = if confidence > 1.0 && confidence <= 100.0 {
            confidence / 100.0
        } else {
            confidence
        };

        let mut judgment = Judgment::new(decision, confidence, self.reasoning.trim());
        judgment.estimated_price = self.estimated_price.as_ref().and_then(lenient_price);
        judgment.differentiator = non_empty(self.differentiator);
        judgment.product_type = non_empty(self.product_type);
        Ok(judgment)
    }
}

/// Accept `0.85`, `"0.85"`, `"$9.99"` and `"85%"`.
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text
            .trim()
            .trim_start_matches('$')
            .trim_end_matches('%')
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}

fn lenient_price(value: &Value) -> Option<f64> {
    lenient_number(value).filter(|price| price.is_finite() && *price >= 0.0)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn tidy_draft(draft: ContentDraft) -> ContentDraft {
    ContentDraft {
        title: draft.title.trim().to_string(),
        subtitle: draft.subtitle.trim().to_string(),
        author: draft.author.trim().to_string(),
        sections: draft
            .sections
            .into_iter()
            .filter(|section| !section.heading.trim().is_empty() || !section.body.trim().is_empty())
            .map(|section| Section {
                heading: section.heading.trim().to_string(),
                body: section.body.trim().to_string(),
            })
            .collect(),
    }
}
