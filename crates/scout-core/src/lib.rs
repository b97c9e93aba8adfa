//! Shared domain types and error taxonomy for niche-scout.

pub mod error;
pub mod types;

pub use error::AppError;
pub use types::{
    Candidate, Competition, ContentDraft, Decision, DecisionRecord, Judgment, OutputFormat,
    PRODUCT_STATUS_CREATED, ProductRecord, Section,
};
