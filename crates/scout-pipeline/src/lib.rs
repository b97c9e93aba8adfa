//! Decision-and-memory pipeline: one bounded cycle from trend candidates to
//! recorded decisions and rendered products.

pub mod creation;
pub mod cycle;
pub mod decision;
pub mod render;
pub mod trends;

pub use creation::{Evaluated, create_products, eligible_for_creation};
pub use cycle::{Cycle, CycleReport, CycleSettings, CycleSummary};
pub use decision::{CONTEXT_WINDOW, context_summary, decide};
pub use render::{MarkdownRenderer, Renderer, destination_name};
pub use trends::{StaticTrendSource, TrendSource};
