mod api_client;
mod client;
mod payload;
mod prompts;
mod scripted;

pub use api_client::{ApiClient, ModelRotator};
pub use client::{OracleClient, OracleTransport};
pub use payload::{Reply, extract_payload};
pub use scripted::ScriptedTransport;
