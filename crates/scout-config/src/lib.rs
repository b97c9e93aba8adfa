//! Configuration loading and validation (`~/.config/niche-scout/config.toml`).

pub mod config;
pub mod oracle;
pub mod paths;
pub mod validate;

pub use config::{CycleConfig, MemoryConfig, RenderConfig, ScoutConfig, TrendsConfig};
pub use oracle::OracleConfig;
pub use validate::validate_config;
