#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Oracle credential missing: environment variable '{env_var}' is not set")]
    MissingCredential { env_var: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to render product for '{trend}': {message}")]
    RenderFailed { trend: String, message: String },

    #[error("Memory locked by PID {pid} (reason: {reason})")]
    MemoryLocked { pid: u32, reason: String },

    #[error("Niche label must not be empty")]
    InvalidLabel,

    #[error("Invalid revenue amount {0}: must be finite and non-negative")]
    InvalidRevenue(f64),
}
