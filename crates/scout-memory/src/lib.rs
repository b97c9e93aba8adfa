mod backend;
mod record;
mod store;

pub use backend::{InMemoryBackend, JsonFileBackend, StateBackend};
pub use record::{MemoryRecord, MemoryStats};
pub use store::MemoryStore;
