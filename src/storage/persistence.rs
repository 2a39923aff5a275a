//! RuntimeStore trait: durable home of the accumulated runtime counter
//!
//! - `SledRuntimeStore`: on-disk store, flushed on every save
//! - `InMemoryRuntimeStore`: for tests and `--ephemeral` runs

/// Trait for pluggable runtime counter backends.
///
/// Saves are "last write wins": writing the same value twice is harmless and
/// a crash between two saves loses at most the second one.
pub trait RuntimeStore: Send + Sync {
    /// Stored runtime in seconds, 0 when nothing was ever saved.
    fn load_runtime_seconds(&self) -> Result<u64, PersistenceError>;

    fn save_runtime_seconds(&self, seconds: u64) -> Result<(), PersistenceError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("corrupt runtime value: expected 8 bytes, found {0}")]
    Corrupt(usize),
}

impl From<sled::Error> for PersistenceError {
    fn from(e: sled::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

/// In-memory runtime store. Not durable.
///
/// Keeps every saved value so tests can check when writes happened.
#[derive(Default)]
pub struct InMemoryRuntimeStore {
    saves: std::sync::RwLock<Vec<u64>>,
    initial: u64,
}

impl InMemoryRuntimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start as if `seconds` had been saved by a previous run.
    pub fn with_initial(seconds: u64) -> Self {
        Self {
            saves: std::sync::RwLock::new(Vec::new()),
            initial: seconds,
        }
    }

    /// Every value saved so far, oldest first.
    pub fn saved_values(&self) -> Vec<u64> {
        self.saves.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl RuntimeStore for InMemoryRuntimeStore {
    fn load_runtime_seconds(&self) -> Result<u64, PersistenceError> {
        let saves = self
            .saves
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(saves.last().copied().unwrap_or(self.initial))
    }

    fn save_runtime_seconds(&self, seconds: u64) -> Result<(), PersistenceError> {
        self.saves
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?
            .push(seconds);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
