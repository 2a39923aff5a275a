//! Sled-backed runtime store

use std::path::Path;

use super::persistence::{PersistenceError, RuntimeStore};

/// Key of the runtime counter inside the namespace tree.
pub const RUNTIME_KEY: &[u8] = b"runtime";

/// Runtime counter in a sled tree named after the namespace, stored as a
/// big-endian `u64`. Every save is flushed before returning.
pub struct SledRuntimeStore {
    _db: sled::Db,
    tree: sled::Tree,
}

impl SledRuntimeStore {
    /// Open or create the database and the namespace tree.
    pub fn open<P: AsRef<Path>>(path: P, namespace: &str) -> Result<Self, PersistenceError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let tree = db.open_tree(namespace)?;

        tracing::info!(path = ?path_ref, namespace, "Runtime store opened");

        Ok(Self { _db: db, tree })
    }
}

impl RuntimeStore for SledRuntimeStore {
    fn load_runtime_seconds(&self) -> Result<u64, PersistenceError> {
        match self.tree.get(RUNTIME_KEY)? {
            None => Ok(0),
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_ref()
                    .try_into()
                    .map_err(|_| PersistenceError::Corrupt(bytes.len()))?;
                Ok(u64::from_be_bytes(raw))
            }
        }
    }

    fn save_runtime_seconds(&self, seconds: u64) -> Result<(), PersistenceError> {
        self.tree.insert(RUNTIME_KEY, seconds.to_be_bytes().as_slice())?;
        self.tree.flush()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
