use std::path::PathBuf;

use crate::error::StoreError;
use crate::store::StoreState;

/// Local JSON state file.
pub struct StatePersistence {
    pub local_path: PathBuf,
}

impl StatePersistence {
    pub fn new(local_path: impl Into<PathBuf>) -> Self {
        Self {
            local_path: local_path.into(),
        }
    }

    /// Write state to disk atomically (tmp + rename).
    pub fn flush(&self, state: &StoreState) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(state)?;
        if let Some(parent) = self.local_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = self.local_path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &self.local_path)?;

        tracing::debug!(path = %self.local_path.display(), "state flushed to local disk");
        Ok(())
    }

    /// Load state, or return an empty store if the file does not exist yet.
    pub fn load(&self) -> Result<StoreState, StoreError> {
        if self.local_path.exists() {
            let json = std::fs::read(&self.local_path)?;
            let state: StoreState = serde_json::from_slice(&json)?;
            tracing::debug!(path = %self.local_path.display(), "state loaded from local disk");
            return Ok(state);
        }

        tracing::debug!(path = %self.local_path.display(), "no existing state found, starting fresh");
        Ok(StoreState::default())
    }
}
