use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{EsErr, Result, filter::FilterState};

/// Everything needed to resume training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub weights: Vec<f32>,
    pub filter: FilterState,
    pub episodes_so_far: usize,
}

impl Checkpoint {
    /// Writes this checkpoint as json to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self)
            .map_err(|e| EsErr::Checkpoint(format!("failed to serialize checkpoint: {e}")))?;

        fs::write(path, json)
            .map_err(|e| EsErr::Checkpoint(format!("failed to write {}: {e}", path.display())))
    }

    /// Reads a checkpoint back from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read(path)
            .map_err(|e| EsErr::Checkpoint(format!("failed to read {}: {e}", path.display())))?;

        serde_json::from_slice(&json)
            .map_err(|e| EsErr::Checkpoint(format!("invalid checkpoint {}: {e}", path.display())))
    }
}
