use std::{fs, path::{Path, PathBuf}};

use es_core::EsConfig;
use serde::{Deserialize, Serialize};

use crate::{CoordinatorError, Result};

/// Everything the coordinator binary needs to run a training session.
///
/// Without `worker_addrs` the workers run in process, `es.num_workers` of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default)]
    pub worker_addrs: Vec<String>,
    pub iterations: usize,
    /// Where to write a checkpoint after every iteration.
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,
    /// A checkpoint to resume from.
    #[serde(default)]
    pub restore: Option<PathBuf>,
    #[serde(default)]
    pub es: EsConfig,
}

impl TrainingConfig {
    /// Reads and validates a json configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            CoordinatorError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;

        let config: Self = serde_json::from_str(&json)
            .map_err(|e| CoordinatorError::InvalidConfig(format!("{}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks every option once, before connecting to anything.
    pub fn validate(&self) -> Result<()> {
        self.es.validate()?;

        if self.iterations == 0 {
            return Err(CoordinatorError::InvalidConfig(
                "`iterations` must be > 0".into(),
            ));
        }

        if !self.worker_addrs.is_empty() && self.worker_addrs.len() != self.es.num_workers {
            return Err(CoordinatorError::InvalidConfig(format!(
                "{} worker addresses given for `num_workers` = {}",
                self.worker_addrs.len(),
                self.es.num_workers
            )));
        }

        Ok(())
    }
}
