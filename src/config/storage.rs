//! Storage configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Without a data directory the engine keeps everything in memory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn trials_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("trials"))
    }

    pub fn commissions_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join("commissions"))
    }
}
