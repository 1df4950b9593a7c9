//! Configuration types for the command manager

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CommandError, Result};

/// How much of the stacks the manager logs after each operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebugMode {
    /// Nothing is logged
    #[default]
    NoDebug,
    /// Stack dump with command names only
    Debug,
    /// Stack dump including every command's arguments
    VerboseDebug,
}

/// Command manager settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ManagerConfig {
    /// Stack dump verbosity
    pub debug_mode: DebugMode,
    /// Maximum number of undo entries kept (oldest dropped first).
    /// `None` keeps everything.
    pub max_undo_depth: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            debug_mode: DebugMode::NoDebug,
            max_undo_depth: None,
        }
    }
}

impl ManagerConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: ManagerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        log::info!("Loaded command manager config from {:?}", path.as_ref());
        Ok(config)
    }

    /// Reject settings the manager cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.max_undo_depth == Some(0) {
            return Err(CommandError::Config(
                "maxUndoDepth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
