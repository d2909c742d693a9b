use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the listener reads its event stream from.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Path of a captured JSON-lines event stream. Standard input is used when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Stream position to start reading from.
    ///
    /// Events that begin before this position are skipped. The default skips the 4-byte
    /// magic header that opens every binary log file.
    #[serde(default = "default_start_position")]
    pub start_position: u64,
}

impl SourceConfig {
    /// Default start position, right after the binary log magic header.
    pub const DEFAULT_START_POSITION: u64 = 4;
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            start_position: default_start_position(),
        }
    }
}

fn default_start_position() -> u64 {
    SourceConfig::DEFAULT_START_POSITION
}
