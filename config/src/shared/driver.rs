use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Settings for the stream driver loop.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct DriverConfig {
    /// Query fragments that stop the listener once observed in the stream.
    ///
    /// The driver stops after dispatching a query event whose statement contains any of these
    /// markers. An empty list keeps the listener running until the source is exhausted.
    #[serde(default = "default_termination_markers")]
    pub termination_markers: Vec<String>,
}

impl DriverConfig {
    /// Markers recognised when none are configured.
    pub const DEFAULT_TERMINATION_MARKERS: &'static [&'static str] = &[
        "DROP TABLE REPLICATION_LISTENER",
        "DROP TABLE `REPLICATION_LISTENER`",
    ];

    /// Validates the driver configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self
            .termination_markers
            .iter()
            .any(|marker| marker.trim().is_empty())
        {
            return Err(ValidationError::BlankTerminationMarker);
        }

        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            termination_markers: default_termination_markers(),
        }
    }
}

fn default_termination_markers() -> Vec<String> {
    DriverConfig::DEFAULT_TERMINATION_MARKERS
        .iter()
        .map(|marker| marker.to_string())
        .collect()
}
