use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{DriverConfig, FormatterConfig, SourceConfig, ValidationError};

/// Complete configuration for the listener service.
///
/// Every section has defaults, so an empty base file yields a listener reading standard input
/// and stopping on the default termination markers.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Event stream source.
    #[serde(default)]
    pub source: SourceConfig,
    /// Driver loop settings.
    #[serde(default)]
    pub driver: DriverConfig,
    /// Value rendering settings.
    #[serde(default)]
    pub formatter: FormatterConfig,
}

impl ListenerConfig {
    /// Validates the complete listener configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.driver.validate()?;
        self.formatter.validate()
    }
}

impl Config for ListenerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["driver.termination_markers"];
}
