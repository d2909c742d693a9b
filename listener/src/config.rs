use std::path::Path;

use config::shared::ListenerConfig;
use config::{load_config, load_config_from};

use crate::error::{ListenerError, ListenerResult};

/// Loads the listener configuration.
///
/// Reads from `config_dir` when given, otherwise from the `configuration` directory under the
/// working directory. Validation is left to the caller so command line overrides are checked too.
pub fn load_listener_config(config_dir: Option<&Path>) -> ListenerResult<ListenerConfig> {
    let config = match config_dir {
        Some(dir) => load_config_from::<ListenerConfig>(dir),
        None => load_config::<ListenerConfig>(),
    };

    config.map_err(ListenerError::config)
}
