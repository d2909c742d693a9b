//! Configuration loading and shared configuration types for the binlog listener.
//!
//! Configuration is layered: a base file, an environment-specific file selected through
//! `APP_ENVIRONMENT`, and `APP_`-prefixed environment variable overrides.

pub mod environment;
pub mod load;
pub mod shared;

pub use load::{Config, LoadConfigError, load_config, load_config_from};
