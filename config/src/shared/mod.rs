//! Shared configuration types for the binlog listener.

mod base;
mod driver;
mod formatter;
mod listener;
mod source;

pub use base::ValidationError;
pub use driver::DriverConfig;
pub use formatter::{FormatterConfig, QuotePolicy};
pub use listener::ListenerConfig;
pub use source::SourceConfig;
