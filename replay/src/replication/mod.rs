//! Consumption of the change stream.
//!
//! - [`transport`] yields decoded events from a source.
//! - [`driver`] pulls events from a transport and pushes them through the handler pipeline.

pub mod driver;
pub mod transport;
