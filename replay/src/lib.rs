//! Replay of MySQL binlog change streams.
//!
//! Events flow from a [`replication::transport::Transport`] through a
//! [`pipeline::ContentHandlerPipeline`]. The [`handlers::TransactionAggregator`] groups table map
//! and rows events into transaction units, the [`handlers::ReplayHandler`] reconstructs one
//! statement per row change and writes it to a [`sink::Sink`], and the
//! [`replication::driver::BinlogDriver`] runs the loop.

pub mod concurrency;
pub mod conversions;
pub mod error;
pub mod handlers;
mod macros;
pub mod pipeline;
pub mod replication;
pub mod schema;
pub mod sink;
pub mod statement;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
