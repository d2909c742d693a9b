//! Content handlers of the listener pipeline.
//!
//! The usual order is [`transaction::TransactionAggregator`], then
//! [`incident::IncidentHandler`], then [`replay::ReplayHandler`].

use tracing::error;

use crate::sink::{Output, Sink};

pub mod incident;
pub mod replay;
pub mod transaction;

pub use incident::IncidentHandler;
pub use replay::ReplayHandler;
pub use transaction::TransactionAggregator;

/// Writes an output to the sink, logging instead of failing when the sink rejects it.
fn emit<D>(sink: &D, output: impl Into<Output>)
where
    D: Sink,
{
    if let Err(err) = sink.write_output(output.into()) {
        error!(sink = D::name(), error = %err.summary(), "failed to write output");
    }
}
