use config::shared::DriverConfig;
use tracing::{debug, error, info};

use crate::concurrency::shutdown::ShutdownRx;
use crate::error::ReplayResult;
use crate::pipeline::ContentHandlerPipeline;
use crate::replication::transport::Transport;
use crate::types::{Event, EventPayload};

/// Why the driver stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A query containing the carried termination marker reached the end of the pipeline.
    TerminationMarker(String),
    /// The transport has no more events.
    SourceExhausted,
    /// The shutdown signal was received.
    Shutdown,
}

/// Summary of a completed driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOutcome {
    pub reason: StopReason,
    /// Number of events received from the transport.
    pub events_processed: u64,
}

/// Pulls events from a [`Transport`] and dispatches them through a pipeline until the stream
/// ends, a termination marker is seen or shutdown is requested.
#[derive(Debug, Clone)]
pub struct BinlogDriver {
    termination_markers: Vec<String>,
}

impl BinlogDriver {
    pub fn new(config: &DriverConfig) -> Self {
        Self {
            termination_markers: config.termination_markers.clone(),
        }
    }

    /// Runs the stream loop.
    ///
    /// Waiting for the next event races the shutdown signal. An event already received is always
    /// dispatched to completion before the signal is looked at again. The pipeline is shut down
    /// on every exit path. Transport failures end the loop and are returned to the caller.
    pub async fn run<T>(
        &self,
        transport: &mut T,
        pipeline: &mut ContentHandlerPipeline,
        mut shutdown_rx: ShutdownRx,
    ) -> ReplayResult<DriverOutcome>
    where
        T: Transport,
    {
        info!(
            handlers = pipeline.len(),
            termination_markers = ?self.termination_markers,
            "starting binlog driver"
        );

        let mut events_processed = 0_u64;
        let mut shutdown_open = true;

        let reason = loop {
            let next = tokio::select! {
                biased;

                changed = shutdown_rx.changed(), if shutdown_open => {
                    if changed.is_ok() {
                        info!("shutdown requested, stopping binlog driver");
                        break StopReason::Shutdown;
                    }

                    // Every sender is gone, shutdown can no longer be requested.
                    debug!("shutdown channel closed");
                    shutdown_open = false;
                    continue;
                }

                next = transport.next_event() => next,
            };

            let event = match next {
                Ok(Some(event)) => event,
                Ok(None) => {
                    info!("event source exhausted");
                    break StopReason::SourceExhausted;
                }
                Err(err) => {
                    error!(error = %err.summary(), events_processed, "event source failed");
                    pipeline.shutdown();
                    return Err(err);
                }
            };
            events_processed += 1;

            let Some(event) = pipeline.dispatch(event) else {
                continue;
            };

            log_event(&event);
            if let Some(marker) = self.termination_marker(&event) {
                info!(marker, "termination marker found");
                break StopReason::TerminationMarker(marker.to_string());
            }
        };

        pipeline.shutdown();
        info!(events_processed, reason = ?reason, "binlog driver stopped");

        Ok(DriverOutcome {
            reason,
            events_processed,
        })
    }

    fn termination_marker(&self, event: &Event) -> Option<&str> {
        let query = event.as_query()?;
        self.termination_markers
            .iter()
            .find(|marker| query.query.contains(marker.as_str()))
            .map(String::as_str)
    }
}

fn log_event(event: &Event) {
    info!(
        "MainLoop: Event type: [{}] length: {} next pos: {}",
        event.event_type(),
        event.header.event_length,
        event.header.next_position
    );

    match &event.payload {
        EventPayload::Query(query) => info!("query= {} db= {}", query.query, query.schema),
        EventPayload::Rotate(rotate) => {
            info!("filename= {} pos= {}", rotate.next_binlog, rotate.position)
        }
        _ => {}
    }
}
