use config::shared::ListenerConfig;
use replay::concurrency::shutdown::create_shutdown_channel;
use replay::conversions::ValueFormatter;
use replay::handlers::{IncidentHandler, ReplayHandler, TransactionAggregator};
use replay::pipeline::ContentHandlerPipeline;
use replay::replication::driver::{BinlogDriver, DriverOutcome};
use replay::replication::transport::JsonLinesTransport;
use replay::sink::Sink;
use replay::sink::stdout::StdoutSink;
use replay::statement::StatementBuilder;
use tracing::{error, info, warn};

use crate::error::ListenerResult;

/// Builds the listener pipeline: aggregation, incidents, then replay.
pub fn build_pipeline<D>(config: &ListenerConfig, sink: D) -> ContentHandlerPipeline
where
    D: Sink + Clone + Send + 'static,
{
    let builder = StatementBuilder::new(ValueFormatter::new(&config.formatter));

    let mut pipeline = ContentHandlerPipeline::new();
    pipeline.push_back(TransactionAggregator::new(sink.clone()));
    pipeline.push_back(IncidentHandler::new(sink.clone()));
    pipeline.push_back(ReplayHandler::with_builder(builder, sink));
    pipeline
}

/// Runs the listener until the stream ends, a termination marker is seen or Ctrl+C is pressed.
pub async fn start_listener(config: ListenerConfig) -> ListenerResult<DriverOutcome> {
    let driver = BinlogDriver::new(&config.driver);
    let mut pipeline = build_pipeline(&config, StdoutSink::new());
    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();

    let shutdown_handle = tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {:?}", e);
            return;
        }

        info!("Ctrl+C received, shutting down listener...");
        if let Err(e) = shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal: {:?}", e);
        }
    });

    let start_position = config.source.start_position;
    let result = match &config.source.path {
        Some(path) => match JsonLinesTransport::open(path, start_position).await {
            Ok(mut transport) => driver.run(&mut transport, &mut pipeline, shutdown_rx).await,
            Err(err) => Err(err),
        },
        None => {
            let mut transport = JsonLinesTransport::stdin(start_position);
            driver.run(&mut transport, &mut pipeline, shutdown_rx).await
        }
    };

    // The signal task outlives the stream when the stream ends on its own.
    shutdown_handle.abort();
    let _ = shutdown_handle.await;

    let outcome = result?;
    info!(
        reason = ?outcome.reason,
        events_processed = outcome.events_processed,
        "listener finished"
    );

    Ok(outcome)
}
