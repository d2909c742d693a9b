//! Binlog listener binary.
//!
//! Reads decoded binlog events, one JSON document per line, from a file or standard input.
//! Every committed transaction unit is replayed as SQL statements on standard output, with
//! diagnostics for incidents and rows that cannot be replayed. Logs go to standard error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_listener_config;
use crate::core::start_listener;
use crate::error::{ListenerError, ListenerResult};

mod config;
mod core;
mod error;

/// Replays MySQL binlog row events as SQL statements.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// File of decoded events. Standard input is read when neither this nor the configuration
    /// names a file.
    #[arg(long, value_name = "PATH")]
    source: Option<PathBuf>,

    /// Binlog position to start from. Earlier events are skipped.
    #[arg(long, value_name = "POSITION")]
    start_position: Option<u64>,

    /// Directory holding `base` and environment configuration files.
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> ListenerResult<()> {
    let mut listener_config = load_listener_config(args.config_dir.as_deref())?;
    if let Some(source) = args.source {
        listener_config.source.path = Some(source);
    }
    if let Some(start_position) = args.start_position {
        listener_config.source.start_position = start_position;
    }
    listener_config.validate().map_err(ListenerError::config)?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(start_listener(listener_config));

    // A pending read on standard input would otherwise keep the process alive.
    runtime.shutdown_background();

    if let Err(err) = result {
        error!("{err}");
        return Err(err);
    }

    Ok(())
}
