//! Shutdown signalling between the process and the stream driver.
//!
//! The signal carries no data. Sending it tells every receiver to stop waiting for the next
//! event and wind down.

use tokio::sync::watch;

/// Transmitter side of the shutdown channel.
pub type ShutdownTx = watch::Sender<()>;

/// Receiver side of the shutdown channel.
///
/// A receiver created by [`create_shutdown_channel`] starts with the initial value marked as
/// seen, so only a later [`ShutdownTx::send`] wakes it.
pub type ShutdownRx = watch::Receiver<()>;

/// Creates a new shutdown channel.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    watch::channel(())
}
