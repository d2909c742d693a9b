//! Concurrency primitives used by the stream driver.

pub mod shutdown;
