//! Logging setup shared by the listener binary and the test suites.

pub mod tracing;
