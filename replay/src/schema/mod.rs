//! Per-transaction bookkeeping of table definitions.

pub mod directory;

pub use directory::TableDirectory;
