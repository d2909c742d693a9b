//! Event, row and schema types of the change stream.

mod cell;
mod event;
mod row;
mod schema;
mod transaction;

pub use cell::*;
pub use event::*;
pub use row::*;
pub use schema::*;
pub use transaction::*;
