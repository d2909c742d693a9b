//! Rendering of decoded column values as statement text.

pub mod hex;
pub mod text;
pub mod value;

pub use text::{CellConverter, CellText, DefaultCellConverter};
pub use value::ValueFormatter;
