use chrono::{DateTime, Utc};

use crate::bail;
use crate::conversions::hex::encode_hex_literal;
use crate::error::{ErrorKind, ReplayResult};
use crate::types::{Cell, ColumnType};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Text rendered for one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellText {
    /// The value itself. Quoted by the formatter when the column holds text.
    Plain(String),
    /// A complete SQL literal that is always written bare, such as `0x00ff`.
    Literal(String),
}

/// Capability to render a typed column value as text.
///
/// Implementations decide how each [`Cell`] is written for a declared [`ColumnType`]. Quoting
/// is not their concern, see [`crate::conversions::value::ValueFormatter`].
pub trait CellConverter {
    /// Renders `cell` as the text of a value of `column_type`.
    ///
    /// Fails with [`ErrorKind::ConversionError`] when the column type cannot hold the cell or
    /// has no textual form.
    fn to_text(&self, column_type: ColumnType, cell: &Cell) -> ReplayResult<CellText>;
}

/// Default [`CellConverter`] producing MySQL literal text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCellConverter;

impl CellConverter for DefaultCellConverter {
    fn to_text(&self, column_type: ColumnType, cell: &Cell) -> ReplayResult<CellText> {
        use ColumnType as T;

        let text = match (column_type, cell) {
            (T::Geometry | T::TypedArray | T::Unknown, _) => bail!(
                ErrorKind::ConversionError,
                "Column type has no text representation",
                format!("{column_type:?} column")
            ),
            (_, Cell::Null) => "NULL".to_string(),
            (t, Cell::I64(value)) if t.is_integer() || t == T::Year => value.to_string(),
            (t, Cell::U64(value)) if t.is_integer() || t == T::Bit => value.to_string(),
            (T::Float | T::Double, Cell::F32(value)) => {
                ensure_finite(column_type, f64::from(*value))?;
                value.to_string()
            }
            (T::Float | T::Double, Cell::F64(value)) => {
                ensure_finite(column_type, *value)?;
                value.to_string()
            }
            (T::Decimal | T::NewDecimal, Cell::Decimal(value)) => value.to_string(),
            (T::Date | T::NewDate, Cell::Date(value)) => value.format(DATE_FORMAT).to_string(),
            (T::Time | T::Time2, Cell::Time(value)) => value.to_string(),
            (T::DateTime | T::DateTime2, Cell::DateTime(value)) => {
                value.format(DATETIME_FORMAT).to_string()
            }
            (T::Timestamp | T::Timestamp2, Cell::Timestamp(value)) => epoch_text(value),
            (T::Year, Cell::Year(value)) => value.to_string(),
            (T::Json, Cell::Json(value)) => value.to_string(),
            (T::Enum, Cell::Enum(value)) => value.to_string(),
            (T::Set, Cell::Set(value)) => value.to_string(),
            (T::Bit, Cell::Bit(value)) => return Ok(CellText::Literal(encode_hex_literal(value))),
            (T::Json | T::Enum | T::Set, Cell::String(value)) => value.clone(),
            (t, Cell::String(value)) if holds_characters(t) => value.clone(),
            // Binary column data is kept byte for byte as a hex literal.
            (t, Cell::Bytes(value)) if holds_characters(t) => match std::str::from_utf8(value) {
                Ok(text) => text.to_string(),
                Err(_) => return Ok(CellText::Literal(encode_hex_literal(value))),
            },
            (_, cell) => bail!(
                ErrorKind::ConversionError,
                "Cell does not match column type",
                format!(
                    "{} value for a {column_type:?} column",
                    cell.variant_name()
                )
            ),
        };

        Ok(CellText::Plain(text))
    }
}

fn holds_characters(column_type: ColumnType) -> bool {
    column_type.is_text() || column_type == ColumnType::String
}

fn ensure_finite(column_type: ColumnType, value: f64) -> ReplayResult<()> {
    if !value.is_finite() {
        bail!(
            ErrorKind::ConversionError,
            "Floating point value is not finite",
            format!("{value} for a {column_type:?} column")
        );
    }

    Ok(())
}

/// Timestamps are written as seconds since the epoch, with microseconds when present.
///
/// The sign applies to the whole value, so half a second before the epoch is `-0.500000`.
fn epoch_text(value: &DateTime<Utc>) -> String {
    let total = value.timestamp_micros();
    let sign = if total < 0 { "-" } else { "" };
    let seconds = total.unsigned_abs() / 1_000_000;
    let micros = total.unsigned_abs() % 1_000_000;
    if micros == 0 {
        format!("{sign}{seconds}")
    } else {
        format!("{sign}{seconds}.{micros:06}")
    }
}
