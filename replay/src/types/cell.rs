use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A MySQL `TIME` value.
///
/// Unlike a wall-clock time, a `TIME` value may be negative and may exceed 24 hours, so it is
/// kept as its components instead of a [`chrono::NaiveTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeValue {
    pub negative: bool,
    pub hours: u32,
    pub minutes: u8,
    pub seconds: u8,
    #[serde(default)]
    pub microseconds: u32,
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )?;
        if self.microseconds > 0 {
            write!(f, ".{:06}", self.microseconds)?;
        }

        Ok(())
    }
}

/// A decoded column value of a row image.
///
/// [`Cell::Null`] is the null flag of the column. The variant carried for a non-null value
/// depends on the column type declared by the table map, see
/// [`crate::conversions::text::DefaultCellConverter`] for the accepted pairings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(BigDecimal),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(TimeValue),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Year(u16),
    Json(serde_json::Value),
    /// 1-based index into the column's enum members.
    Enum(u16),
    /// Bitmask of the column's set members.
    Set(u64),
    Bit(Vec<u8>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Short name of the variant, used in conversion diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::I64(_) => "i64",
            Cell::U64(_) => "u64",
            Cell::F32(_) => "f32",
            Cell::F64(_) => "f64",
            Cell::Decimal(_) => "decimal",
            Cell::String(_) => "string",
            Cell::Bytes(_) => "bytes",
            Cell::Date(_) => "date",
            Cell::Time(_) => "time",
            Cell::DateTime(_) => "datetime",
            Cell::Timestamp(_) => "timestamp",
            Cell::Year(_) => "year",
            Cell::Json(_) => "json",
            Cell::Enum(_) => "enum",
            Cell::Set(_) => "set",
            Cell::Bit(_) => "bit",
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::I64(value)
    }
}

impl<T> From<Option<T>> for Cell
where
    T: Into<Cell>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_value_display() {
        let time = TimeValue {
            negative: true,
            hours: 838,
            minutes: 59,
            seconds: 1,
            microseconds: 0,
        };
        assert_eq!(time.to_string(), "-838:59:01");

        let time = TimeValue {
            negative: false,
            hours: 7,
            minutes: 5,
            seconds: 9,
            microseconds: 120,
        };
        assert_eq!(time.to_string(), "07:05:09.000120");
    }

    #[test]
    fn test_option_into_cell() {
        assert_eq!(Cell::from(None::<i64>), Cell::Null);
        assert_eq!(Cell::from(Some("a")), Cell::String("a".to_string()));
    }

    #[test]
    fn test_cell_json_shape() {
        let cell: Cell = serde_json::from_str(r#"{"I64":7}"#).unwrap();
        assert_eq!(cell, Cell::I64(7));
        let cell: Cell = serde_json::from_str(r#""Null""#).unwrap();
        assert!(cell.is_null());
    }
}
