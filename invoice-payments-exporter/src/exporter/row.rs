//! Typed report cells.

use super::ExportError;
use chrono::{DateTime, FixedOffset, NaiveDate};
use futures::stream::BoxStream;
use rust_decimal::Decimal;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

pub type Row = Vec<Cell>;

/// Lazily produced rows. The first item is the header.
pub type RowStream = BoxStream<'static, Result<Row, ExportError>>;

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(value) => f.write_str(value),
            Cell::Integer(value) => write!(f, "{}", value),
            Cell::Decimal(value) => write!(f, "{}", value),
            Cell::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Cell::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%:z")),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map_or(Cell::Empty, Cell::Text)
    }
}

impl From<Decimal> for Cell {
    fn from(value: Decimal) -> Self {
        Cell::Decimal(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn cells_render_as_plain_text() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(Cell::Empty.to_string(), "");
        assert_eq!(Cell::Integer(3).to_string(), "3");
        assert_eq!(Cell::from(dec!(-10.00)).to_string(), "-10.00");
        assert_eq!(
            Cell::from(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()).to_string(),
            "2021-03-04"
        );
        assert_eq!(
            Cell::DateTime(offset.with_ymd_and_hms(2021, 3, 5, 0, 30, 0).unwrap()).to_string(),
            "2021-03-05 00:30:00+01:00"
        );
    }

    #[test]
    fn missing_text_is_empty() {
        assert!(Cell::from(None::<String>).is_empty());
        assert_eq!(Cell::from(Some("INV-1".to_string())).as_text(), Some("INV-1"));
    }
}
