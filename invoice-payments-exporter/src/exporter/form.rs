//! Exporter options and lenient date parsing.

use super::ExportError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%d.%m.%Y", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Date,
}

/// Description of one exporter option, for rendering a form.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    /// Message id of the label.
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub widget_class: &'static str,
}

impl FormField {
    pub fn optional_date(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Date,
            required: false,
            widget_class: "datepickerfield",
        }
    }
}

/// A date option as submitted: already a date, or text still to be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Date(NaiveDate),
    Text(String),
}

impl DateInput {
    /// Blank text counts as not given.
    pub fn resolve(&self) -> Result<Option<NaiveDate>, ExportError> {
        match self {
            DateInput::Date(date) => Ok(Some(*date)),
            DateInput::Text(text) if text.trim().is_empty() => Ok(None),
            DateInput::Text(text) => parse_date(text).map(Some),
        }
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        DateInput::Text(text.to_string())
    }
}

/// Options of the date-filterable exporters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportForm {
    pub date_from: Option<DateInput>,
    pub date_to: Option<DateInput>,
}

impl ExportForm {
    pub fn between(date_from: impl Into<DateInput>, date_to: impl Into<DateInput>) -> Self {
        Self {
            date_from: Some(date_from.into()),
            date_to: Some(date_to.into()),
        }
    }

    /// Resolved `(date_from, date_to)`.
    pub fn date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), ExportError> {
        let resolve = |input: &Option<DateInput>| match input {
            Some(input) => input.resolve(),
            None => Ok(None),
        };
        Ok((resolve(&self.date_from)?, resolve(&self.date_to)?))
    }
}

/// Parse a date written in any of the common notations. Timestamps are
/// accepted and cut down to their calendar date as written.
pub fn parse_date(input: &str) -> Result<NaiveDate, ExportError> {
    let text = input.trim();

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    {
        return Ok(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|ts| ts.date())
        .ok_or_else(|| ExportError::InvalidDate(input.to_string()))
}
