//! Typed errors for the booking domain.
//!
//! Parse failures are raised while building values from scraped or
//! configured text. Configuration failures abort startup.

use chrono::NaiveDate;
use thiserror::Error;

use crate::activity::ClassTag;

/// A malformed time, window, capacity or day token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid time '{0}', expected hh:mm")]
    Time(String),
    #[error("invalid schedule '{0}', expected 'hh:mm - hh:mm'")]
    Window(String),
    #[error("invalid reservation counter '{0}', expected '(used/total)'")]
    Capacity(String),
    #[error("invalid day '{0}', expected dd/mm/yyyy")]
    Day(String),
}

/// Fatal configuration problems detected before any page is opened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("class '{name}' not defined, must be one of: {}", ClassTag::valid_names())]
    UnknownClass { name: String },
    #[error("no hours configured or incorrect format in 'days'")]
    NoHours,
    #[error("bad day format in 'days': {0}")]
    InvalidDay(ParseError),
    #[error("bad hour format for {day}: {source}")]
    InvalidHour { day: NaiveDate, source: ParseError },
    #[error("day {0} is not configured in 'days'")]
    DayNotWanted(NaiveDate),
    #[error("every configured day is before {0}")]
    NoUpcomingDay(NaiveDate),
}
