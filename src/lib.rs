//! CCB Booker Library
//!
//! This module exposes the core components of the class booker: the value
//! model for scraped activities, the booking filter built from the
//! configuration, and the WebDriver-backed site automation.

pub mod activity;
pub mod booking;
pub mod capacity;
pub mod config;
pub mod error;
pub mod filter;
pub mod schedule;
pub mod site;
pub mod traits;
pub mod webdriver;

// Re-export commonly used types
pub use activity::{ActivityClass, ActivityRecord, BookingOutcome, ClassTag, ControlRef};
pub use booking::{BookingAttempt, RunSummary, book_day, select_day};
pub use capacity::CapacityCounter;
pub use config::{AppConfig, Credentials};
pub use error::{ConfigError, ParseError};
pub use filter::{BookingFilter, parse_day};
pub use schedule::{TimeOfDay, TimeWindow};
pub use site::CcbSite;
pub use traits::{Clock, ControlCell, MockClock, MockPage, PageAutomation, RawRow, SystemClock};
pub use webdriver::{Session, WebDriverClient, WebDriverError};
