//! Abstractions for time and the booking website to enable testing.
//!
//! This module provides traits for:
//! - `Clock`: Abstracting the current date for deterministic day selection
//! - `PageAutomation`: Abstracting the browser session that logs in, scrapes
//!   the activities table and clicks reserve controls

use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use chrono::{DateTime, Local, NaiveDate};

use crate::{activity::ControlRef, config::Credentials};

// ==================== Clock Trait ====================

/// Trait for abstracting time access.
pub trait Clock: Send + Sync {
    /// Get the current time in the local timezone.
    fn now_local(&self) -> DateTime<Local>;

    /// Today's date in the local timezone.
    fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }
}

/// System clock implementation using real time.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Mock clock for testing with controllable time.
#[derive(Debug, Clone)]
pub struct MockClock {
    time: Arc<Mutex<DateTime<Local>>>,
}

impl MockClock {
    /// Create a new mock clock set to the given local time.
    pub fn new(time: DateTime<Local>) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    /// Set the mock clock to a new time.
    pub fn set_time(&self, time: DateTime<Local>) {
        *self.time.lock().unwrap() = time;
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut time = self.time.lock().unwrap();
        *time += duration;
    }
}

impl Clock for MockClock {
    fn now_local(&self) -> DateTime<Local> {
        *self.time.lock().unwrap()
    }
}

// ==================== Page Automation ====================

/// Content of the "Reservar" cell of an activity row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCell {
    /// The cell shows text instead of a link, so nothing can be clicked.
    Text(String),
    /// A link with the class attribute of its icon (`glyphicon-plus` or
    /// `glyphicon-minus` on the site).
    Link { control: ControlRef, icon_class: String },
}

/// One scraped activity row, after the two header rows were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub schedule: String,
    pub class_name: String,
    pub reservation: String,
    pub control: ControlCell,
}

impl RawRow {
    pub fn new(
        schedule: impl Into<String>,
        class_name: impl Into<String>,
        reservation: impl Into<String>,
        control: ControlCell,
    ) -> Self {
        Self {
            schedule: schedule.into(),
            class_name: class_name.into(),
            reservation: reservation.into(),
            control,
        }
    }
}

/// The browser session used to reach the schedule and register for classes.
///
/// Implementations own their session exclusively and are driven
/// sequentially; they are not meant to be shared between tasks.
#[allow(async_fn_in_trait)]
pub trait PageAutomation {
    /// Submit the login form.
    async fn login(&mut self, credentials: &Credentials) -> Result<()>;

    /// Display the activities of the given day.
    async fn open_day(&mut self, day: NaiveDate) -> Result<()>;

    /// Read the activity rows of the currently displayed day, in table order.
    async fn scrape_rows(&mut self) -> Result<Vec<RawRow>>;

    /// Activate a reserve control.
    async fn click(&mut self, control: &ControlRef) -> Result<()>;

    /// Alternative activation, tried once when `click` fails.
    async fn fallback_click(&mut self, control: &ControlRef) -> Result<()>;
}

/// In-memory page for testing that serves fixed rows and records every call.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    rows: Vec<RawRow>,
    fail_click: bool,
    fail_fallback: bool,
    logins: Vec<String>,
    opened_days: Vec<NaiveDate>,
    clicks: Vec<ControlRef>,
    fallback_clicks: Vec<ControlRef>,
}

impl MockPage {
    /// Create a mock page serving the given rows for every day.
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Make every regular click fail.
    pub fn with_click_failure(mut self) -> Self {
        self.fail_click = true;
        self
    }

    /// Make every fallback click fail.
    pub fn with_fallback_failure(mut self) -> Self {
        self.fail_fallback = true;
        self
    }

    /// Usernames passed to `login`.
    pub fn logins(&self) -> &[String] {
        &self.logins
    }

    pub fn opened_days(&self) -> &[NaiveDate] {
        &self.opened_days
    }

    /// Controls passed to `click`, including failed attempts.
    pub fn clicks(&self) -> &[ControlRef] {
        &self.clicks
    }

    /// Controls passed to `fallback_click`, including failed attempts.
    pub fn fallback_clicks(&self) -> &[ControlRef] {
        &self.fallback_clicks
    }

    /// Total number of click attempts of either kind.
    pub fn click_count(&self) -> usize {
        self.clicks.len() + self.fallback_clicks.len()
    }
}

impl PageAutomation for MockPage {
    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.logins.push(credentials.username.clone());
        Ok(())
    }

    async fn open_day(&mut self, day: NaiveDate) -> Result<()> {
        self.opened_days.push(day);
        Ok(())
    }

    async fn scrape_rows(&mut self) -> Result<Vec<RawRow>> {
        Ok(self.rows.clone())
    }

    async fn click(&mut self, control: &ControlRef) -> Result<()> {
        self.clicks.push(control.clone());
        if self.fail_click {
            bail!("element click intercepted");
        }
        Ok(())
    }

    async fn fallback_click(&mut self, control: &ControlRef) -> Result<()> {
        self.fallback_clicks.push(control.clone());
        if self.fail_fallback {
            bail!("script execution failed");
        }
        Ok(())
    }
}
