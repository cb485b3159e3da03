//! One booking run: pick the day, read its activities and book the wanted ones.

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    activity::{ActivityRecord, BookingOutcome},
    error::{ConfigError, ParseError},
    filter::BookingFilter,
    schedule::TimeOfDay,
    traits::{Clock, PageAutomation},
};

/// A matching activity and what happened when booking it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingAttempt {
    pub record: ActivityRecord,
    pub target: TimeOfDay,
    pub outcome: BookingOutcome,
}

/// Everything a run saw and did, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub day: NaiveDate,
    pub rows_seen: usize,
    /// Rows whose schedule or reservation text could not be parsed.
    pub skipped: Vec<ParseError>,
    /// Class names outside the known vocabulary.
    pub unregistered: Vec<String>,
    pub attempts: Vec<BookingAttempt>,
}

impl RunSummary {
    fn new(day: NaiveDate) -> Self {
        Self {
            day,
            rows_seen: 0,
            skipped: Vec::new(),
            unregistered: Vec::new(),
            attempts: Vec::new(),
        }
    }

    pub fn booked(&self) -> usize {
        self.count(BookingOutcome::Booked)
    }

    pub fn count(&self, outcome: BookingOutcome) -> usize {
        self.attempts.iter().filter(|a| a.outcome == outcome).count()
    }
}

/// Choose the day to process.
///
/// A requested day must be configured. Otherwise the earliest configured day
/// that is not in the past is used.
pub fn select_day(
    filter: &BookingFilter,
    requested: Option<NaiveDate>,
    clock: &dyn Clock,
) -> Result<NaiveDate, ConfigError> {
    match requested {
        Some(day) if filter.is_wanted_day(day) => Ok(day),
        Some(day) => Err(ConfigError::DayNotWanted(day)),
        None => {
            let today = clock.today();
            filter
                .wanted_days()
                .find(|day| *day >= today)
                .ok_or(ConfigError::NoUpcomingDay(today))
        }
    }
}

/// Open `day`, scrape its activities and try to book every match.
///
/// Rows are handled independently: a malformed row or an unknown class is
/// reported and skipped, and every matching row gets its own attempt.
pub async fn book_day<P: PageAutomation>(
    page: &mut P,
    filter: &BookingFilter,
    day: NaiveDate,
) -> Result<RunSummary> {
    page.open_day(day).await?;
    let rows = page.scrape_rows().await?;

    let mut summary = RunSummary::new(day);
    summary.rows_seen = rows.len();

    for row in rows {
        let record = match ActivityRecord::from_row(row) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping row: {}", e);
                summary.skipped.push(e);
                continue;
            }
        };

        if record.class_tag().is_none() {
            warn!("Activity unregistered: {}", record.class);
            summary.unregistered.push(record.class.to_string());
            continue;
        }

        let Some(target) = filter.matching_hour(&record, day) else {
            continue;
        };

        info!("Activity: {} (wanted at {})", record, target);
        let outcome = record.attempt_book(page).await;
        info!("Are we registered? {}", outcome);
        summary.attempts.push(BookingAttempt {
            record,
            target,
            outcome,
        });
    }

    info!(
        "Run for {} finished: {} rows, {} attempted, {} booked",
        day,
        summary.rows_seen,
        summary.attempts.len(),
        summary.booked()
    );
    Ok(summary)
}
