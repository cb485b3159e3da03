use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::{
    activity::{ActivityRecord, ClassTag},
    config::DaysConfig,
    error::{ConfigError, ParseError},
    schedule::TimeOfDay,
};

/// Format of the day keys in the configuration.
pub const DAY_FORMAT: &str = "%d/%m/%Y";

/// Parse a `dd/mm/yyyy` day.
pub fn parse_day(token: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(token.trim(), DAY_FORMAT)
        .map_err(|_| ParseError::Day(token.to_string()))
}

/// Which activities the user wants, built once from the configured days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFilter {
    classes: BTreeSet<ClassTag>,
    days: BTreeMap<NaiveDate, Vec<TimeOfDay>>,
}

impl BookingFilter {
    pub fn new(classes: BTreeSet<ClassTag>, days: BTreeMap<NaiveDate, Vec<TimeOfDay>>) -> Self {
        Self { classes, days }
    }

    /// Validate the `days` section and collect the wanted classes, days and
    /// target hours.
    ///
    /// Fails on an unknown class name, a malformed day or hour, or when not a
    /// single (day, hour, class) entry is configured.
    pub fn from_days(config: &DaysConfig) -> Result<Self, ConfigError> {
        let mut classes = BTreeSet::new();
        let mut days = BTreeMap::new();
        let mut entries = 0usize;

        for (day_token, hours) in config {
            let day = parse_day(day_token).map_err(ConfigError::InvalidDay)?;
            let mut targets: Vec<TimeOfDay> = Vec::with_capacity(hours.len());

            for (hour_token, names) in hours {
                let hour = TimeOfDay::parse(hour_token)
                    .map_err(|source| ConfigError::InvalidHour { day, source })?;
                for name in names {
                    let tag = ClassTag::from_config_name(name)
                        .ok_or_else(|| ConfigError::UnknownClass { name: name.clone() })?;
                    classes.insert(tag);
                    entries += 1;
                }
                targets.push(hour);
            }

            // "02/01/2021" and "2/1/2021" name the same day.
            let merged: &mut Vec<TimeOfDay> = days.entry(day).or_default();
            merged.extend(targets);
            merged.sort();
            merged.dedup();
        }

        if entries == 0 {
            return Err(ConfigError::NoHours);
        }
        Ok(Self { classes, days })
    }

    /// True only when the class is wanted, `target` falls strictly inside the
    /// activity's window and the day is wanted.
    pub fn matches(&self, record: &ActivityRecord, day: NaiveDate, target: TimeOfDay) -> bool {
        let class_wanted = record
            .class_tag()
            .is_some_and(|tag| self.classes.contains(&tag));
        class_wanted && record.window.contains(target) && self.days.contains_key(&day)
    }

    /// First configured target hour of `day` that the record matches.
    pub fn matching_hour(&self, record: &ActivityRecord, day: NaiveDate) -> Option<TimeOfDay> {
        self.target_hours(day)
            .iter()
            .copied()
            .find(|&target| self.matches(record, day, target))
    }

    pub fn wanted_classes(&self) -> impl Iterator<Item = ClassTag> + '_ {
        self.classes.iter().copied()
    }

    /// Wanted days in calendar order.
    pub fn wanted_days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    pub fn is_wanted_day(&self, day: NaiveDate) -> bool {
        self.days.contains_key(&day)
    }

    /// Target hours configured for `day`, sorted; empty for unwanted days.
    pub fn target_hours(&self, day: NaiveDate) -> &[TimeOfDay] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }
}
