use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Wall-clock time of a class, without any day rollover.
///
/// Ordering is by hour, then minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build a time from its components, rejecting out-of-range values.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parse an `hh:mm` token.
    pub fn parse(token: &str) -> Result<Self, ParseError> {
        let err = || ParseError::Time(token.to_string());
        let (hour, minute) = token.trim().split_once(':').ok_or_else(err)?;
        let hour = parse_component(hour).ok_or_else(err)?;
        let minute = parse_component(minute).ok_or_else(err)?;
        Self::new(hour, minute).ok_or_else(err)
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }
}

/// One or two ASCII digits. Signs and whitespace inside the token are refused.
fn parse_component(part: &str) -> Option<u8> {
    if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl FromStr for TimeOfDay {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Start and end of a class as shown in the schedule column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: TimeOfDay,
    end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Parse a `"hh:mm - hh:mm"` token.
    pub fn parse(token: &str) -> Result<Self, ParseError> {
        let err = || ParseError::Window(token.to_string());
        let (start, end) = token.trim().split_once(" - ").ok_or_else(err)?;
        let start = TimeOfDay::parse(start).map_err(|_| err())?;
        let end = TimeOfDay::parse(end).map_err(|_| err())?;
        Self::new(start, end).ok_or_else(err)
    }

    pub fn start(&self) -> TimeOfDay {
        self.start
    }

    pub fn end(&self) -> TimeOfDay {
        self.end
    }

    /// True iff `start < time < end`. Both bounds are excluded, so a class
    /// starting exactly at the queried time does not contain it.
    pub fn contains(&self, time: TimeOfDay) -> bool {
        self.start < time && time < self.end
    }
}

impl FromStr for TimeWindow {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    fn t(token: &str) -> TimeOfDay {
        TimeOfDay::parse(token).unwrap()
    }

    // ==================== TimeOfDay Parsing Tests ====================

    #[test]
    fn test_parse_valid_time() {
        let time = t("20:30");
        assert_eq!(time.hour(), 20);
        assert_eq!(time.minute(), 30);
    }

    #[test]
    fn test_parse_midnight_and_last_minute() {
        assert_eq!(t("00:00"), TimeOfDay::new(0, 0).unwrap());
        assert_eq!(t("23:59"), TimeOfDay::new(23, 59).unwrap());
    }

    #[test]
    fn test_parse_single_digit_hour_is_normalized() {
        assert_eq!(t("9:05").to_string(), "09:05");
    }

    #[test]
    fn test_parse_surrounding_whitespace() {
        assert_eq!(t(" 11:00 "), TimeOfDay::new(11, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        for token in [
            "", "11", "11:", ":30", "1100", "aa:bb", "11:3x", "-1:00", "+1:00", "111:00",
        ] {
            assert_eq!(
                TimeOfDay::parse(token),
                Err(ParseError::Time(token.to_string())),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(TimeOfDay::parse("24:00").is_err());
        assert!(TimeOfDay::parse("12:60").is_err());
    }

    // ==================== TimeOfDay Ordering Tests ====================

    #[test]
    fn test_ordering_by_hour_then_minute() {
        assert!(t("11:30") < t("13:30"));
        assert!(t("11:30") > t("11:00"));
        assert!(t("10:59") < t("11:00"));
        assert_eq!(t("11:30").cmp(&t("11:30")), Ordering::Equal);
    }

    #[test]
    fn test_equality_requires_same_minutes() {
        assert_ne!(t("11:30"), t("11:00"));
        assert_ne!(t("11:30"), t("13:30"));
    }

    // ==================== TimeWindow Tests ====================

    #[test]
    fn test_window_parse() {
        let window = TimeWindow::parse("11:00 - 13:00").unwrap();
        assert_eq!(window.start(), t("11:00"));
        assert_eq!(window.end(), t("13:00"));
        assert_eq!(window.to_string(), "11:00 - 13:00");
    }

    #[test]
    fn test_window_contains_is_strict() {
        let window = TimeWindow::parse("11:00 - 13:00").unwrap();

        assert!(window.contains(t("11:30")));
        assert!(window.contains(t("12:59")));
        assert!(!window.contains(t("11:00")));
        assert!(!window.contains(t("13:00")));
        assert!(!window.contains(t("13:30")));
        assert!(!window.contains(t("10:00")));
    }

    #[test]
    fn test_window_rejects_bad_separator() {
        for token in ["11:00-13:00", "11:00 to 13:00", "11:00", "11:00 - ", " - 13:00"] {
            assert_eq!(
                TimeWindow::parse(token),
                Err(ParseError::Window(token.to_string())),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_window_rejects_inverted_bounds() {
        assert!(TimeWindow::parse("13:00 - 11:00").is_err());
    }

    #[test]
    fn test_zero_length_window_contains_nothing() {
        let window = TimeWindow::parse("11:00 - 11:00").unwrap();
        assert!(!window.contains(t("11:00")));
    }

    // ==================== Property-Based Tests ====================

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        fn any_time() -> impl Strategy<Value = TimeOfDay> {
            (0u8..24, 0u8..60).prop_map(|(h, m)| TimeOfDay::new(h, m).unwrap())
        }

        proptest! {
            #[test]
            fn formatted_token_round_trips(hour in 0u8..24, minute in 0u8..60) {
                let token = format!("{:02}:{:02}", hour, minute);
                let parsed = TimeOfDay::parse(&token).unwrap();
                prop_assert_eq!(parsed.to_string(), token);
            }

            #[test]
            fn ordering_is_lexicographic(a in any_time(), b in any_time()) {
                let expected = (a.hour(), a.minute()).cmp(&(b.hour(), b.minute()));
                prop_assert_eq!(a.cmp(&b), expected);
            }

            #[test]
            fn ordering_is_transitive(a in any_time(), b in any_time(), c in any_time()) {
                if a <= b && b <= c {
                    prop_assert!(a <= c);
                }
                if a < b && b < c {
                    prop_assert!(a < c);
                }
            }

            #[test]
            fn window_never_contains_its_bounds(a in any_time(), b in any_time()) {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                let window = TimeWindow::new(start, end).unwrap();
                prop_assert!(!window.contains(start));
                prop_assert!(!window.contains(end));
            }

            #[test]
            fn window_contains_matches_strict_bounds(
                a in any_time(),
                b in any_time(),
                time in any_time(),
            ) {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                let window = TimeWindow::new(start, end).unwrap();
                prop_assert_eq!(window.contains(time), start < time && time < end);
            }
        }
    }
}
