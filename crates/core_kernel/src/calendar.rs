//! Calendar-month arithmetic for billing
//!
//! Rent is tracked per calendar month. `BillingMonth` is always anchored on
//! the first day of its month, so month comparisons never depend on which day
//! of the month a lease started or a payment landed.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors related to calendar operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("Cannot parse billing month from '{0}', expected YYYY-MM")]
    Unparseable(String),

    #[error("Date arithmetic left the supported calendar range")]
    OutOfRange,

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// One calendar month, e.g. `2025-03`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingMonth(NaiveDate);

impl BillingMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or(CalendarError::InvalidMonth { year, month })
    }

    /// The month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self(start_of_month(date))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        end_of_month(self.0)
    }

    /// True when `date` falls inside `[first_day, last_day]`
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year(), self.month())
    }

    /// `day` clamped into this month (31 in February becomes 28 or 29)
    pub fn clamped_day(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days());
        self.0.with_day(day).unwrap_or_else(|| self.last_day())
    }

    pub fn add_months(&self, months: u32) -> Result<Self, CalendarError> {
        self.0
            .checked_add_months(Months::new(months))
            .map(Self)
            .ok_or(CalendarError::OutOfRange)
    }

    pub fn next(&self) -> Option<Self> {
        self.add_months(1).ok()
    }

    /// Iterates from this month through `end`, both inclusive
    pub fn through(self, end: BillingMonth) -> MonthRange {
        MonthRange {
            next: if self <= end { Some(self) } else { None },
            end,
        }
    }
}

impl fmt::Display for BillingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for BillingMonth {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparseable = || CalendarError::Unparseable(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(unparseable)?;
        let year: i32 = year.parse().map_err(|_| unparseable())?;
        let month: u32 = month.parse().map_err(|_| unparseable())?;
        Self::new(year, month)
    }
}

impl Serialize for BillingMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BillingMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive iterator over consecutive months
#[derive(Debug, Clone)]
pub struct MonthRange {
    next: Option<BillingMonth>,
    end: BillingMonth,
}

impl Iterator for MonthRange {
    type Item = BillingMonth;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next().filter(|m| *m <= self.end);
        Some(current)
    }
}

/// First day of the month containing `date`
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    start_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` of `year`; 0 for an invalid month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// `day` clamped into `month` of `year`
pub fn clamp_day(year: i32, month: u32, day: u32) -> Result<NaiveDate, CalendarError> {
    Ok(BillingMonth::new(year, month)?.clamped_day(day))
}

/// Number of calendar months touched by `[from, to]`, counting both ends
///
/// Returns 0 when `to` is before `from`.
pub fn months_between_inclusive(from: NaiveDate, to: NaiveDate) -> u32 {
    if to < from {
        return 0;
    }
    let span = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    u32::try_from(span + 1).unwrap_or(0)
}

/// Source of "today" for due-date calculations
pub trait BusinessClock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock evaluated in the business's timezone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Builds a clock from an IANA name such as `Asia/Kolkata`
    pub fn from_name(name: &str) -> Result<Self, CalendarError> {
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| CalendarError::UnknownTimezone(name.to_string()))
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn today_at(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Kolkata)
    }
}

impl BusinessClock for SystemClock {
    fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }
}

/// A clock pinned to one date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl BusinessClock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        let feb = BillingMonth::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));

        let feb_2025 = BillingMonth::new(2025, 2).unwrap();
        assert_eq!(feb_2025.last_day(), date(2025, 2, 28));

        let dec = BillingMonth::new(2025, 12).unwrap();
        assert_eq!(dec.last_day(), date(2025, 12, 31));
    }

    #[test]
    fn test_invalid_month() {
        assert!(BillingMonth::new(2025, 13).is_err());
        assert!(BillingMonth::new(2025, 0).is_err());
    }

    #[test]
    fn test_contains_is_closed_interval() {
        let march = BillingMonth::new(2025, 3).unwrap();
        assert!(march.contains(date(2025, 3, 1)));
        assert!(march.contains(date(2025, 3, 31)));
        assert!(!march.contains(date(2025, 2, 28)));
        assert!(!march.contains(date(2025, 4, 1)));
    }

    #[test]
    fn test_clamped_day() {
        let feb = BillingMonth::new(2025, 2).unwrap();
        assert_eq!(feb.clamped_day(31), date(2025, 2, 28));
        assert_eq!(feb.clamped_day(0), date(2025, 2, 1));

        let apr = BillingMonth::new(2025, 4).unwrap();
        assert_eq!(apr.clamped_day(31), date(2025, 4, 30));
        assert_eq!(apr.clamped_day(15), date(2025, 4, 15));
    }

    #[test]
    fn test_parse_and_display() {
        let month: BillingMonth = "2025-03".parse().unwrap();
        assert_eq!(month, BillingMonth::new(2025, 3).unwrap());
        assert_eq!(month.to_string(), "2025-03");

        assert!("2025/03".parse::<BillingMonth>().is_err());
        assert!("2025-13".parse::<BillingMonth>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let month = BillingMonth::new(2025, 7).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, "\"2025-07\"");
        let back: BillingMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
    }

    #[test]
    fn test_range_crosses_year() {
        let start = BillingMonth::new(2024, 11).unwrap();
        let end = BillingMonth::new(2025, 2).unwrap();
        let months: Vec<String> = start.through(end).map(|m| m.to_string()).collect();
        assert_eq!(months, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);
    }

    #[test]
    fn test_empty_range_when_reversed() {
        let start = BillingMonth::new(2025, 5).unwrap();
        let end = BillingMonth::new(2025, 4).unwrap();
        assert_eq!(start.through(end).count(), 0);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2025, 13), 0);
    }

    #[test]
    fn test_system_clock_uses_timezone() {
        let clock = SystemClock::from_name("Asia/Kolkata").unwrap();
        // 20:00 UTC is already the next day in India (UTC+5:30)
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 20, 0, 0).unwrap();
        assert_eq!(clock.today_at(now), date(2025, 4, 1));

        assert!(SystemClock::from_name("Mars/Olympus").is_err());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(date(2025, 1, 15));
        assert_eq!(clock.today(), date(2025, 1, 15));
    }
}
