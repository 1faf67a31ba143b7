//! Calendar date utilities.
//!
//! Bookings occupy whole calendar days, so the interval math here is
//! deliberately **inclusive of both ends**: a [`DateRange`] covers its start
//! and end days, and two ranges overlap whenever they share at least one
//! calendar day.

use std::{fmt, str::FromStr};

use derive_more::Error;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use time::{format_description::BorrowedFormatItem, macros::format_description};

/// Format of a [`Date`] in its textual representation.
const FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]");

/// Single calendar day (no time-of-day, no offset).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Date(time::Date);

impl Date {
    /// Creates a new [`Date`] from the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_calendar(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self)
    }

    /// Returns the current [`Date`] in UTC.
    #[must_use]
    pub fn today() -> Self {
        Self(time::OffsetDateTime::now_utc().date())
    }

    /// Returns the [`Date`] following this one.
    ///
    /// [`None`] is returned if this [`Date`] is the last representable one.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    /// Enumerates every [`Date`] of the provided calendar month.
    ///
    /// [`None`] is returned if the provided `month` number is invalid.
    #[must_use]
    pub fn calendar_month(year: i32, month: u8) -> Option<Vec<Self>> {
        let month = time::Month::try_from(month).ok()?;
        Some(
            (1..=month.length(year))
                .filter_map(|day| {
                    time::Date::from_calendar_date(year, month, day)
                        .ok()
                        .map(Self)
                })
                .collect(),
        )
    }

    /// Returns the number of whole days from `other` to this [`Date`].
    ///
    /// Negative if this [`Date`] is earlier than `other`.
    #[must_use]
    pub fn days_since(self, other: Self) -> i64 {
        (self.0 - other.0).whole_days()
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .format(&FORMAT)
            .map_err(|_| fmt::Error)
            .and_then(|s| f.write_str(&s))
    }
}

impl FromStr for Date {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, &FORMAT).map(Self).map_err(ParseError)
    }
}

impl From<time::Date> for Date {
    fn from(date: time::Date) -> Self {
        Self(date)
    }
}

impl From<Date> for time::Date {
    fn from(date: Date) -> Self {
        date.0
    }
}

/// Error of parsing a [`Date`] from a string.
#[derive(Clone, Copy, Debug, Error)]
pub struct ParseError(time::error::Parse);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot parse `Date`: {}", self.0)
    }
}

/// Inclusive range of calendar days.
///
/// Both the start and the end day belong to the range.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DateRange {
    /// First day of this [`DateRange`].
    start: Date,

    /// Last day of this [`DateRange`] (occupied as well).
    end: Date,
}

impl DateRange {
    /// Creates a new [`DateRange`] from the provided boundaries.
    ///
    /// [`None`] is returned if `end` is earlier than `start`.
    #[must_use]
    pub fn new(start: Date, end: Date) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Returns the first day of this [`DateRange`].
    #[must_use]
    pub fn start(&self) -> Date {
        self.start
    }

    /// Returns the last day of this [`DateRange`].
    #[must_use]
    pub fn end(&self) -> Date {
        self.end
    }

    /// Indicates whether this [`DateRange`] shares at least one calendar day
    /// with the `other` one.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Indicates whether the provided `day` belongs to this [`DateRange`].
    #[must_use]
    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }

    /// Returns the [`DateRange`] of days shared by this and the `other` one.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        Self::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Returns the number of calendar days this [`DateRange`] occupies.
    ///
    /// A single-day range occupies 1 day.
    #[expect(
        clippy::missing_panics_doc,
        reason = "`end >= start` is guaranteed on construction"
    )]
    #[must_use]
    pub fn day_count(&self) -> u32 {
        u32::try_from(self.end.days_since(self.start) + 1)
            .expect("`end >= start`")
    }

    /// Returns an [`Iterator`] over every [`Date`] of this [`DateRange`].
    pub fn iter(&self) -> impl Iterator<Item = Date> {
        let end = self.end;
        let mut next = Some(self.start);
        std::iter::from_fn(move || {
            let day = next.filter(|d| *d <= end)?;
            next = day.next();
            Some(day)
        })
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { start, end } = self;
        write!(f, "{start}..={end}")
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{
        de::Error as _, Deserialize, Deserializer, Serialize, Serializer,
    };

    use super::Date;

    impl Serialize for Date {
        fn serialize<S: Serializer>(
            &self,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Date {
        fn deserialize<D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Self::from_str(&s).map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod spec {
    use super::{Date, DateRange};

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(date(start), date(end)).unwrap()
    }

    #[test]
    fn rejects_inverted_boundaries() {
        assert!(DateRange::new(date("2025-06-15"), date("2025-06-10"))
            .is_none());
        assert!(DateRange::new(date("2025-06-10"), date("2025-06-10"))
            .is_some());
    }

    #[test]
    fn overlap_is_inclusive_of_both_ends() {
        let stored = range("2025-06-10", "2025-06-15");

        assert!(stored.overlaps(&range("2025-06-13", "2025-06-18")));
        assert!(stored.overlaps(&range("2025-06-05", "2025-06-10")));
        assert!(stored.overlaps(&range("2025-06-15", "2025-06-20")));
        assert!(stored.overlaps(&range("2025-06-12", "2025-06-12")));
        assert!(stored.overlaps(&range("2025-06-01", "2025-06-30")));

        assert!(!stored.overlaps(&range("2025-06-01", "2025-06-09")));
        assert!(!stored.overlaps(&range("2025-06-16", "2025-06-30")));
    }

    #[test]
    fn intersection_yields_shared_days() {
        let booked = range("2025-06-10", "2025-06-15");
        let candidate = range("2025-06-13", "2025-06-18");

        let shared = booked.intersection(&candidate).unwrap();
        assert_eq!(
            shared.iter().collect::<Vec<_>>(),
            vec![
                date("2025-06-13"),
                date("2025-06-14"),
                date("2025-06-15"),
            ],
        );

        assert!(booked
            .intersection(&range("2025-06-16", "2025-06-18"))
            .is_none());
    }

    #[test]
    fn day_count_includes_both_ends() {
        assert_eq!(range("2025-06-10", "2025-06-10").day_count(), 1);
        assert_eq!(range("2025-06-10", "2025-06-15").day_count(), 6);
        assert_eq!(range("2025-06-01", "2025-06-30").day_count(), 30);
    }

    #[test]
    fn calendar_month_enumerates_every_day() {
        let june = Date::calendar_month(2025, 6).unwrap();
        assert_eq!(june.len(), 30);
        assert_eq!(june.first().copied().unwrap(), date("2025-06-01"));
        assert_eq!(june.last().copied().unwrap(), date("2025-06-30"));

        let february = Date::calendar_month(2024, 2).unwrap();
        assert_eq!(february.len(), 29);

        assert!(Date::calendar_month(2025, 13).is_none());
    }

    #[test]
    fn iterates_in_order() {
        let days = range("2025-05-30", "2025-06-02")
            .iter()
            .collect::<Vec<_>>();
        assert_eq!(
            days,
            vec![
                date("2025-05-30"),
                date("2025-05-31"),
                date("2025-06-01"),
                date("2025-06-02"),
            ],
        );
    }

    #[test]
    fn parses_and_formats() {
        assert_eq!(date("2025-06-10").to_string(), "2025-06-10");
        assert!("2025-13-01".parse::<Date>().is_err());
        assert!("junk".parse::<Date>().is_err());
    }
}
