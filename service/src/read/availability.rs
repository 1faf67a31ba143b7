//! Availability-related read definitions.

use common::{Date, DateRange, Money};

#[cfg(doc)]
use crate::domain::{Booking, Property};

/// Availability calendar of a [`Property`] for one month.
#[derive(Clone, Debug)]
pub struct Calendar(pub Vec<Day>);

impl Calendar {
    /// Assembles a [`Calendar`] out of the provided month `days`.
    ///
    /// A day is booked if any of the `occupied` inclusive ranges contains
    /// it, and blocked if it lies strictly in the past relative to `today`.
    #[must_use]
    pub fn assemble(
        days: impl IntoIterator<Item = Date>,
        today: Date,
        daily_price: Money,
        occupied: &[DateRange],
    ) -> Self {
        Self(
            days.into_iter()
                .map(|date| {
                    let booked =
                        occupied.iter().any(|range| range.contains(date));
                    let blocked = date < today;
                    Day {
                        date,
                        available: !booked && !blocked,
                        booked,
                        blocked,
                        price: daily_price,
                    }
                })
                .collect(),
        )
    }
}

/// Single day in a [`Calendar`].
#[derive(Clone, Copy, Debug)]
pub struct Day {
    /// Calendar [`Date`] of this [`Day`].
    pub date: Date,

    /// Indicator whether this [`Day`] may be booked.
    pub available: bool,

    /// Indicator whether some [`Booking`] occupies this [`Day`].
    pub booked: bool,

    /// Indicator whether this [`Day`] lies in the past.
    pub blocked: bool,

    /// Price of renting the [`Property`] on this [`Day`].
    pub price: Money,
}

/// Month a [`Calendar`] is requested for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Month {
    /// Calendar year.
    pub year: i32,

    /// 1-indexed calendar month.
    pub month: u8,
}

/// Result of checking a requested [`DateRange`] against existing
/// [`Booking`]s.
#[derive(Clone, Debug)]
pub struct Conflict {
    /// Indicator whether the whole requested range is free.
    pub available: bool,

    /// Days of the requested range occupied by existing [`Booking`]s,
    /// in ascending order.
    pub blocked_dates: Vec<Date>,
}

impl Conflict {
    /// Detects a [`Conflict`] between the `requested` range and the
    /// `occupied` ones.
    ///
    /// Both range ends count as occupied, so ranges merely touching at an
    /// endpoint do conflict.
    #[must_use]
    pub fn detect(requested: DateRange, occupied: &[DateRange]) -> Self {
        let mut blocked_dates = occupied
            .iter()
            .filter_map(|range| range.intersection(&requested))
            .flat_map(|shared| shared.iter())
            .collect::<Vec<_>>();
        blocked_dates.sort_unstable();
        blocked_dates.dedup();

        Self {
            available: blocked_dates.is_empty(),
            blocked_dates,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateRange;

    use super::{Calendar, Conflict};

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    #[test]
    fn conflict_reports_occupied_days_of_requested_range() {
        let conflict = Conflict::detect(
            range("2025-06-10", "2025-06-15"),
            &[range("2025-06-13", "2025-06-18")],
        );

        assert!(!conflict.available);
        assert_eq!(
            conflict.blocked_dates,
            ["2025-06-13", "2025-06-14", "2025-06-15"]
                .map(|d| d.parse().unwrap()),
        );
    }

    #[test]
    fn touching_endpoints_conflict() {
        let conflict = Conflict::detect(
            range("2025-06-15", "2025-06-20"),
            &[range("2025-06-10", "2025-06-15")],
        );

        assert!(!conflict.available);
        assert_eq!(
            conflict.blocked_dates,
            ["2025-06-15"].map(|d| d.parse().unwrap()),
        );
    }

    #[test]
    fn disjoint_ranges_are_available() {
        let conflict = Conflict::detect(
            range("2025-06-16", "2025-06-20"),
            &[range("2025-06-10", "2025-06-15")],
        );

        assert!(conflict.available);
        assert!(conflict.blocked_dates.is_empty());
    }

    #[test]
    fn overlapping_occupations_deduplicate() {
        let conflict = Conflict::detect(
            range("2025-06-10", "2025-06-14"),
            &[
                range("2025-06-09", "2025-06-11"),
                range("2025-06-11", "2025-06-12"),
            ],
        );

        assert_eq!(
            conflict.blocked_dates,
            ["2025-06-10", "2025-06-11", "2025-06-12"]
                .map(|d| d.parse().unwrap()),
        );
    }

    #[test]
    fn calendar_marks_booked_blocked_and_available_days() {
        let today = "2025-06-12".parse().unwrap();
        let days = range("2025-06-10", "2025-06-14").iter();
        let price = "100USD".parse().unwrap();

        let Calendar(days) = Calendar::assemble(
            days,
            today,
            price,
            &[range("2025-06-13", "2025-06-13")],
        );

        assert_eq!(days.len(), 5);
        // 10th and 11th are past.
        assert!(days[0].blocked && !days[0].available);
        assert!(days[1].blocked && !days[1].available);
        // 12th is today and free.
        assert!(days[2].available && !days[2].booked);
        // 13th is booked.
        assert!(days[3].booked && !days[3].available && !days[3].blocked);
        // 14th is free.
        assert!(days[4].available);
        assert_eq!(days[4].price, price);
    }
}
