//! [`Booking`]-related read definitions.

use common::DateRange;

#[cfg(doc)]
use crate::domain::{Booking, Property, User};
use crate::domain::{booking, property, user};

/// Wrapper around [`Booking`]s indicating that they [`occupy dates`].
///
/// [`occupy dates`]: Booking::occupies_dates
#[derive(Clone, Debug)]
pub struct Occupying<T>(pub T);

/// Selector of [`Booking`]s belonging to a [`Property`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OfProperty(pub property::Id);

/// Selector of [`Booking`]s belonging to a [`Property`] and overlapping a
/// [`DateRange`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Overlapping {
    /// ID of the [`Property`] in question.
    pub property_id: property::Id,

    /// Inclusive [`DateRange`] to intersect with.
    pub range: DateRange,
}

/// Selector of [`Booking`]s made by a tenant [`User`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OfTenant(pub user::Id);

/// Selector of [`Booking`]s upon properties listed by an agent [`User`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct OfAgent(pub user::Id);

/// Selector of [`Booking`]s eligible for the unpaid-deadline sweep.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sweepable {
    /// Moment the eligibility is evaluated at.
    pub now: booking::PaymentDeadlineDateTime,
}

/// Selector of a single [`Booking`] to sweep.
///
/// The corresponding write is conditional on the [`Booking`] still being
/// sweepable, so a concurrently confirmed payment wins the race.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Sweep(pub booking::Id);

/// [`booking::Metadata`] columns of a single [`Booking`], written without
/// touching the rest of the row.
///
/// Post-commit bookkeeping goes through this projection: status and
/// payment columns are never part of the write, so transitions landed
/// concurrently stay in place.
#[derive(Clone, Debug)]
pub struct Metadata {
    /// ID of the [`Booking`] to patch.
    pub id: booking::Id,

    /// New [`booking::Metadata`] of the [`Booking`].
    pub metadata: booking::Metadata,
}
