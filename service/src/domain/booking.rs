//! [`Booking`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateRange, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{contract, property, user};
#[cfg(doc)]
use crate::domain::{Contract, Property, User};

/// Reservation of a [`Property`] for a [`DateRange`] by a tenant.
///
/// A [`Booking`] occupies **both** its start and end calendar days. It's
/// never physically deleted: cancellation is a [`Status`] change preserving
/// history.
#[derive(Clone, Debug)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: Id,

    /// ID of the booked [`Property`].
    pub property_id: property::Id,

    /// ID of the [`User`] renting the [`Property`].
    pub tenant_id: user::Id,

    /// ID of the [`User`] listing the [`Property`].
    pub owner_id: user::Id,

    /// Inclusive [`DateRange`] occupied by this [`Booking`].
    pub range: DateRange,

    /// Number of guests staying.
    pub guest_count: GuestCount,

    /// Total amount to be paid for this [`Booking`].
    pub total_amount: Money,

    /// Surcharge applied for guests above the [`Property`] baseline, if any.
    pub extra_guest_surcharge: Option<Money>,

    /// Lifecycle [`Status`] of this [`Booking`].
    pub status: Status,

    /// [`PaymentStatus`] of this [`Booking`].
    pub payment_status: PaymentStatus,

    /// [`ReservationType`] of this [`Booking`].
    pub reservation_type: ReservationType,

    /// Deadline for completing an [`Offline`] payment.
    ///
    /// Set if and only if this [`Booking`] is an [`Offline`] reservation.
    ///
    /// [`Offline`]: ReservationType::Offline
    pub payment_deadline: Option<PaymentDeadlineDateTime>,

    /// Snapshot of the tenant's contact details at booking time.
    ///
    /// Intentionally copied rather than referenced: the legal record must
    /// not drift with later profile edits.
    pub contact_info: ContactInfo,

    /// Cross-references to entities derived from this [`Booking`].
    pub metadata: Metadata,

    /// [`DateTime`] when this [`Booking`] was created.
    pub created_at: CreationDateTime,
}

impl Booking {
    /// Indicates whether this [`Booking`] occupies its [`DateRange`] for the
    /// purpose of availability checks.
    ///
    /// Only [`Pending`] and [`Confirmed`] bookings block the calendar.
    ///
    /// [`Confirmed`]: Status::Confirmed
    /// [`Pending`]: Status::Pending
    #[must_use]
    pub fn occupies_dates(&self) -> bool {
        matches!(self.status, Status::Pending | Status::Confirmed)
    }

    /// Indicates whether this [`Booking`] is eligible for cancellation by the
    /// deadline sweep at the provided moment.
    ///
    /// Eligible are [`Offline`] reservations still awaiting payment whose
    /// deadline has elapsed, unless already in a terminal [`Status`].
    ///
    /// [`Offline`]: ReservationType::Offline
    #[must_use]
    pub fn is_sweepable_at(&self, now: PaymentDeadlineDateTime) -> bool {
        self.reservation_type == ReservationType::Offline
            && self.payment_status == PaymentStatus::Pending
            && self.payment_deadline.is_some_and(|deadline| deadline < now)
            && !matches!(self.status, Status::Cancelled | Status::Completed)
    }
}

/// ID of a [`Booking`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Booking`]."]
    enum Status {
        #[doc = "The [`Booking`] awaits confirmation."]
        Pending = 1,

        #[doc = "The [`Booking`] is confirmed by the owner."]
        Confirmed = 2,

        #[doc = "The [`Booking`] is cancelled."]
        Cancelled = 3,

        #[doc = "The [`Booking`] stay is over."]
        Completed = 4,
    }
}

impl Status {
    /// Indicates whether this [`Status`] may transition into the `next` one.
    ///
    /// Cancellation is reachable from any non-terminal [`Status`];
    /// completion requires a prior confirmation.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        #[expect(clippy::wildcard_enum_match_arm, reason = "concise")]
        match (self, next) {
            (Self::Pending, Self::Confirmed | Self::Cancelled)
            | (Self::Confirmed, Self::Completed | Self::Cancelled) => true,
            _ => false,
        }
    }
}

define_kind! {
    #[doc = "Payment status of a [`Booking`]."]
    enum PaymentStatus {
        #[doc = "Payment hasn't been made yet."]
        Pending = 1,

        #[doc = "Payment succeeded."]
        Paid = 2,

        #[doc = "Payment failed (or the deadline elapsed)."]
        Failed = 3,

        #[doc = "Payment was refunded."]
        Refunded = 4,
    }
}

impl PaymentStatus {
    /// Indicates whether this [`PaymentStatus`] may transition into the
    /// `next` one.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        #[expect(clippy::wildcard_enum_match_arm, reason = "concise")]
        match (self, next) {
            (Self::Pending, Self::Paid | Self::Failed)
            | (Self::Paid, Self::Refunded) => true,
            _ => false,
        }
    }
}

define_kind! {
    #[doc = "Way a [`Booking`] is paid for."]
    enum ReservationType {
        #[doc = "Paid immediately at checkout."]
        Online = 1,

        #[doc = "Paid later, within a grace deadline."]
        Offline = 2,
    }
}

/// Number of guests staying within a [`Booking`].
#[derive(
    Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct GuestCount(i32);

impl GuestCount {
    /// Creates a new [`GuestCount`] if the provided `count` is positive.
    #[must_use]
    pub fn new(count: i32) -> Option<Self> {
        (count > 0).then_some(Self(count))
    }
}

/// Snapshot of a tenant's contact details, fixed at booking time.
#[derive(Clone, Debug)]
pub struct ContactInfo {
    /// Full legal name of the tenant.
    pub full_name: user::Name,

    /// Email address of the tenant.
    pub email: user::Email,

    /// Phone number of the tenant.
    pub phone: user::Phone,

    /// Number of the tenant's identity document.
    pub id_number: IdNumber,
}

/// Number of an identity document.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct IdNumber(String);

impl IdNumber {
    /// Creates a new [`IdNumber`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`IdNumber`].
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        number.trim() == number && !number.is_empty() && number.len() <= 64
    }
}

impl FromStr for IdNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `IdNumber`")
    }
}

/// Cross-references carried by a [`Booking`].
///
/// Every field may be absent; the struct is deliberately a fixed set of
/// optional fields rather than an open key/value bag.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    /// ID of the [`Contract`] derived from the [`Booking`].
    pub contract_id: Option<contract::Id>,

    /// Indicator whether [`Contract`] generation succeeded.
    ///
    /// `Some(false)` marks a [`Booking`] for a later generation retry.
    pub contract_generated: Option<bool>,

    /// Indicator whether the generated [`Contract`] was emailed to the
    /// tenant.
    pub contract_sent_to_email: Option<bool>,

    /// Payment gateway session bound to the [`Booking`], if any.
    pub gateway_session_id: Option<GatewaySessionId>,
}

/// ID of a payment gateway session.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct GatewaySessionId(String);

/// [`DateTime`] when a [`Booking`] was created.
pub type CreationDateTime = DateTimeOf<(Booking, unit::Creation)>;

/// Marker type indicating a [`Booking`] payment deadline.
#[derive(Clone, Copy, Debug)]
pub struct PaymentDeadline;

/// [`DateTime`] until which an offline [`Booking`] must be paid.
pub type PaymentDeadlineDateTime = DateTimeOf<(Booking, PaymentDeadline)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateRange, DateTime, Money};

    use crate::domain::{property, user};

    use super::{
        Booking, ContactInfo, GuestCount, Id, IdNumber, Metadata,
        PaymentStatus, ReservationType, Status,
    };

    fn booking(
        status: Status,
        payment_status: PaymentStatus,
        reservation_type: ReservationType,
        deadline: Option<DateTime>,
    ) -> Booking {
        Booking {
            id: Id::new(),
            property_id: property::Id::new(),
            tenant_id: user::Id::new(),
            owner_id: user::Id::new(),
            range: DateRange::new(
                "2025-06-10".parse().unwrap(),
                "2025-06-15".parse().unwrap(),
            )
            .unwrap(),
            guest_count: GuestCount::new(2).unwrap(),
            total_amount: "1000USD".parse::<Money>().unwrap(),
            extra_guest_surcharge: None,
            status,
            payment_status,
            reservation_type,
            payment_deadline: deadline.map(DateTime::coerce),
            contact_info: ContactInfo {
                full_name: user::Name::new("Jane Roe").unwrap(),
                email: user::Email::new("jane@example.com").unwrap(),
                phone: user::Phone::new("+1 555 123 4567").unwrap(),
                id_number: IdNumber::new("AB123456").unwrap(),
            },
            metadata: Metadata::default(),
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn only_pending_and_confirmed_occupy_dates() {
        for (status, expected) in [
            (Status::Pending, true),
            (Status::Confirmed, true),
            (Status::Cancelled, false),
            (Status::Completed, false),
        ] {
            let b = booking(
                status,
                PaymentStatus::Pending,
                ReservationType::Online,
                None,
            );
            assert_eq!(b.occupies_dates(), expected, "status: {status}");
        }
    }

    #[test]
    fn sweepable_only_when_offline_pending_and_overdue() {
        let now = DateTime::now();
        let elapsed = Some(now - Duration::from_secs(60));
        let ahead = Some(now + Duration::from_secs(60));

        let overdue = booking(
            Status::Pending,
            PaymentStatus::Pending,
            ReservationType::Offline,
            elapsed,
        );
        assert!(overdue.is_sweepable_at(now.coerce()));

        let not_yet = booking(
            Status::Pending,
            PaymentStatus::Pending,
            ReservationType::Offline,
            ahead,
        );
        assert!(!not_yet.is_sweepable_at(now.coerce()));

        let paid = booking(
            Status::Pending,
            PaymentStatus::Paid,
            ReservationType::Offline,
            elapsed,
        );
        assert!(!paid.is_sweepable_at(now.coerce()));

        let online = booking(
            Status::Pending,
            PaymentStatus::Pending,
            ReservationType::Online,
            None,
        );
        assert!(!online.is_sweepable_at(now.coerce()));

        let cancelled = booking(
            Status::Cancelled,
            PaymentStatus::Pending,
            ReservationType::Offline,
            elapsed,
        );
        assert!(!cancelled.is_sweepable_at(now.coerce()));

        let completed = booking(
            Status::Completed,
            PaymentStatus::Pending,
            ReservationType::Offline,
            elapsed,
        );
        assert!(!completed.is_sweepable_at(now.coerce()));
    }

    #[test]
    fn status_transitions() {
        assert!(Status::Pending.can_transition_to(Status::Confirmed));
        assert!(Status::Pending.can_transition_to(Status::Cancelled));
        assert!(Status::Confirmed.can_transition_to(Status::Completed));
        assert!(Status::Confirmed.can_transition_to(Status::Cancelled));

        assert!(!Status::Pending.can_transition_to(Status::Completed));
        assert!(!Status::Cancelled.can_transition_to(Status::Pending));
        assert!(!Status::Completed.can_transition_to(Status::Cancelled));
    }

    #[test]
    fn payment_status_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(
            PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed),
        );
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));

        assert!(
            !PaymentStatus::Paid.can_transition_to(PaymentStatus::Pending),
        );
        assert!(
            !PaymentStatus::Failed.can_transition_to(PaymentStatus::Paid),
        );
    }

    #[test]
    fn guest_count_must_be_positive() {
        assert!(GuestCount::new(1).is_some());
        assert!(GuestCount::new(0).is_none());
        assert!(GuestCount::new(-3).is_none());
    }
}
