//! [`Contract`] definitions.

pub mod rental_details;
pub mod signature;

use common::{define_kind, unit, Date, DateTimeOf, Money, Percent};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{booking, property, user};
#[cfg(doc)]
use crate::domain::{Booking, Property, User};

pub use self::{rental_details::RentalDetails, signature::Signature};

/// Legal rental document derived from a [`Booking`] (or directly from a
/// pre-booking reservation flow).
///
/// Both creation paths produce this very same shape, so the signature state
/// machine cannot distinguish origin.
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// [`Kind`] of this [`Contract`].
    pub kind: Kind,

    /// ID of the [`User`] acting as the agent party.
    pub agent_id: user::Id,

    /// ID of the [`User`] acting as the client party.
    pub client_id: user::Id,

    /// ID of the [`Property`] this [`Contract`] covers.
    pub property_id: property::Id,

    /// ID of the [`Booking`] this [`Contract`] was derived from, if any.
    ///
    /// [`None`] for contracts created via the reservation-first flow before
    /// a [`Booking`] row exists.
    pub booking_id: Option<booking::Id>,

    /// [`Title`] of this [`Contract`].
    pub title: Title,

    /// [`Description`] of this [`Contract`].
    pub description: Description,

    /// Generated legal [`Terms`] text of this [`Contract`].
    pub terms: Terms,

    /// Total amount of this [`Contract`].
    pub amount: Money,

    /// Commission rate applied to the [`amount`].
    ///
    /// [`amount`]: Contract::amount
    pub commission_rate: Percent,

    /// Commission derived from the [`amount`].
    ///
    /// [`amount`]: Contract::amount
    pub commission: Money,

    /// Security deposit due under this [`Contract`].
    pub security_deposit: Money,

    /// First day the [`Contract`] covers.
    pub start_date: Date,

    /// Last day the [`Contract`] covers, if bounded.
    pub end_date: Option<Date>,

    /// [`Status`] of this [`Contract`].
    pub status: Status,

    /// [`booking::ReservationType`] mirrored from the originating
    /// reservation.
    pub reservation_type: booking::ReservationType,

    /// [`Signature`] of the agent party, once captured.
    pub agent_signature: Option<Signature>,

    /// [`Signature`] of the client party, once captured.
    pub client_signature: Option<Signature>,

    /// Immutable legal terms block of this [`Contract`].
    pub rental_details: RentalDetails,

    /// URL of the final signed document, once rendered.
    pub signed_document_url: Option<DocumentUrl>,

    /// Reason this [`Contract`] was revoked, if it was.
    pub revocation_reason: Option<RevocationReason>,

    /// [`DateTime`] when this [`Contract`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,
}

impl Contract {
    /// Commission rate applied to every generated [`Contract`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn commission_rate() -> Percent {
        Percent::new(Decimal::from(5)).expect("within bounds")
    }

    /// Security deposit rate applied to every generated [`Contract`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn security_deposit_rate() -> Percent {
        Percent::new(Decimal::from(20)).expect("within bounds")
    }

    /// Indicates whether the agent party has signed this [`Contract`].
    #[must_use]
    pub fn signed_by_agent(&self) -> bool {
        self.agent_signature.is_some()
    }

    /// Indicates whether the client party has signed this [`Contract`].
    #[must_use]
    pub fn signed_by_client(&self) -> bool {
        self.client_signature.is_some()
    }

    /// Indicates whether this [`Contract`] reached a terminal [`Status`].
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            Status::Completed | Status::Cancelled | Status::Expired,
        )
    }

    /// Records the agent party's [`Signature`] on this [`Contract`].
    ///
    /// Re-signing is idempotent: only the signing timestamp is refreshed.
    ///
    /// # Errors
    ///
    /// If this [`Contract`] is already in a terminal [`Status`].
    pub fn sign_as_agent(
        &mut self,
        signature: Signature,
    ) -> Result<Activation, SigningError> {
        self.sign(Party::Agent, signature)
    }

    /// Records the client party's [`Signature`] on this [`Contract`].
    ///
    /// Re-signing is idempotent: only the signing timestamp is refreshed.
    ///
    /// # Errors
    ///
    /// If this [`Contract`] is already in a terminal [`Status`].
    pub fn sign_as_client(
        &mut self,
        signature: Signature,
    ) -> Result<Activation, SigningError> {
        self.sign(Party::Client, signature)
    }

    /// Records the provided [`Signature`] for the provided [`Party`] and
    /// re-evaluates activation.
    fn sign(
        &mut self,
        party: Party,
        signature: Signature,
    ) -> Result<Activation, SigningError> {
        if self.is_terminal() {
            return Err(SigningError::NotSignable(self.status));
        }

        let slot = match party {
            Party::Agent => &mut self.agent_signature,
            Party::Client => &mut self.client_signature,
        };
        if let Some(existing) = slot {
            existing.signed_at = signature.signed_at;
        } else {
            *slot = Some(signature);
        }

        Ok(self.try_activate())
    }

    /// Re-evaluates activation of this [`Contract`].
    ///
    /// The [`Status`] flips to [`Active`] on the very first evaluation where
    /// both parties have signed; every later evaluation (including on an
    /// already [`Active`] contract) is a no-op, so the activation edge fires
    /// exactly once.
    ///
    /// [`Active`]: Status::Active
    pub fn try_activate(&mut self) -> Activation {
        if self.status == Status::Active || self.is_terminal() {
            return Activation::Unchanged;
        }

        if self.signed_by_agent() && self.signed_by_client() {
            self.status = Status::Active;
            Activation::Triggered
        } else {
            // The first captured signature moves a draft into `Pending`.
            if self.status == Status::Draft
                && (self.signed_by_agent() || self.signed_by_client())
            {
                self.status = Status::Pending;
            }
            Activation::Unchanged
        }
    }

    /// Indicates whether payment against this [`Contract`] may proceed.
    ///
    /// This predicate is the single gate checked by the payment flow: both
    /// parties must have signed **and** the [`Contract`] must be [`Active`].
    ///
    /// [`Active`]: Status::Active
    #[must_use]
    pub fn can_proceed_to_payment(&self) -> bool {
        self.signed_by_agent()
            && self.signed_by_client()
            && self.status == Status::Active
    }

    /// Cancels this [`Contract`].
    ///
    /// Returns whether the [`Status`] actually changed (cancelling an
    /// already terminal [`Contract`] is a no-op).
    pub fn cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = Status::Cancelled;
        true
    }

    /// Revokes this [`Contract`] with the provided reason.
    ///
    /// Returns whether the [`Status`] actually changed.
    pub fn revoke(&mut self, reason: RevocationReason) -> bool {
        if !self.cancel() {
            return false;
        }
        self.revocation_reason = Some(reason);
        true
    }

    /// Marks this [`Contract`] as expired.
    ///
    /// Returns whether the [`Status`] actually changed.
    pub fn expire(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = Status::Expired;
        true
    }

    /// Completes this [`Contract`].
    ///
    /// Returns whether the [`Status`] actually changed (only an [`Active`]
    /// [`Contract`] can complete).
    ///
    /// [`Active`]: Status::Active
    pub fn complete(&mut self) -> bool {
        if self.status != Status::Active {
            return false;
        }
        self.status = Status::Completed;
        true
    }
}

/// Party of a [`Contract`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Party {
    /// Agent party.
    Agent,

    /// Client party.
    Client,
}

/// Outcome of re-evaluating a [`Contract`] activation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use]
pub enum Activation {
    /// The [`Contract`] just became [`Status::Active`].
    ///
    /// The final signed document should be rendered now.
    Triggered,

    /// Nothing changed.
    Unchanged,
}

impl Activation {
    /// Indicates whether the activation edge fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered)
    }
}

/// Error of signing a [`Contract`].
#[derive(Clone, Copy, Debug, Display, derive_more::Error)]
pub enum SigningError {
    /// The [`Contract`] is already in a terminal [`Status`].
    #[display("`Contract` in `{_0}` status cannot be signed")]
    NotSignable(#[error(not(source))] Status),
}

/// ID of a [`Contract`].
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
    #[doc = "Kind of a [`Contract`]."]
    enum Kind {
        #[doc = "Rental [`Contract`]."]
        Rental = 1,

        #[doc = "Sale [`Contract`]."]
        Sale = 2,

        #[doc = "Management [`Contract`]."]
        Management = 3,
    }
}

define_kind! {
    #[doc = "Status of a [`Contract`]."]
    enum Status {
        #[doc = "The [`Contract`] is drafted, no signatures yet."]
        Draft = 1,

        #[doc = "The [`Contract`] awaits the remaining signature(s)."]
        Pending = 2,

        #[doc = "Both parties signed; payment may proceed."]
        Active = 3,

        #[doc = "The [`Contract`] term is over."]
        Completed = 4,

        #[doc = "The [`Contract`] was cancelled."]
        Cancelled = 5,

        #[doc = "The [`Contract`] expired unpaid."]
        Expired = 6,
    }
}

/// Title of a [`Contract`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`] if the given `title` is valid.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        Self::check(&title).then_some(Self(title))
    }

    /// Checks whether the given `title` is a valid [`Title`].
    fn check(title: impl AsRef<str>) -> bool {
        let title = title.as_ref();
        title.trim() == title && !title.is_empty() && title.len() <= 2048
    }
}

impl FromStr for Title {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Title`")
    }
}

/// Description of a [`Contract`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `description` is valid.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Option<Self> {
        let description = description.into();
        Self::check(&description).then_some(Self(description))
    }

    /// Checks whether the given `description` is a valid [`Description`].
    fn check(description: impl AsRef<str>) -> bool {
        let description = description.as_ref();
        description.trim() == description
            && !description.is_empty()
            && description.len() <= 2048
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// Generated legal terms text of a [`Contract`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Terms(String);

impl Terms {
    /// Creates new [`Terms`] from already rendered text.
    pub(crate) fn from_rendered(text: String) -> Self {
        Self(text)
    }
}

/// URL of a rendered [`Contract`] document.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct DocumentUrl(String);

/// Reason a [`Contract`] was revoked with.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct RevocationReason(String);

/// [`DateTime`] when a [`Contract`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Contract, unit::Creation)>;

#[cfg(test)]
pub(crate) mod spec_support {
    //! Fixtures shared by in-crate tests.

    use common::{DateRange, DateTime};

    use crate::domain::{
        booking,
        contract::rental_details::{Clause, PaymentFrequency},
        property, user,
    };

    use super::{Contract, Id, Kind, RentalDetails, Status};

    /// Builds a sample rental [`Contract`] in the provided [`Status`],
    /// unsigned by both parties.
    pub(crate) fn sample(status: Status) -> Contract {
        let rental_details = RentalDetails {
            landlord_name: user::Name::new("John Landlord").unwrap(),
            tenant_name: user::Name::new("Jane Tenant").unwrap(),
            property_address: property::Address::new("1 Main St").unwrap(),
            period: DateRange::new(
                "2025-06-10".parse().unwrap(),
                "2025-06-15".parse().unwrap(),
            )
            .unwrap(),
            rent: "1000USD".parse().unwrap(),
            security_deposit: "200USD".parse().unwrap(),
            payment_frequency: PaymentFrequency::Weekly,
            obligations: Clause::standard_obligations(),
            restrictions: Clause::standard_restrictions(),
            dispute_resolution: Clause::standard_dispute_resolution(),
        };
        Contract {
            id: Id::new(),
            kind: Kind::Rental,
            agent_id: user::Id::new(),
            client_id: user::Id::new(),
            property_id: property::Id::new(),
            booking_id: Some(booking::Id::new()),
            title: "Rental agreement".parse().unwrap(),
            description: "Short-term rental".parse().unwrap(),
            terms: rental_details.render_terms(),
            amount: "1000USD".parse().unwrap(),
            commission_rate: Contract::commission_rate(),
            commission: "50USD".parse().unwrap(),
            security_deposit: "200USD".parse().unwrap(),
            start_date: "2025-06-10".parse().unwrap(),
            end_date: Some("2025-06-15".parse().unwrap()),
            status,
            reservation_type: booking::ReservationType::Online,
            agent_signature: None,
            client_signature: None,
            rental_details,
            signed_document_url: None,
            revocation_reason: None,
            created_at: DateTime::now().coerce(),
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::contract::signature;

    use super::{spec_support, Activation, Contract, Signature, Status};

    fn signature(image: &str) -> Signature {
        Signature {
            kind: signature::Kind::Drawn,
            image: signature::Image::new(image).unwrap(),
            signed_at: DateTime::now().coerce(),
            ip: None,
            user_agent: None,
        }
    }

    fn contract(status: Status) -> Contract {
        spec_support::sample(status)
    }

    #[test]
    fn activates_in_either_signing_order() {
        let mut agent_first = contract(Status::Pending);
        assert_eq!(
            agent_first.sign_as_agent(signature("a")).unwrap(),
            Activation::Unchanged,
        );
        assert_eq!(
            agent_first.sign_as_client(signature("c")).unwrap(),
            Activation::Triggered,
        );
        assert_eq!(agent_first.status, Status::Active);

        let mut client_first = contract(Status::Pending);
        assert_eq!(
            client_first.sign_as_client(signature("c")).unwrap(),
            Activation::Unchanged,
        );
        assert_eq!(
            client_first.sign_as_agent(signature("a")).unwrap(),
            Activation::Triggered,
        );
        assert_eq!(client_first.status, Status::Active);
    }

    #[test]
    fn signing_is_idempotent_per_party() {
        let mut c = contract(Status::Pending);

        _ = c.sign_as_agent(signature("a")).unwrap();
        _ = c.sign_as_agent(signature("a")).unwrap();

        assert!(c.signed_by_agent());
        assert!(!c.signed_by_client());
        assert_eq!(c.status, Status::Pending);
        assert!(!c.can_proceed_to_payment());
    }

    #[test]
    fn activation_edge_fires_exactly_once() {
        let mut c = contract(Status::Pending);

        _ = c.sign_as_agent(signature("a")).unwrap();
        assert_eq!(
            c.sign_as_client(signature("c")).unwrap(),
            Activation::Triggered,
        );

        // Any further evaluation is a no-op.
        assert_eq!(
            c.sign_as_client(signature("c")).unwrap(),
            Activation::Unchanged,
        );
        assert_eq!(
            c.sign_as_agent(signature("a")).unwrap(),
            Activation::Unchanged,
        );
        assert_eq!(c.try_activate(), Activation::Unchanged);
        assert_eq!(c.status, Status::Active);
    }

    #[test]
    fn randomized_signing_sequences_converge() {
        // All interleavings (with repeats) of agent/client signing events
        // must converge to the same terminal state.
        let sequences: &[&[Party]] = &[
            &[Party::Agent, Party::Client],
            &[Party::Client, Party::Agent],
            &[Party::Agent, Party::Agent, Party::Client],
            &[Party::Client, Party::Client, Party::Agent],
            &[Party::Agent, Party::Client, Party::Agent, Party::Client],
            &[Party::Client, Party::Agent, Party::Client, Party::Agent],
        ];

        for seq in sequences {
            let mut c = contract(Status::Pending);
            let mut triggered = 0;
            for party in *seq {
                let outcome = match party {
                    Party::Agent => c.sign_as_agent(signature("a")),
                    Party::Client => c.sign_as_client(signature("c")),
                }
                .unwrap();
                if outcome.is_triggered() {
                    triggered += 1;
                }
            }
            assert_eq!(c.status, Status::Active, "sequence: {seq:?}");
            assert!(c.can_proceed_to_payment(), "sequence: {seq:?}");
            assert_eq!(triggered, 1, "sequence: {seq:?}");
        }

        #[derive(Clone, Copy, Debug)]
        enum Party {
            Agent,
            Client,
        }
    }

    #[test]
    fn payment_gate_requires_both_signatures_and_active_status() {
        let mut c = contract(Status::Pending);
        assert!(!c.can_proceed_to_payment());

        _ = c.sign_as_agent(signature("a")).unwrap();
        assert!(!c.can_proceed_to_payment());

        _ = c.sign_as_client(signature("c")).unwrap();
        assert!(c.can_proceed_to_payment());

        // A terminal status closes the gate even with both signatures.
        assert!(c.cancel());
        assert!(!c.can_proceed_to_payment());
    }

    #[test]
    fn first_signature_moves_draft_to_pending() {
        let mut c = contract(Status::Draft);
        _ = c.sign_as_client(signature("c")).unwrap();
        assert_eq!(c.status, Status::Pending);
    }

    #[test]
    fn terminal_contract_rejects_signing() {
        for status in [Status::Cancelled, Status::Expired, Status::Completed] {
            let mut c = contract(status);
            assert!(c.sign_as_agent(signature("a")).is_err());
            assert!(c.sign_as_client(signature("c")).is_err());
        }
    }

    #[test]
    fn revocation_records_reason() {
        let mut c = contract(Status::Pending);
        assert!(c.revoke("fraudulent listing".to_owned().into()));
        assert_eq!(c.status, Status::Cancelled);
        assert_eq!(
            c.revocation_reason.as_ref().map(AsRef::<str>::as_ref),
            Some("fraudulent listing"),
        );

        // Revoking again is a no-op.
        assert!(!c.revoke("again".to_owned().into()));
    }

    #[test]
    fn cancellation_keeps_captured_signatures() {
        let mut c = contract(Status::Pending);
        _ = c.sign_as_agent(signature("a")).unwrap();

        assert!(c.cancel());
        assert_eq!(c.status, Status::Cancelled);
        assert!(c.signed_by_agent());

        // A terminal contract is left untouched.
        assert!(!c.cancel());
    }

    #[test]
    fn completion_requires_active_status() {
        let mut c = contract(Status::Pending);
        assert!(!c.complete());

        _ = c.sign_as_agent(signature("a")).unwrap();
        _ = c.sign_as_client(signature("c")).unwrap();
        assert!(c.complete());
        assert_eq!(c.status, Status::Completed);
    }
}
