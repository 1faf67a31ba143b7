//! [`Contract`]-related read definitions.

use rust_decimal::Decimal;

use crate::domain::{contract, Contract, User};

/// Re-derived validity of the signatures captured on a [`Contract`].
///
/// Unlike the activation check (which only looks at signature presence),
/// this verifies the recorded agent signature against the agent's *current*
/// profile record, so a later profile change surfaces here.
#[derive(Clone, Debug)]
pub struct SignatureValidity {
    /// Indicator whether the recorded agent signature is valid.
    pub agent_signature_valid: bool,

    /// Indicator whether the recorded client signature is valid.
    pub client_signature_valid: bool,

    /// Human-readable reasons of invalidity, if any.
    pub errors: Vec<String>,
}

impl SignatureValidity {
    /// Evaluates the [`SignatureValidity`] of the provided [`Contract`]
    /// against the `agent`'s current profile.
    #[must_use]
    pub fn evaluate(contract: &Contract, agent: &User) -> Self {
        let mut errors = Vec::new();

        let agent_signature_valid = match &contract.agent_signature {
            Some(signature) => match agent.active_signature() {
                Some(stored) if signature.matches(stored) => true,
                Some(_) => {
                    errors.push(
                        "agent signature differs from the profile record"
                            .to_owned(),
                    );
                    false
                }
                None => {
                    errors.push(
                        "agent has no active profile signature".to_owned(),
                    );
                    false
                }
            },
            None => {
                errors.push("agent has not signed".to_owned());
                false
            }
        };

        let client_signature_valid = contract.client_signature.is_some();
        if !client_signature_valid {
            errors.push("client has not signed".to_owned());
        }

        Self {
            agent_signature_valid,
            client_signature_valid,
            errors,
        }
    }

    /// Indicates whether both recorded signatures are valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.agent_signature_valid && self.client_signature_valid
    }
}

/// Rendered document URL of a single [`Contract`], written without touching
/// the rest of the row.
///
/// The rendering follow-up runs outside of any transaction, so everything
/// else (signatures, status) may have moved on since the snapshot was taken.
#[derive(Clone, Debug)]
pub struct Document {
    /// ID of the [`Contract`] to patch.
    pub id: contract::Id,

    /// URL of the rendered signed document.
    pub url: contract::DocumentUrl,
}

/// Selector of a single [`Contract`] to cancel alongside its swept
/// [`Booking`].
///
/// The corresponding write is conditional on the [`Contract`] not being
/// terminal yet and touches only its status column, leaving concurrently
/// captured signatures in place.
///
/// [`Booking`]: crate::domain::Booking
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Sweep(pub contract::Id);

/// Per-[`Status`] counts of [`Contract`]s along with the commission total.
///
/// [`Status`]: crate::domain::contract::Status
#[derive(Clone, Copy, Debug, Default)]
pub struct Statistics {
    /// Total count of [`Contract`]s.
    pub total: i32,

    /// Count of draft [`Contract`]s.
    pub draft: i32,

    /// Count of pending [`Contract`]s.
    pub pending: i32,

    /// Count of active [`Contract`]s.
    pub active: i32,

    /// Count of completed [`Contract`]s.
    pub completed: i32,

    /// Count of cancelled [`Contract`]s.
    pub cancelled: i32,

    /// Count of expired [`Contract`]s.
    pub expired: i32,

    /// Sum of commissions over active and completed [`Contract`]s.
    pub commission_total: Decimal,
}

pub mod list {
    //! [`Contract`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::contract;
    #[cfg(doc)]
    use crate::domain::Contract;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = contract::Id;

    /// Cursor pointing to a specific [`Contract`] in a list.
    pub type Cursor = contract::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`contract::Title`] (or its part) to fuzzy search for.
        pub title: Option<contract::Title>,

        /// [`contract::Status`] to filter by.
        pub status: Option<contract::Status>,

        /// [`contract::Kind`] to filter by.
        pub kind: Option<contract::Kind>,
    }

    /// Total count of [`Contract`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{
        contract::{signature, Status},
        user::StoredSignature,
        User,
    };

    use super::SignatureValidity;

    fn signature(image: &str) -> signature::Signature {
        signature::Signature {
            kind: signature::Kind::Drawn,
            image: signature::Image::new(image).unwrap(),
            signed_at: DateTime::now().coerce(),
            ip: None,
            user_agent: None,
        }
    }

    fn agent(stored: Option<StoredSignature>) -> User {
        User {
            id: crate::domain::user::Id::new(),
            name: crate::domain::user::Name::new("Agent Smith").unwrap(),
            email: None,
            phone: None,
            signature: stored,
            created_at: DateTime::now().coerce(),
        }
    }

    fn stored(image: &str, is_active: bool) -> StoredSignature {
        StoredSignature {
            image: signature::Image::new(image).unwrap(),
            kind: signature::Kind::Drawn,
            is_active,
        }
    }

    #[test]
    fn valid_when_both_match() {
        let mut c = crate::domain::contract::spec_support::sample(
            Status::Pending,
        );
        c.agent_signature = Some(signature("agent"));
        c.client_signature = Some(signature("client"));

        let validity =
            SignatureValidity::evaluate(&c, &agent(Some(stored("agent", true))));
        assert!(validity.is_valid());
        assert!(validity.errors.is_empty());
    }

    #[test]
    fn agent_signature_invalid_when_profile_record_differs() {
        let mut c = crate::domain::contract::spec_support::sample(
            Status::Pending,
        );
        c.agent_signature = Some(signature("old"));
        c.client_signature = Some(signature("client"));

        let validity =
            SignatureValidity::evaluate(&c, &agent(Some(stored("new", true))));
        assert!(!validity.agent_signature_valid);
        assert!(validity.client_signature_valid);
        assert!(!validity.is_valid());
    }

    #[test]
    fn agent_signature_invalid_when_profile_record_inactive() {
        let mut c = crate::domain::contract::spec_support::sample(
            Status::Pending,
        );
        c.agent_signature = Some(signature("agent"));
        c.client_signature = Some(signature("client"));

        let validity = SignatureValidity::evaluate(
            &c,
            &agent(Some(stored("agent", false))),
        );
        assert!(!validity.agent_signature_valid);
    }

    #[test]
    fn missing_signatures_are_reported() {
        let c = crate::domain::contract::spec_support::sample(Status::Pending);

        let validity =
            SignatureValidity::evaluate(&c, &agent(Some(stored("a", true))));
        assert!(!validity.is_valid());
        assert_eq!(validity.errors.len(), 2);
    }
}
