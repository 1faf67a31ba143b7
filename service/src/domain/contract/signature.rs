//! [`Signature`] definitions.

use std::str::FromStr;

use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

use crate::domain::user::StoredSignature;
#[cfg(doc)]
use crate::domain::{Contract, User};

/// Signature captured on a [`Contract`] by one of its parties.
#[derive(Clone, Debug)]
pub struct Signature {
    /// [`Kind`] of this [`Signature`].
    pub kind: Kind,

    /// Image (or typed text) of this [`Signature`].
    pub image: Image,

    /// [`DateTime`] when this [`Signature`] was captured.
    ///
    /// [`DateTime`]: common::DateTime
    pub signed_at: SigningDateTime,

    /// IP address the signing request originated from.
    pub ip: Option<IpAddress>,

    /// User agent the signing request originated from.
    pub user_agent: Option<UserAgent>,
}

impl Signature {
    /// Indicates whether this [`Signature`] matches the provided
    /// [`StoredSignature`] of a [`User`]'s profile.
    ///
    /// Used to re-validate a recorded agent signature against the profile
    /// record it was taken from.
    #[must_use]
    pub fn matches(&self, stored: &StoredSignature) -> bool {
        self.image == stored.image && self.kind == stored.kind
    }
}

define_kind! {
    #[doc = "Way a [`Signature`] was produced."]
    enum Kind {
        #[doc = "Drawn by hand (canvas image)."]
        Drawn = 1,

        #[doc = "Typed text rendered in a signature font."]
        Typed = 2,

        #[doc = "Uploaded image of a wet signature."]
        Uploaded = 3,
    }
}

/// Image (or typed text) of a [`Signature`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Image(String);

impl Image {
    /// Creates a new [`Image`] if the given `image` is non-empty.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Option<Self> {
        let image = image.into();
        (!image.trim().is_empty()).then_some(Self(image))
    }
}

impl FromStr for Image {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Image`")
    }
}

/// IP address a signing request originated from.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct IpAddress(String);

/// User agent a signing request originated from.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct UserAgent(String);

/// [`DateTime`] when a [`Signature`] was captured.
///
/// [`DateTime`]: common::DateTime
pub type SigningDateTime = DateTimeOf<(Signature, unit::Signing)>;
