//! [`RentalDetails`] definitions.

use common::{define_kind, DateRange, Money};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::Contract;
use crate::domain::{property, user};

use super::Terms;

/// Legal terms block of a rental [`Contract`].
///
/// Populated once at generation time and immutable afterwards: it's the
/// legally fixed record of what the parties agreed to.
#[derive(Clone, Debug)]
pub struct RentalDetails {
    /// Legal name of the landlord party.
    pub landlord_name: user::Name,

    /// Legal name of the tenant party.
    pub tenant_name: user::Name,

    /// Address of the rented property.
    pub property_address: property::Address,

    /// Inclusive [`DateRange`] of the rental.
    pub period: DateRange,

    /// Total rent for the whole [`period`].
    ///
    /// [`period`]: RentalDetails::period
    pub rent: Money,

    /// Security deposit due before move-in.
    pub security_deposit: Money,

    /// [`PaymentFrequency`] of rent instalments.
    pub payment_frequency: PaymentFrequency,

    /// Obligations of the tenant.
    pub obligations: Vec<Clause>,

    /// Restrictions imposed on the tenant.
    pub restrictions: Vec<Clause>,

    /// Dispute resolution [`Clause`] of the agreement.
    pub dispute_resolution: Clause,
}

impl RentalDetails {
    /// Renders these [`RentalDetails`] as templated legal [`Terms`] text.
    #[must_use]
    pub fn render_terms(&self) -> Terms {
        let Self {
            landlord_name,
            tenant_name,
            property_address,
            period,
            rent,
            security_deposit,
            payment_frequency,
            obligations,
            restrictions,
            dispute_resolution,
        } = self;

        let mut text = format!(
            "RENTAL AGREEMENT\n\
             \n\
             This agreement is made between {landlord_name} (the Landlord) \
             and {tenant_name} (the Tenant) for the property at \
             {property_address}.\n\
             \n\
             1. TERM. The rental period runs from {start} to {end} \
             inclusive ({days} days).\n\
             2. RENT. The total rent for the term is {rent}, payable \
             {payment_frequency}.\n\
             3. SECURITY DEPOSIT. The Tenant shall pay a security deposit \
             of {security_deposit} before move-in.\n\
             4. TENANT OBLIGATIONS.\n",
            start = period.start(),
            end = period.end(),
            days = period.day_count(),
            payment_frequency = payment_frequency.adverb(),
        );
        for (n, clause) in (1..).zip(obligations) {
            text.push_str(&format!("   4.{n}. {clause}\n"));
        }
        text.push_str("5. RESTRICTIONS.\n");
        for (n, clause) in (1..).zip(restrictions) {
            text.push_str(&format!("   5.{n}. {clause}\n"));
        }
        text.push_str(&format!("6. DISPUTES. {dispute_resolution}\n"));

        Terms::from_rendered(text)
    }
}

define_kind! {
    #[doc = "Frequency of rent instalments."]
    enum PaymentFrequency {
        #[doc = "Rent is paid weekly."]
        Weekly = 1,

        #[doc = "Rent is paid monthly."]
        Monthly = 2,

        #[doc = "Rent is paid quarterly."]
        Quarterly = 3,
    }
}

impl PaymentFrequency {
    /// Derives a [`PaymentFrequency`] from the rental day count.
    #[must_use]
    pub fn from_day_count(days: u32) -> Self {
        if days <= 7 {
            Self::Weekly
        } else if days <= 35 {
            Self::Monthly
        } else {
            Self::Quarterly
        }
    }

    /// Returns this [`PaymentFrequency`] as an English adverb for use in
    /// rendered legal text.
    #[must_use]
    pub fn adverb(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }
}

/// Single clause of a rental agreement.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Clause(String);

impl Clause {
    /// Standard obligations applied to every generated rental [`Contract`].
    #[must_use]
    pub fn standard_obligations() -> Vec<Self> {
        [
            "Keep the property clean and in good condition.",
            "Report damages and required repairs without delay.",
            "Pay all agreed amounts on time.",
            "Return the property in its original condition at the end of \
             the term.",
        ]
        .into_iter()
        .map(|s| Self(s.to_owned()))
        .collect()
    }

    /// Standard restrictions applied to every generated rental [`Contract`].
    #[must_use]
    pub fn standard_restrictions() -> Vec<Self> {
        [
            "No subletting without the Landlord's written consent.",
            "No structural alterations to the property.",
            "Occupancy must not exceed the declared guest count.",
        ]
        .into_iter()
        .map(|s| Self(s.to_owned()))
        .collect()
    }

    /// Standard dispute resolution clause.
    #[must_use]
    pub fn standard_dispute_resolution() -> Self {
        Self(
            "Any dispute arising out of this agreement shall first be \
             subject to good-faith negotiation between the parties, and \
             failing that, to binding arbitration at the property's \
             jurisdiction."
                .to_owned(),
        )
    }
}

#[cfg(test)]
mod spec {
    use common::DateRange;

    use crate::domain::{property, user};

    use super::{Clause, PaymentFrequency, RentalDetails};

    #[test]
    fn frequency_thresholds() {
        assert_eq!(PaymentFrequency::from_day_count(1), PaymentFrequency::Weekly);
        assert_eq!(PaymentFrequency::from_day_count(7), PaymentFrequency::Weekly);
        assert_eq!(
            PaymentFrequency::from_day_count(8),
            PaymentFrequency::Monthly,
        );
        assert_eq!(
            PaymentFrequency::from_day_count(35),
            PaymentFrequency::Monthly,
        );
        assert_eq!(
            PaymentFrequency::from_day_count(36),
            PaymentFrequency::Quarterly,
        );
    }

    #[test]
    fn renders_all_sections() {
        let details = RentalDetails {
            landlord_name: user::Name::new("John Landlord").unwrap(),
            tenant_name: user::Name::new("Jane Tenant").unwrap(),
            property_address: property::Address::new("1 Main St, Springfield")
                .unwrap(),
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

        let terms = details.render_terms();
        let text: &str = terms.as_ref();

        assert!(text.contains("John Landlord"));
        assert!(text.contains("Jane Tenant"));
        assert!(text.contains("1 Main St, Springfield"));
        assert!(text.contains("from 2025-06-10 to 2025-06-15"));
        assert!(text.contains("(6 days)"));
        assert!(text.contains("1000USD"));
        assert!(text.contains("payable weekly"));
        assert!(text.contains("200USD"));
        assert!(text.contains("4.1."));
        assert!(text.contains("5.1."));
        assert!(text.contains("6. DISPUTES."));
    }
}
