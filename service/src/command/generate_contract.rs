//! [`Command`] for generating a [`Contract`] out of a reservation.

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted, Update},
    DateRange, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        booking, contract,
        contract::rental_details::{Clause, PaymentFrequency, RentalDetails},
        property, user, Booking, Contract, Property, User,
    },
    infra::{collaborators::Notification, database, Database},
    read,
    Service,
};

use super::Command;

/// [`Command`] for generating a [`Contract`] out of a reservation.
///
/// Both [`Source`]s converge on the very same [`Contract`] shape, so
/// everything downstream (signing, activation, payment gating) is agnostic
/// of the creation path.
#[derive(Clone, Debug)]
pub struct GenerateContract {
    /// [`Source`] to generate a [`Contract`] from.
    pub source: Source,
}

/// Source of a generated [`Contract`].
#[derive(Clone, Debug)]
pub enum Source {
    /// Existing [`Booking`] to derive the [`Contract`] from.
    FromBooking(booking::Id),

    /// Checkout-first flow: the client signs at reservation time, before
    /// any [`Booking`] row exists.
    FromReservation(Reservation),
}

/// Reservation details of the checkout-first flow.
#[derive(Clone, Debug)]
pub struct Reservation {
    /// ID of the [`Property`] being reserved.
    pub property_id: property::Id,

    /// ID of the [`User`] reserving the [`Property`].
    pub client_id: user::Id,

    /// Inclusive [`DateRange`] of the reservation.
    pub range: DateRange,

    /// Way the reservation will be paid for.
    pub reservation_type: booking::ReservationType,

    /// Client [`Signature`] captured at checkout.
    ///
    /// [`Signature`]: contract::Signature
    pub signature: contract::Signature,
}

impl<Db> Command<GenerateContract> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Update<read::contract::Document>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Update<read::booking::Metadata>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<Insert<Contract>, Err = Traced<database::Error>>
        + Database<
            Update<read::booking::Metadata>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        GenerateContract { source }: GenerateContract,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        /// [`Source`] with its [`Booking`] loaded.
        enum Loaded {
            /// Loaded [`Booking`] to derive the [`Contract`] from.
            Booking(Box<Booking>),

            /// Checkout-first [`Reservation`].
            Reservation(Reservation),
        }

        let loaded = match source {
            Source::FromBooking(id) => {
                let booking = self
                    .database()
                    .execute(Select(By::<Option<Booking>, _>::new(id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::BookingNotExists(id))
                    .map_err(tracerr::wrap!())?;
                if booking.metadata.contract_id.is_some() {
                    return Err(tracerr::new!(E::ContractAlreadyGenerated(id)));
                }
                Loaded::Booking(Box::new(booking))
            }
            Source::FromReservation(reservation) => {
                Loaded::Reservation(reservation)
            }
        };

        let property_id = match &loaded {
            Loaded::Booking(b) => b.property_id,
            Loaded::Reservation(r) => r.property_id,
        };
        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let landlord = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(property.owner_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(property.owner_id))
            .map_err(tracerr::wrap!())?;

        let (mut contract, booking) = match loaded {
            Loaded::Booking(booking) => {
                let contract = build(
                    &property,
                    &landlord,
                    booking.tenant_id,
                    booking.contact_info.full_name.clone(),
                    Some(booking.id),
                    booking.range,
                    booking.total_amount,
                    booking.reservation_type,
                );
                (contract, Some(*booking))
            }
            Loaded::Reservation(reservation) => {
                let client = self
                    .database()
                    .execute(Select(By::<Option<User>, _>::new(
                        reservation.client_id,
                    )))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::UserNotExists(reservation.client_id))
                    .map_err(tracerr::wrap!())?;

                let amount = property
                    .daily_price
                    .times(reservation.range.day_count());
                let mut contract = build(
                    &property,
                    &landlord,
                    client.id,
                    client.name.clone(),
                    None,
                    reservation.range,
                    amount,
                    reservation.reservation_type,
                );
                _ = contract
                    .sign_as_client(reservation.signature)
                    .map_err(tracerr::from_and_wrap!(=> E))?;
                (contract, None)
            }
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Insert(contract.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = booking;
        if let Some(booking) = &mut booking {
            booking.metadata.contract_id = Some(contract.id);
            booking.metadata.contract_generated = Some(true);
            tx.execute(Update(read::booking::Metadata {
                id: booking.id,
                metadata: booking.metadata.clone(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // Rendering and delivery are best-effort follow-ups: the `Contract`
        // is already persisted, so their failures only log.
        match self
            .collaborators()
            .document_renderer
            .render(&contract)
            .await
        {
            Ok(url) => {
                contract.signed_document_url = Some(url.clone());
                // URL-only patch: the row may have moved on.
                if let Err(e) = self
                    .database()
                    .execute(Update(read::contract::Document {
                        id: contract.id,
                        url,
                    }))
                    .await
                {
                    log::warn!(
                        "failed to store the document URL of \
                         `Contract(id: {id})`: {e}",
                        id = contract.id,
                    );
                }
            }
            Err(e) => {
                log::warn!(
                    "failed to render `Contract(id: {id})`: {e}",
                    id = contract.id,
                );
            }
        }

        let email = booking
            .as_ref()
            .map(|b| b.contact_info.email.clone())
            .or(landlord.email.clone());
        if let Some(email) = email {
            match self
                .collaborators()
                .notifier
                .notify(Notification::ContractReady {
                    contract_id: contract.id,
                    email,
                })
                .await
            {
                Ok(()) => {
                    if let Some(mut booking) = booking {
                        booking.metadata.contract_sent_to_email = Some(true);
                        // Metadata-only patch: the row may have moved on.
                        if let Err(e) = self
                            .database()
                            .execute(Update(read::booking::Metadata {
                                id: booking.id,
                                metadata: booking.metadata,
                            }))
                            .await
                        {
                            log::warn!(
                                "failed to mark `Contract(id: {id})` as \
                                 delivered: {e}",
                                id = contract.id,
                            );
                        }
                    }
                }
                Err(e) => {
                    log::warn!(
                        "failed to deliver `Contract(id: {id})`: {e}",
                        id = contract.id,
                    );
                }
            }
        }

        Ok(contract)
    }
}

/// Assembles a [`Contract`] out of the provided reservation parameters.
#[expect(clippy::too_many_arguments, reason = "plain constructor")]
fn build(
    property: &Property,
    landlord: &User,
    client_id: user::Id,
    tenant_name: user::Name,
    booking_id: Option<booking::Id>,
    range: DateRange,
    amount: Money,
    reservation_type: booking::ReservationType,
) -> Contract {
    let commission_rate = Contract::commission_rate();
    let commission = amount.percentage(commission_rate);
    let security_deposit = amount.percentage(Contract::security_deposit_rate());

    let rental_details = RentalDetails {
        landlord_name: landlord.name.clone(),
        tenant_name,
        property_address: property.address.clone(),
        period: range,
        rent: amount,
        security_deposit,
        payment_frequency: PaymentFrequency::from_day_count(range.day_count()),
        obligations: Clause::standard_obligations(),
        restrictions: Clause::standard_restrictions(),
        dispute_resolution: Clause::standard_dispute_resolution(),
    };
    let terms = rental_details.render_terms();

    let address = &property.address;
    let title =
        contract::Title::new(format!("Rental agreement for {address}"))
            .expect("derived from validated fields");
    let description = contract::Description::new(format!(
        "Rental of {address} from {start} to {end}",
        start = range.start(),
        end = range.end(),
    ))
    .expect("derived from validated fields");

    Contract {
        id: contract::Id::new(),
        kind: contract::Kind::Rental,
        agent_id: property.agent_id,
        client_id,
        property_id: property.id,
        booking_id,
        title,
        description,
        terms,
        amount,
        commission_rate,
        commission,
        security_deposit,
        start_date: range.start(),
        end_date: Some(range.end()),
        status: contract::Status::Draft,
        reservation_type,
        agent_signature: None,
        client_signature: None,
        rental_details,
        signed_document_url: None,
        revocation_reason: None,
        created_at: DateTime::now().coerce(),
    }
}

/// Error of [`GenerateContract`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Booking`] already has a generated [`Contract`].
    #[display("`Booking(id: {_0})` already has a generated `Contract`")]
    ContractAlreadyGenerated(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// Captured signature cannot be recorded.
    #[display("cannot record the captured signature: {_0}")]
    #[from]
    Signing(contract::SigningError),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::{DateRange, DateTime};

    use crate::domain::{
        contract::{rental_details::PaymentFrequency, Status},
        property, user, Property, User,
    };

    use super::build;

    fn property(daily_price: &str) -> Property {
        Property {
            id: property::Id::new(),
            owner_id: user::Id::new(),
            agent_id: user::Id::new(),
            title: property::Title::new("Seaside flat").unwrap(),
            address: property::Address::new("1 Main St, Springfield").unwrap(),
            daily_price: daily_price.parse().unwrap(),
            created_at: DateTime::now().coerce(),
        }
    }

    fn landlord() -> User {
        User {
            id: user::Id::new(),
            name: user::Name::new("John Landlord").unwrap(),
            email: None,
            phone: None,
            signature: None,
            created_at: DateTime::now().coerce(),
        }
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    #[test]
    fn derives_commission_deposit_and_frequency() {
        let contract = build(
            &property("100USD"),
            &landlord(),
            user::Id::new(),
            user::Name::new("Jane Tenant").unwrap(),
            None,
            range("2025-06-10", "2025-06-15"),
            "1000USD".parse().unwrap(),
            crate::domain::booking::ReservationType::Online,
        );

        assert_eq!(contract.commission, "50USD".parse().unwrap());
        assert_eq!(contract.security_deposit, "200USD".parse().unwrap());
        assert_eq!(
            contract.rental_details.payment_frequency,
            PaymentFrequency::Weekly,
        );
        assert_eq!(contract.status, Status::Draft);
        assert!(contract.booking_id.is_none());
    }

    #[test]
    fn long_rentals_pay_quarterly() {
        let contract = build(
            &property("100USD"),
            &landlord(),
            user::Id::new(),
            user::Name::new("Jane Tenant").unwrap(),
            None,
            range("2025-06-01", "2025-08-31"),
            "9200USD".parse().unwrap(),
            crate::domain::booking::ReservationType::Offline,
        );

        assert_eq!(
            contract.rental_details.payment_frequency,
            PaymentFrequency::Quarterly,
        );
    }

    #[test]
    fn terms_carry_the_parties_and_the_period() {
        let contract = build(
            &property("100USD"),
            &landlord(),
            user::Id::new(),
            user::Name::new("Jane Tenant").unwrap(),
            None,
            range("2025-06-10", "2025-06-15"),
            "600USD".parse().unwrap(),
            crate::domain::booking::ReservationType::Online,
        );

        let terms: &str = contract.terms.as_ref();
        assert!(terms.contains("John Landlord"));
        assert!(terms.contains("Jane Tenant"));
        assert!(terms.contains("1 Main St, Springfield"));
        assert!(terms.contains("(6 days)"));
    }
}
