//! [`Command`] for creating a new [`Booking`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update},
    Date, DateRange, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{booking, property, user, Booking, Contract, Property, User},
    infra::{collaborators::Notification, database, Database},
    read,
    Service,
};

use super::{generate_contract, Command, GenerateContract};

/// [`Command`] for creating a new [`Booking`].
#[derive(Clone, Debug)]
pub struct CreateBooking {
    /// ID of the [`Property`] to book.
    pub property_id: property::Id,

    /// ID of the [`User`] booking the [`Property`].
    pub tenant_id: user::Id,

    /// Inclusive [`DateRange`] to occupy.
    pub range: DateRange,

    /// Number of guests staying.
    pub guest_count: booking::GuestCount,

    /// Way the [`Booking`] will be paid for.
    pub reservation_type: booking::ReservationType,

    /// Surcharge for guests above the [`Property`] baseline, if agreed.
    pub extra_guest_surcharge: Option<Money>,

    /// Snapshot of the tenant's contact details.
    pub contact_info: booking::ContactInfo,
}

impl<Db> Command<CreateBooking> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Update<read::booking::Metadata>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Select<
                By<
                    read::booking::Occupying<Vec<DateRange>>,
                    read::booking::Overlapping,
                >,
            >,
            Ok = read::booking::Occupying<Vec<DateRange>>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
    Self: Command<
        GenerateContract,
        Ok = Contract,
        Err = Traced<generate_contract::ExecutionError>,
    >,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateBooking) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateBooking {
            property_id,
            tenant_id,
            range,
            guest_count,
            reservation_type,
            extra_guest_surcharge,
            contact_info,
        } = cmd;

        if range.start() < Date::today() {
            return Err(tracerr::new!(E::StartDateInPast(range.start())));
        }

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        self.database()
            .execute(Select(By::<Option<User>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(tenant_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let mut total_amount = property.daily_price.times(range.day_count());
        if let Some(surcharge) = extra_guest_surcharge {
            if surcharge.currency != total_amount.currency {
                return Err(tracerr::new!(E::CurrencyMismatch {
                    expected: total_amount.currency,
                    provided: surcharge.currency,
                }));
            }
            total_amount.amount += surcharge.amount;
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent bookings upon the same `Property`.
        tx.execute(Lock(By::new(property.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // Authoritative conflict check, done under the lock: any advisory
        // pre-check the caller did may be stale by now.
        let read::booking::Occupying(occupied) = tx
            .execute(Select(By::new(read::booking::Overlapping {
                property_id: property.id,
                range,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let conflict = read::availability::Conflict::detect(range, &occupied);
        if !conflict.available {
            return Err(tracerr::new!(E::DatesUnavailable(conflict)));
        }

        let now = DateTime::now();
        let payment_deadline = (reservation_type
            == booking::ReservationType::Offline)
            .then(|| (now + self.config().offline_payment_grace).coerce());
        let mut created = Booking {
            id: booking::Id::new(),
            property_id: property.id,
            tenant_id,
            owner_id: property.owner_id,
            range,
            guest_count,
            total_amount,
            extra_guest_surcharge,
            status: booking::Status::Pending,
            payment_status: booking::PaymentStatus::Pending,
            reservation_type,
            payment_deadline,
            contact_info,
            metadata: booking::Metadata::default(),
            created_at: now.coerce(),
        };
        tx.execute(Insert(created.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        // The `Booking` exists from here on: contract generation and
        // notifications are follow-ups that must not undo it.
        match self
            .execute(GenerateContract {
                source: generate_contract::Source::FromBooking(created.id),
            })
            .await
        {
            Ok(contract) => {
                created.metadata.contract_id = Some(contract.id);
                created.metadata.contract_generated = Some(true);
            }
            Err(e) => {
                log::warn!(
                    "failed to generate a `Contract` for \
                     `Booking(id: {id})`: {e}",
                    id = created.id,
                );
                created.metadata.contract_generated = Some(false);
                // Metadata-only patch: the `Booking` row may have moved on.
                if let Err(e) = self
                    .database()
                    .execute(Update(read::booking::Metadata {
                        id: created.id,
                        metadata: created.metadata.clone(),
                    }))
                    .await
                {
                    log::error!(
                        "failed to mark `Booking(id: {id})` for a `Contract` \
                         generation retry: {e}",
                        id = created.id,
                    );
                }
            }
        }

        if let Err(e) = self
            .collaborators()
            .notifier
            .notify(Notification::BookingCreated {
                booking: created.clone(),
            })
            .await
        {
            log::warn!(
                "failed to notify about `Booking(id: {id})`: {e}",
                id = created.id,
            );
        }

        Ok(created)
    }
}

/// Error of [`CreateBooking`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Surcharge currency differs from the [`Property`] price currency.
    #[display(
        "surcharge currency `{provided}` differs from the property price \
         currency `{expected}`"
    )]
    CurrencyMismatch {
        /// [`Currency`] of the [`Property`] price.
        ///
        /// [`Currency`]: common::money::Currency
        expected: common::money::Currency,

        /// [`Currency`] of the provided surcharge.
        ///
        /// [`Currency`]: common::money::Currency
        provided: common::money::Currency,
    },

    /// Requested dates are occupied by existing [`Booking`]s.
    #[display("requested dates are already booked")]
    DatesUnavailable(#[error(not(source))] read::availability::Conflict),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// Requested range starts in the past.
    #[display("requested range starts in the past: {_0}")]
    StartDateInPast(#[error(not(source))] Date),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
