//! [`Command`] for updating the lifecycle of a [`Booking`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{booking, Booking},
    infra::{collaborators::Notification, database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating the [`booking::Status`] and/or the
/// [`booking::PaymentStatus`] of a [`Booking`].
///
/// Either field may be omitted; the provided ones must form legal
/// transitions.
#[derive(Clone, Copy, Debug)]
pub struct UpdateBookingStatus {
    /// ID of the [`Booking`] to update.
    pub booking_id: booking::Id,

    /// New [`booking::Status`], if it should change.
    pub status: Option<booking::Status>,

    /// New [`booking::PaymentStatus`], if it should change.
    pub payment_status: Option<booking::PaymentStatus>,
}

impl<Db> Command<UpdateBookingStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Booking, booking::Id>>,
            Err = Traced<database::Error>,
        > + Database<Update<Booking>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Booking;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateBookingStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateBookingStatus {
            booking_id,
            status,
            payment_status,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize with the deadline sweeper.
        tx.execute(Lock(By::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut booking = tx
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;

        if let Some(next) = status {
            if !booking.status.can_transition_to(next) {
                return Err(tracerr::new!(E::IllegalStatusTransition {
                    from: booking.status,
                    to: next,
                }));
            }
            booking.status = next;
        }
        if let Some(next) = payment_status {
            if !booking.payment_status.can_transition_to(next) {
                return Err(tracerr::new!(E::IllegalPaymentTransition {
                    from: booking.payment_status,
                    to: next,
                }));
            }
            booking.payment_status = next;
        }

        tx.execute(Update(booking.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if status == Some(booking::Status::Confirmed) {
            if let Err(e) = self
                .collaborators()
                .notifier
                .notify(Notification::BookingConfirmed {
                    booking: booking.clone(),
                })
                .await
            {
                log::warn!(
                    "failed to notify about confirmed \
                     `Booking(id: {booking_id})`: {e}",
                );
            }
        }

        Ok(booking)
    }
}

/// Error of [`UpdateBookingStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Requested [`booking::PaymentStatus`] transition is not legal.
    #[display("illegal payment status transition: {from} -> {to}")]
    IllegalPaymentTransition {
        /// Current [`booking::PaymentStatus`].
        from: booking::PaymentStatus,

        /// Requested [`booking::PaymentStatus`].
        to: booking::PaymentStatus,
    },

    /// Requested [`booking::Status`] transition is not legal.
    #[display("illegal status transition: {from} -> {to}")]
    IllegalStatusTransition {
        /// Current [`booking::Status`].
        from: booking::Status,

        /// Requested [`booking::Status`].
        to: booking::Status,
    },
}
