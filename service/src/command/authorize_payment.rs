//! [`Command`] gating payment of a [`Booking`] behind its [`Contract`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{booking, contract, Booking, Contract},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] authorizing payment of a [`Booking`].
///
/// The single payment gate of the system: payment may proceed only once
/// the linked [`Contract`] is signed by both parties and active.
#[derive(Clone, Copy, Debug)]
pub struct AuthorizePayment {
    /// ID of the [`Booking`] to be paid for.
    pub booking_id: booking::Id,
}

impl<Db> Command<AuthorizePayment> for Service<Db>
where
    Db: Database<
            Select<By<Option<Booking>, booking::Id>>,
            Ok = Option<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Contract>, booking::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Contract;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        AuthorizePayment { booking_id }: AuthorizePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let booking = self
            .database()
            .execute(Select(By::<Option<Booking>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::BookingNotExists(booking_id))
            .map_err(tracerr::wrap!())?;
        if booking.payment_status != booking::PaymentStatus::Pending {
            return Err(tracerr::new!(E::PaymentNotPending(
                booking.payment_status,
            )));
        }

        let contract = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(booking_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ContractNotGenerated(booking_id))
            .map_err(tracerr::wrap!())?;
        if !contract.can_proceed_to_payment() {
            return Err(tracerr::new!(E::PaymentNotReady {
                contract_id: contract.id,
                signed_by_agent: contract.signed_by_agent(),
                signed_by_client: contract.signed_by_client(),
                status: contract.status,
            }));
        }

        Ok(contract)
    }
}

/// Error of [`AuthorizePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Booking`] with the provided ID does not exist.
    #[display("`Booking(id: {_0})` does not exist")]
    BookingNotExists(#[error(not(source))] booking::Id),

    /// [`Booking`] has no generated [`Contract`] yet.
    #[display("`Booking(id: {_0})` has no generated `Contract`")]
    ContractNotGenerated(#[error(not(source))] booking::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Booking`] payment is not pending anymore.
    #[display("`Booking` payment is not pending (status: {_0})")]
    PaymentNotPending(#[error(not(source))] booking::PaymentStatus),

    /// Linked [`Contract`] does not allow payment yet.
    #[display(
        "`Contract(id: {contract_id})` does not allow payment yet \
         (agent signed: {signed_by_agent}, client signed: \
         {signed_by_client}, status: {status})"
    )]
    PaymentNotReady {
        /// ID of the linked [`Contract`].
        contract_id: contract::Id,

        /// Indicator whether the agent party has signed.
        signed_by_agent: bool,

        /// Indicator whether the client party has signed.
        signed_by_client: bool,

        /// Current [`contract::Status`].
        status: contract::Status,
    },
}
