//! [`Command`] sweeping offline [`Booking`]s with an elapsed payment
//! deadline.

use common::{
    operations::{By, Select, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Contract;
use crate::{
    domain::{contract, Booking},
    infra::{database, Database},
    read,
    Service,
};

use super::Command;

/// [`Command`] sweeping offline [`Booking`]s whose payment deadline has
/// elapsed.
///
/// Normally driven by [`task::ExpireOfflineBookings`], but also triggerable
/// on demand.
///
/// [`task::ExpireOfflineBookings`]: crate::task::ExpireOfflineBookings
#[derive(Clone, Copy, Debug, Default)]
pub struct SweepExpiredBookings;

/// Outcome of a [`SweepExpiredBookings`] run.
#[derive(Clone, Copy, Debug, Default)]
pub struct Outcome {
    /// Number of [`Booking`]s found eligible.
    pub examined: usize,

    /// Number of [`Booking`]s actually cancelled.
    pub swept: usize,

    /// Number of linked [`Contract`]s cancelled alongside.
    pub contracts_cancelled: usize,
}

impl<Db> Command<SweepExpiredBookings> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Booking>, read::booking::Sweepable>>,
            Ok = Vec<Booking>,
            Err = Traced<database::Error>,
        > + Database<
            Update<read::booking::Sweep>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<
            Update<read::contract::Sweep>,
            Ok = bool,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Outcome;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        _: SweepExpiredBookings,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let candidates = self
            .database()
            .execute(Select(By::new(read::booking::Sweepable {
                now: DateTime::now().coerce(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut outcome = Outcome {
            examined: candidates.len(),
            ..Outcome::default()
        };

        // One record failing (or losing the race to a payment) must not
        // abort the whole sweep.
        for booking in candidates {
            let swept = match self
                .database()
                .execute(Update(read::booking::Sweep(booking.id)))
                .await
            {
                Ok(swept) => swept,
                Err(e) => {
                    log::error!(
                        "failed to sweep `Booking(id: {id})`: {e}",
                        id = booking.id,
                    );
                    continue;
                }
            };
            if !swept {
                // A concurrent payment won; leave the `Booking` alone.
                continue;
            }
            outcome.swept += 1;
            log::info!(
                "swept unpaid offline `Booking(id: {id})`",
                id = booking.id,
            );

            let Some(contract_id) = booking.metadata.contract_id else {
                continue;
            };
            match self.cancel_contract(contract_id).await {
                Ok(true) => outcome.contracts_cancelled += 1,
                Ok(false) => {}
                Err(e) => {
                    log::error!(
                        "failed to cancel `Contract(id: {contract_id})` of \
                         swept `Booking(id: {id})`: {e}",
                        id = booking.id,
                    );
                }
            }
        }

        Ok(outcome)
    }
}

impl<Db> Service<Db>
where
    Db: Database<
        Update<read::contract::Sweep>,
        Ok = bool,
        Err = Traced<database::Error>,
    >,
{
    /// Cancels the [`Contract`] linked to a swept [`Booking`].
    ///
    /// Returns whether the [`Contract`] actually changed. The write is
    /// conditional and status-only, so a terminal [`Contract`] stays as is
    /// and a signature captured meanwhile survives.
    async fn cancel_contract(
        &self,
        contract_id: contract::Id,
    ) -> Result<bool, Traced<database::Error>> {
        self.database()
            .execute(Update(read::contract::Sweep(contract_id)))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`SweepExpiredBookings`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}
