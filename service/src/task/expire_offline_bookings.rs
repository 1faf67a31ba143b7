//! [`ExpireOfflineBookings`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Booking;
use crate::{
    command::{sweep_expired_bookings, Command, SweepExpiredBookings},
    Service,
};

use super::Task;

/// Configuration for [`ExpireOfflineBookings`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between sweeps of unpaid offline [`Booking`]s.
    pub interval: time::Duration,
}

/// [`Task`] periodically sweeping offline [`Booking`]s whose payment
/// deadline has elapsed.
#[derive(Clone, Copy, Debug)]
pub struct ExpireOfflineBookings<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<ExpireOfflineBookings<Self>, Config>>> for Service<Db>
where
    ExpireOfflineBookings<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<ExpireOfflineBookings<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = ExpireOfflineBookings {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::ExpireOfflineBookings` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for ExpireOfflineBookings<Service<Db>>
where
    Service<Db>: Command<
        SweepExpiredBookings,
        Ok = sweep_expired_bookings::Outcome,
        Err = Traced<sweep_expired_bookings::ExecutionError>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let outcome = self
            .service
            .execute(SweepExpiredBookings)
            .await
            .map_err(tracerr::wrap!())?;
        if outcome.swept > 0 {
            log::info!(
                "swept {swept} of {examined} unpaid offline bookings \
                 ({contracts} contracts cancelled)",
                swept = outcome.swept,
                examined = outcome.examined,
                contracts = outcome.contracts_cancelled,
            );
        }
        Ok(())
    }
}

/// Error of [`ExpireOfflineBookings`] execution.
pub type ExecutionError = Traced<sweep_expired_bookings::ExecutionError>;
