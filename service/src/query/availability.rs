//! [`Query`] collection related to [`Property`] availability.

use common::{
    operations::{By, Select},
    Date, DateRange,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{property, Property},
    infra::{database, Database},
    read,
    Service,
};

use super::Query;

/// [`Query`] of the availability [`read::Calendar`] of a [`Property`] for
/// one month.
#[derive(Clone, Copy, Debug)]
pub struct Calendar {
    /// ID of the [`Property`] in question.
    pub property_id: property::Id,

    /// [`Month`] the calendar is requested for.
    ///
    /// [`Month`]: read::availability::Month
    pub month: read::availability::Month,
}

impl<Db> Query<Calendar> for Service<Db>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<
                    read::booking::Occupying<Vec<DateRange>>,
                    read::booking::OfProperty,
                >,
            >,
            Ok = read::booking::Occupying<Vec<DateRange>>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = read::Calendar;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Calendar) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Calendar { property_id, month } = query;

        let days = Date::calendar_month(month.year, month.month)
            .ok_or(E::InvalidMonth(month.month))
            .map_err(tracerr::wrap!())?;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        let read::booking::Occupying(occupied) = self
            .database()
            .execute(Select(By::new(read::booking::OfProperty(property_id))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(read::Calendar::assemble(
            days,
            Date::today(),
            property.daily_price,
            &occupied,
        ))
    }
}

/// [`Query`] checking a requested [`DateRange`] of a [`Property`] against
/// existing [`Booking`]s.
///
/// This is the advisory pre-check only: the authoritative one is re-done
/// inside the booking creation transaction.
///
/// [`Booking`]: crate::domain::Booking
#[derive(Clone, Copy, Debug)]
pub struct Conflict {
    /// ID of the [`Property`] in question.
    pub property_id: property::Id,

    /// Requested inclusive [`DateRange`].
    pub range: DateRange,
}

impl<Db> Query<Conflict> for Service<Db>
where
    Db: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<
                    read::booking::Occupying<Vec<DateRange>>,
                    read::booking::Overlapping,
                >,
            >,
            Ok = read::booking::Occupying<Vec<DateRange>>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = read::availability::Conflict;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Conflict) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Conflict { property_id, range } = query;

        self.database()
            .execute(Select(By::<Option<Property>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let read::booking::Occupying(occupied) = self
            .database()
            .execute(Select(By::new(read::booking::Overlapping {
                property_id,
                range,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(read::availability::Conflict::detect(range, &occupied))
    }
}

/// Error of [`Calendar`] or [`Conflict`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Provided month number is out of the calendar.
    #[display("month `{_0}` is not a calendar month")]
    InvalidMonth(#[error(not(source))] u8),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),
}
