//! Availability-related endpoints.

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use common::{Date, DateRange, Handler as _};
use serde::{Deserialize, Serialize};
use service::{domain::property, query, read};

use crate::{api, define_error, AsError, Error, Service};

/// Availability calendar of a property for one month.
#[derive(Clone, Debug, Serialize)]
pub struct Calendar {
    /// [`Day`]s of the requested month.
    pub days: Vec<Day>,
}

impl From<read::Calendar> for Calendar {
    fn from(read::Calendar(days): read::Calendar) -> Self {
        Self {
            days: days.into_iter().map(Into::into).collect(),
        }
    }
}

/// Single day in a [`Calendar`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Day {
    /// Calendar date of this [`Day`].
    pub date: Date,

    /// Indicator whether this [`Day`] may be booked.
    pub available: bool,

    /// Indicator whether some booking occupies this [`Day`].
    pub booked: bool,

    /// Indicator whether this [`Day`] lies in the past.
    pub blocked: bool,

    /// Price of renting the property on this [`Day`].
    pub price: api::Money,
}

impl From<read::availability::Day> for Day {
    fn from(day: read::availability::Day) -> Self {
        Self {
            date: day.date,
            available: day.available,
            booked: day.booked,
            blocked: day.blocked,
            price: day.price.into(),
        }
    }
}

/// Query parameters of the [`calendar`] endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CalendarParams {
    /// 1-indexed calendar month.
    pub month: u8,

    /// Calendar year.
    pub year: i32,
}

/// `GET /properties/{id}/availability` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION` - provided month is not a calendar month;
/// - `PROPERTY_NOT_EXISTS` - no property with the provided ID.
pub async fn calendar(
    Extension(service): Extension<Service>,
    Path(property_id): Path<property::Id>,
    Query(CalendarParams { month, year }): Query<CalendarParams>,
) -> Result<Json<Calendar>, Error> {
    service
        .execute(query::availability::Calendar {
            property_id,
            month: read::availability::Month { year, month },
        })
        .await
        .map_err(AsError::into_error)
        .map(|calendar| Json(calendar.into()))
}

/// Body of the [`check`] endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct CheckBody {
    /// First occupied date, inclusive.
    pub start_date: Date,

    /// Last occupied date, inclusive.
    pub end_date: Date,
}

/// Result of checking a requested date range against existing bookings.
#[derive(Clone, Debug, Serialize)]
pub struct CheckResult {
    /// Indicator whether the whole requested range is free.
    pub available: bool,

    /// Days of the requested range occupied by existing bookings.
    pub blocked_dates: Vec<Date>,
}

impl From<read::availability::Conflict> for CheckResult {
    fn from(conflict: read::availability::Conflict) -> Self {
        Self {
            available: conflict.available,
            blocked_dates: conflict.blocked_dates,
        }
    }
}

/// `POST /properties/{id}/check-availability` handler.
///
/// This is the advisory pre-check only: the authoritative one is re-done
/// inside the booking creation transaction.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION` - `end_date` precedes `start_date`;
/// - `PROPERTY_NOT_EXISTS` - no property with the provided ID.
pub async fn check(
    Extension(service): Extension<Service>,
    Path(property_id): Path<property::Id>,
    Json(CheckBody {
        start_date,
        end_date,
    }): Json<CheckBody>,
) -> Result<Json<CheckResult>, Error> {
    let range = DateRange::new(start_date, end_date).ok_or_else(|| {
        api::validation("`end_date` must not precede `start_date`")
    })?;

    service
        .execute(query::availability::Conflict { property_id, range })
        .await
        .map_err(AsError::into_error)
        .map(|conflict| Json(conflict.into()))
}

impl AsError for query::availability::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "VALIDATION"]
                #[status = BAD_REQUEST]
                #[message = "Provided month is not a calendar month"]
                InvalidMonth,

                #[code = "PROPERTY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Property` with the provided ID does not exist"]
                PropertyNotExists,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::InvalidMonth(_) => Error::InvalidMonth.into(),
            Self::PropertyNotExists(_) => Error::PropertyNotExists.into(),
        })
    }
}
