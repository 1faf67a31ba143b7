//! Booking-related endpoints.

use axum::{extract::Path, Extension, Json};
use common::{Date, DateRange, Handler as _};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{self, booking, contract, property, user},
    query, read,
};

use crate::{api, define_error, AsError, Error, Service};

/// A booking.
#[derive(Clone, Debug, Serialize)]
pub struct Booking {
    /// ID of this [`Booking`].
    pub id: booking::Id,

    /// ID of the booked property.
    pub property_id: property::Id,

    /// ID of the user renting the property.
    pub tenant_id: user::Id,

    /// ID of the user listing the property.
    pub owner_id: user::Id,

    /// First occupied date, inclusive.
    pub start_date: Date,

    /// Last occupied date, inclusive.
    pub end_date: Date,

    /// Number of guests staying.
    pub guest_count: i32,

    /// Total amount to be paid for this [`Booking`].
    pub total_amount: api::Money,

    /// Surcharge applied for guests above the property baseline, if any.
    pub extra_guest_surcharge: Option<api::Money>,

    /// Lifecycle status of this [`Booking`].
    pub status: booking::Status,

    /// Payment status of this [`Booking`].
    pub payment_status: booking::PaymentStatus,

    /// Way this [`Booking`] is paid for.
    pub reservation_type: booking::ReservationType,

    /// Deadline for completing an offline payment, as an RFC 3339 string.
    pub payment_deadline: Option<String>,

    /// Snapshot of the tenant's contact details.
    pub contact_info: ContactInfo,

    /// ID of the contract derived from this [`Booking`], if generated.
    pub contract_id: Option<contract::Id>,

    /// Indicator whether contract generation succeeded.
    pub contract_generated: Option<bool>,

    /// Indicator whether the generated contract was emailed to the tenant.
    pub contract_sent_to_email: Option<bool>,

    /// Moment this [`Booking`] was created at, as an RFC 3339 string.
    pub created_at: String,
}

impl From<domain::Booking> for Booking {
    fn from(booking: domain::Booking) -> Self {
        Self {
            id: booking.id,
            property_id: booking.property_id,
            tenant_id: booking.tenant_id,
            owner_id: booking.owner_id,
            start_date: booking.range.start(),
            end_date: booking.range.end(),
            guest_count: booking.guest_count.into(),
            total_amount: booking.total_amount.into(),
            extra_guest_surcharge: booking
                .extra_guest_surcharge
                .map(Into::into),
            status: booking.status,
            payment_status: booking.payment_status,
            reservation_type: booking.reservation_type,
            payment_deadline: booking
                .payment_deadline
                .map(|deadline| deadline.to_rfc3339()),
            contact_info: ContactInfo {
                full_name: booking.contact_info.full_name.to_string(),
                email: booking.contact_info.email.to_string(),
                phone: booking.contact_info.phone.to_string(),
                id_number: booking.contact_info.id_number.to_string(),
            },
            contract_id: booking.metadata.contract_id,
            contract_generated: booking.metadata.contract_generated,
            contract_sent_to_email: booking.metadata.contract_sent_to_email,
            created_at: booking.created_at.to_rfc3339(),
        }
    }
}

/// Contact details of a tenant.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContactInfo {
    /// Full legal name of the tenant.
    pub full_name: String,

    /// Email address of the tenant.
    pub email: String,

    /// Phone number of the tenant.
    pub phone: String,

    /// Number of the tenant's identity document.
    pub id_number: String,
}

impl TryFrom<ContactInfo> for booking::ContactInfo {
    type Error = Error;

    fn try_from(value: ContactInfo) -> Result<Self, Self::Error> {
        let ContactInfo {
            full_name,
            email,
            phone,
            id_number,
        } = value;
        Ok(Self {
            full_name: user::Name::new(full_name)
                .ok_or_else(|| api::validation("invalid `full_name`"))?,
            email: user::Email::new(email)
                .ok_or_else(|| api::validation("invalid `email`"))?,
            phone: user::Phone::new(phone)
                .ok_or_else(|| api::validation("invalid `phone`"))?,
            id_number: booking::IdNumber::new(id_number)
                .ok_or_else(|| api::validation("invalid `id_number`"))?,
        })
    }
}

/// Body of the [`create`] endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateBody {
    /// ID of the property to book.
    pub property_id: property::Id,

    /// ID of the user booking the property.
    pub tenant_id: user::Id,

    /// First occupied date, inclusive.
    pub start_date: Date,

    /// Last occupied date, inclusive.
    pub end_date: Date,

    /// Number of guests staying.
    pub guest_count: i32,

    /// Way the booking will be paid for.
    pub reservation_type: booking::ReservationType,

    /// Surcharge for guests above the property baseline, if agreed.
    pub extra_guest_surcharge: Option<api::Money>,

    /// Contact details of the tenant.
    pub contact_info: ContactInfo,
}

/// Response of the [`create`] endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct CreateResult {
    /// The created [`Booking`].
    pub booking: Booking,

    /// Indicator whether a contract was generated alongside.
    pub contract_generated: bool,
}

/// `POST /bookings` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION` - malformed dates, guest count or contact details;
/// - `CONFLICT` - requested dates are occupied (`blocked_dates` attached);
/// - `PROPERTY_NOT_EXISTS`/`USER_NOT_EXISTS` - unknown referenced entity.
pub async fn create(
    Extension(service): Extension<Service>,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<CreateResult>), Error> {
    let CreateBody {
        property_id,
        tenant_id,
        start_date,
        end_date,
        guest_count,
        reservation_type,
        extra_guest_surcharge,
        contact_info,
    } = body;

    let range = DateRange::new(start_date, end_date).ok_or_else(|| {
        api::validation("`end_date` must not precede `start_date`")
    })?;
    let guest_count = booking::GuestCount::new(guest_count)
        .ok_or_else(|| api::validation("`guest_count` must be positive"))?;

    let booking = service
        .execute(command::CreateBooking {
            property_id,
            tenant_id,
            range,
            guest_count,
            reservation_type,
            extra_guest_surcharge: extra_guest_surcharge.map(Into::into),
            contact_info: contact_info.try_into()?,
        })
        .await
        .map_err(AsError::into_error)?;

    let contract_generated =
        booking.metadata.contract_generated.unwrap_or(false);
    Ok((
        StatusCode::CREATED,
        Json(CreateResult {
            booking: booking.into(),
            contract_generated,
        }),
    ))
}

define_error! {
    enum QueryError {
        #[code = "BOOKING_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Booking` with the provided ID does not exist"]
        NotExists,
    }
}

/// `GET /bookings/{id}` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `BOOKING_NOT_EXISTS` - no booking with the provided ID.
pub async fn by_id(
    Extension(service): Extension<Service>,
    Path(id): Path<booking::Id>,
) -> Result<Json<Booking>, Error> {
    service
        .execute(query::booking::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| QueryError::NotExists.into())
        .map(|booking| Json(booking.into()))
}

/// `GET /bookings/user/{user_id}` handler.
///
/// Returns bookings made by the provided tenant, newest first.
///
/// # Errors
///
/// Errors with `INTERNAL_SERVER_ERROR` only.
pub async fn of_tenant(
    Extension(service): Extension<Service>,
    Path(user_id): Path<user::Id>,
) -> Result<Json<Vec<Booking>>, Error> {
    service
        .execute(query::bookings::OfTenant::by(read::booking::OfTenant(
            user_id,
        )))
        .await
        .map_err(AsError::into_error)
        .map(|bookings| {
            Json(bookings.into_iter().map(Into::into).collect())
        })
}

/// `GET /bookings/agent/{agent_id}` handler.
///
/// Returns bookings upon properties listed by the provided agent, newest
/// first.
///
/// # Errors
///
/// Errors with `INTERNAL_SERVER_ERROR` only.
pub async fn of_agent(
    Extension(service): Extension<Service>,
    Path(agent_id): Path<user::Id>,
) -> Result<Json<Vec<Booking>>, Error> {
    service
        .execute(query::bookings::OfAgent::by(read::booking::OfAgent(
            agent_id,
        )))
        .await
        .map_err(AsError::into_error)
        .map(|bookings| {
            Json(bookings.into_iter().map(Into::into).collect())
        })
}

/// Body of the [`update_status`] endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct UpdateStatusBody {
    /// Lifecycle status to transition into.
    pub status: Option<booking::Status>,

    /// Payment status to transition into.
    pub payment_status: Option<booking::PaymentStatus>,
}

/// `PATCH /bookings/{id}/status` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `BOOKING_NOT_EXISTS` - no booking with the provided ID;
/// - `ILLEGAL_TRANSITION` - requested transition is not allowed.
pub async fn update_status(
    Extension(service): Extension<Service>,
    Path(booking_id): Path<booking::Id>,
    Json(UpdateStatusBody {
        status,
        payment_status,
    }): Json<UpdateStatusBody>,
) -> Result<Json<Booking>, Error> {
    service
        .execute(command::UpdateBookingStatus {
            booking_id,
            status,
            payment_status,
        })
        .await
        .map_err(AsError::into_error)
        .map(|booking| Json(booking.into()))
}

/// `PATCH /bookings/{id}/cancel` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `BOOKING_NOT_EXISTS` - no booking with the provided ID;
/// - `BOOKING_COMPLETED` - completed bookings cannot be cancelled.
pub async fn cancel(
    Extension(service): Extension<Service>,
    Path(booking_id): Path<booking::Id>,
) -> Result<Json<Booking>, Error> {
    service
        .execute(command::CancelBooking { booking_id })
        .await
        .map_err(AsError::into_error)
        .map(|booking| Json(booking.into()))
}

/// `POST /bookings/{id}/authorize-payment` handler.
///
/// Succeeds only when the linked contract is fully signed and active,
/// returning the contract the payment is authorized against.
///
/// # Errors
///
/// Possible error codes:
/// - `BOOKING_NOT_EXISTS` - no booking with the provided ID;
/// - `CONTRACT_NOT_GENERATED` - the booking has no linked contract;
/// - `PAYMENT_NOT_PENDING` - the booking payment is already settled;
/// - `PAYMENT_NOT_READY` - the linked contract is not fully signed yet.
pub async fn authorize_payment(
    Extension(service): Extension<Service>,
    Path(booking_id): Path<booking::Id>,
) -> Result<Json<super::contract::Contract>, Error> {
    service
        .execute(command::AuthorizePayment { booking_id })
        .await
        .map_err(AsError::into_error)
        .map(|contract| Json(contract.into()))
}

impl AsError for command::create_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "VALIDATION"]
                #[status = BAD_REQUEST]
                #[message = "Surcharge currency differs from the property \
                             price currency"]
                CurrencyMismatch,

                #[code = "CONFLICT"]
                #[status = CONFLICT]
                #[message = "Requested dates are already booked"]
                DatesUnavailable,

                #[code = "PROPERTY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Property` with the provided ID does not exist"]
                PropertyNotExists,

                #[code = "VALIDATION"]
                #[status = BAD_REQUEST]
                #[message = "Requested range starts in the past"]
                StartDateInPast,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the provided ID does not exist"]
                UserNotExists,
            }
        }

        Some(match self {
            Self::CurrencyMismatch { .. } => Error::CurrencyMismatch.into(),
            Self::DatesUnavailable(conflict) => {
                crate::Error::from(Error::DatesUnavailable)
                    .with_blocked_dates(conflict.blocked_dates.clone())
            }
            Self::Db(e) => return e.try_as_error(),
            Self::PropertyNotExists(_) => Error::PropertyNotExists.into(),
            Self::StartDateInPast(_) => Error::StartDateInPast.into(),
            Self::UserNotExists(_) => Error::UserNotExists.into(),
        })
    }
}

impl AsError for command::update_booking_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BOOKING_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Booking` with the provided ID does not exist"]
                BookingNotExists,

                #[code = "ILLEGAL_TRANSITION"]
                #[status = CONFLICT]
                #[message = "Requested status transition is not allowed"]
                IllegalTransition,
            }
        }

        Some(match self {
            Self::BookingNotExists(_) => Error::BookingNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::IllegalPaymentTransition { .. }
            | Self::IllegalStatusTransition { .. } => {
                Error::IllegalTransition.into()
            }
        })
    }
}

impl AsError for command::cancel_booking::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BOOKING_COMPLETED"]
                #[status = CONFLICT]
                #[message = "Completed `Booking`s cannot be cancelled"]
                AlreadyCompleted,

                #[code = "BOOKING_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Booking` with the provided ID does not exist"]
                BookingNotExists,
            }
        }

        Some(match self {
            Self::AlreadyCompleted(_) => Error::AlreadyCompleted.into(),
            Self::BookingNotExists(_) => Error::BookingNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::authorize_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BOOKING_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Booking` with the provided ID does not exist"]
                BookingNotExists,

                #[code = "CONTRACT_NOT_GENERATED"]
                #[status = CONFLICT]
                #[message = "`Booking` has no generated `Contract`"]
                ContractNotGenerated,

                #[code = "PAYMENT_NOT_PENDING"]
                #[status = CONFLICT]
                #[message = "`Booking` payment is not pending anymore"]
                PaymentNotPending,

                #[code = "PAYMENT_NOT_READY"]
                #[status = CONFLICT]
                #[message = "`Contract` must be signed by both parties \
                             before payment"]
                PaymentNotReady,
            }
        }

        Some(match self {
            Self::BookingNotExists(_) => Error::BookingNotExists.into(),
            Self::ContractNotGenerated(_) => {
                Error::ContractNotGenerated.into()
            }
            Self::Db(e) => return e.try_as_error(),
            Self::PaymentNotPending(_) => Error::PaymentNotPending.into(),
            Self::PaymentNotReady { .. } => Error::PaymentNotReady.into(),
        })
    }
}
