//! Contract-related endpoints.

use axum::{extract::Path, Extension, Json};
use axum_client_ip::InsecureClientIp;
use common::{Date, DateRange, Handler as _};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{
        self, booking, contract,
        contract::{rental_details::PaymentFrequency, signature},
        property, user,
    },
    query,
};

use crate::{api, define_error, AsError, Error, Service};

/// A contract.
#[derive(Clone, Debug, Serialize)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: contract::Id,

    /// Kind of this [`Contract`].
    pub kind: contract::Kind,

    /// ID of the user acting as the agent party.
    pub agent_id: user::Id,

    /// ID of the user acting as the client party.
    pub client_id: user::Id,

    /// ID of the property this [`Contract`] covers.
    pub property_id: property::Id,

    /// ID of the booking this [`Contract`] was derived from, if any.
    pub booking_id: Option<booking::Id>,

    /// Title of this [`Contract`].
    pub title: String,

    /// Description of this [`Contract`].
    pub description: String,

    /// Generated legal terms text of this [`Contract`].
    pub terms: String,

    /// Total amount of this [`Contract`].
    pub amount: api::Money,

    /// Commission rate applied to the amount, in percent.
    pub commission_rate: String,

    /// Commission derived from the amount.
    pub commission: api::Money,

    /// Security deposit due under this [`Contract`].
    pub security_deposit: api::Money,

    /// First day the [`Contract`] covers.
    pub start_date: Date,

    /// Last day the [`Contract`] covers, if bounded.
    pub end_date: Option<Date>,

    /// Status of this [`Contract`].
    pub status: contract::Status,

    /// Way the originating reservation is paid for.
    pub reservation_type: booking::ReservationType,

    /// [`Signature`] of the agent party, once captured.
    pub agent_signature: Option<Signature>,

    /// [`Signature`] of the client party, once captured.
    pub client_signature: Option<Signature>,

    /// Immutable legal terms block of this [`Contract`].
    pub rental_details: RentalDetails,

    /// URL of the final signed document, once rendered.
    pub signed_document_url: Option<String>,

    /// Reason this [`Contract`] was revoked, if it was.
    pub revocation_reason: Option<String>,

    /// Moment this [`Contract`] was created at, as an RFC 3339 string.
    pub created_at: String,
}

impl From<domain::Contract> for Contract {
    fn from(contract: domain::Contract) -> Self {
        Self {
            id: contract.id,
            kind: contract.kind,
            agent_id: contract.agent_id,
            client_id: contract.client_id,
            property_id: contract.property_id,
            booking_id: contract.booking_id,
            title: contract.title.to_string(),
            description: contract.description.to_string(),
            terms: contract.terms.to_string(),
            amount: contract.amount.into(),
            commission_rate: contract.commission_rate.to_string(),
            commission: contract.commission.into(),
            security_deposit: contract.security_deposit.into(),
            start_date: contract.start_date,
            end_date: contract.end_date,
            status: contract.status,
            reservation_type: contract.reservation_type,
            agent_signature: contract.agent_signature.map(Into::into),
            client_signature: contract.client_signature.map(Into::into),
            rental_details: contract.rental_details.into(),
            signed_document_url: contract
                .signed_document_url
                .map(|url| url.to_string()),
            revocation_reason: contract
                .revocation_reason
                .map(|reason| reason.to_string()),
            created_at: contract.created_at.to_rfc3339(),
        }
    }
}

/// Signature captured on a [`Contract`] by one of its parties.
#[derive(Clone, Debug, Serialize)]
pub struct Signature {
    /// Way this [`Signature`] was produced.
    pub kind: signature::Kind,

    /// Image (or typed text) of this [`Signature`].
    pub image: String,

    /// Moment this [`Signature`] was captured at, as an RFC 3339 string.
    pub signed_at: String,

    /// IP address the signing request originated from.
    pub ip: Option<String>,

    /// User agent the signing request originated from.
    pub user_agent: Option<String>,
}

impl From<contract::Signature> for Signature {
    fn from(signature: contract::Signature) -> Self {
        Self {
            kind: signature.kind,
            image: signature.image.to_string(),
            signed_at: signature.signed_at.to_rfc3339(),
            ip: signature.ip.map(|ip| ip.to_string()),
            user_agent: signature.user_agent.map(|ua| ua.to_string()),
        }
    }
}

/// Immutable legal terms block of a [`Contract`].
#[derive(Clone, Debug, Serialize)]
pub struct RentalDetails {
    /// Full legal name of the landlord.
    pub landlord_name: String,

    /// Full legal name of the tenant.
    pub tenant_name: String,

    /// Address of the rented property.
    pub property_address: String,

    /// First day of the rental period, inclusive.
    pub period_start: Date,

    /// Last day of the rental period, inclusive.
    pub period_end: Date,

    /// Rent due per instalment.
    pub rent: api::Money,

    /// Security deposit due under the contract.
    pub security_deposit: api::Money,

    /// Frequency of rent instalments.
    pub payment_frequency: PaymentFrequency,

    /// Obligations of the parties.
    pub obligations: Vec<String>,

    /// Restrictions imposed on the tenant.
    pub restrictions: Vec<String>,

    /// Dispute resolution clause.
    pub dispute_resolution: String,
}

impl From<contract::RentalDetails> for RentalDetails {
    fn from(details: contract::RentalDetails) -> Self {
        Self {
            landlord_name: details.landlord_name.to_string(),
            tenant_name: details.tenant_name.to_string(),
            property_address: details.property_address.to_string(),
            period_start: details.period.start(),
            period_end: details.period.end(),
            rent: details.rent.into(),
            security_deposit: details.security_deposit.into(),
            payment_frequency: details.payment_frequency,
            obligations: details
                .obligations
                .into_iter()
                .map(|clause| clause.to_string())
                .collect(),
            restrictions: details
                .restrictions
                .into_iter()
                .map(|clause| clause.to_string())
                .collect(),
            dispute_resolution: details.dispute_resolution.to_string(),
        }
    }
}

define_error! {
    enum QueryError {
        #[code = "CONTRACT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Contract` with the provided ID does not exist"]
        NotExists,
    }
}

/// Body of the [`generate`] endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct GenerateBody {
    /// ID of the booking to derive the contract from.
    pub booking_id: booking::Id,
}

/// `POST /contracts` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `BOOKING_NOT_EXISTS` - no booking with the provided ID;
/// - `CONTRACT_ALREADY_GENERATED` - the booking already has a contract.
pub async fn generate(
    Extension(service): Extension<Service>,
    Json(GenerateBody { booking_id }): Json<GenerateBody>,
) -> Result<(StatusCode, Json<Contract>), Error> {
    service
        .execute(command::GenerateContract {
            source: command::generate_contract::Source::FromBooking(
                booking_id,
            ),
        })
        .await
        .map_err(AsError::into_error)
        .map(|contract| (StatusCode::CREATED, Json(contract.into())))
}

/// Body of the [`generate_from_reservation`] endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct GenerateFromReservationBody {
    /// ID of the property being reserved.
    pub property_id: property::Id,

    /// ID of the user reserving the property.
    pub client_id: user::Id,

    /// First reserved date, inclusive.
    pub start_date: Date,

    /// Last reserved date, inclusive.
    pub end_date: Date,

    /// Way the reservation will be paid for.
    pub reservation_type: booking::ReservationType,

    /// Client signature captured at checkout.
    pub signature: SignatureBody,
}

/// Signature payload of a signing request.
#[derive(Clone, Debug, Deserialize)]
pub struct SignatureBody {
    /// Way the signature was produced.
    pub kind: signature::Kind,

    /// Image (or typed text) of the signature.
    pub image: String,
}

/// `POST /contracts/from-reservation` handler.
///
/// Checkout-first flow: the client signs at reservation time, before any
/// booking row exists.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION` - malformed dates or signature payload;
/// - `PROPERTY_NOT_EXISTS`/`USER_NOT_EXISTS` - unknown referenced entity.
pub async fn generate_from_reservation(
    Extension(service): Extension<Service>,
    InsecureClientIp(ip): InsecureClientIp,
    headers: HeaderMap,
    Json(body): Json<GenerateFromReservationBody>,
) -> Result<(StatusCode, Json<Contract>), Error> {
    let GenerateFromReservationBody {
        property_id,
        client_id,
        start_date,
        end_date,
        reservation_type,
        signature,
    } = body;

    let range = DateRange::new(start_date, end_date).ok_or_else(|| {
        api::validation("`end_date` must not precede `start_date`")
    })?;
    let image = signature::Image::new(signature.image)
        .ok_or_else(|| api::validation("invalid signature `image`"))?;

    service
        .execute(command::GenerateContract {
            source: command::generate_contract::Source::FromReservation(
                command::generate_contract::Reservation {
                    property_id,
                    client_id,
                    range,
                    reservation_type,
                    signature: contract::Signature {
                        kind: signature.kind,
                        image,
                        signed_at: common::DateTime::now().coerce(),
                        ip: Some(ip.to_string().into()),
                        user_agent: user_agent(&headers),
                    },
                },
            ),
        })
        .await
        .map_err(AsError::into_error)
        .map(|contract| (StatusCode::CREATED, Json(contract.into())))
}

/// Body of the [`sign_as_agent`] endpoint.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SignAsAgentBody {
    /// ID of the user signing as the agent party.
    pub agent_id: user::Id,
}

/// `POST /contracts/{id}/sign/agent` handler.
///
/// The agent signs with the active signature stored on their profile.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTRACT_NOT_EXISTS`/`USER_NOT_EXISTS` - unknown referenced entity;
/// - `NOT_AGENT_OF_CONTRACT` - the user is not the contract's agent party;
/// - `SIGNATURE_NOT_CONFIGURED` - no active profile signature;
/// - `SIGNING_REJECTED` - the contract is not in a signable state.
pub async fn sign_as_agent(
    Extension(service): Extension<Service>,
    Path(contract_id): Path<contract::Id>,
    InsecureClientIp(ip): InsecureClientIp,
    headers: HeaderMap,
    Json(SignAsAgentBody { agent_id }): Json<SignAsAgentBody>,
) -> Result<Json<Contract>, Error> {
    service
        .execute(command::SignContractAsAgent {
            contract_id,
            agent_id,
            ip: Some(ip.to_string().into()),
            user_agent: user_agent(&headers),
        })
        .await
        .map_err(AsError::into_error)
        .map(|contract| Json(contract.into()))
}

/// Body of the [`sign_as_client`] endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct SignAsClientBody {
    /// ID of the user signing as the client party.
    pub client_id: user::Id,

    /// Signature payload captured on the client device.
    #[serde(flatten)]
    pub signature: SignatureBody,
}

/// `POST /contracts/{id}/sign/client` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION` - malformed signature payload;
/// - `CONTRACT_NOT_EXISTS` - no contract with the provided ID;
/// - `NOT_CLIENT_OF_CONTRACT` - the user is not the contract's client party;
/// - `SIGNING_REJECTED` - the contract is not in a signable state.
pub async fn sign_as_client(
    Extension(service): Extension<Service>,
    Path(contract_id): Path<contract::Id>,
    InsecureClientIp(ip): InsecureClientIp,
    headers: HeaderMap,
    Json(body): Json<SignAsClientBody>,
) -> Result<Json<Contract>, Error> {
    let SignAsClientBody {
        client_id,
        signature,
    } = body;

    let image = signature::Image::new(signature.image)
        .ok_or_else(|| api::validation("invalid signature `image`"))?;

    service
        .execute(command::SignContractAsClient {
            contract_id,
            client_id,
            kind: signature.kind,
            image,
            ip: Some(ip.to_string().into()),
            user_agent: user_agent(&headers),
        })
        .await
        .map_err(AsError::into_error)
        .map(|contract| Json(contract.into()))
}

/// `GET /contracts/{id}` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTRACT_NOT_EXISTS` - no contract with the provided ID.
pub async fn by_id(
    Extension(service): Extension<Service>,
    Path(id): Path<contract::Id>,
) -> Result<Json<Contract>, Error> {
    service
        .execute(query::contract::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| QueryError::NotExists.into())
        .map(|contract| Json(contract.into()))
}

/// Re-derived validity of the signatures captured on a [`Contract`].
#[derive(Clone, Debug, Serialize)]
pub struct SignatureValidity {
    /// Indicator whether the recorded agent signature is valid.
    pub agent_signature_valid: bool,

    /// Indicator whether the recorded client signature is valid.
    pub client_signature_valid: bool,

    /// Indicator whether both recorded signatures are valid.
    pub is_valid: bool,

    /// Human-readable reasons of invalidity, if any.
    pub errors: Vec<String>,
}

/// `GET /contracts/{id}/verify` handler.
///
/// Verifies the recorded agent signature against the agent's *current*
/// profile record, so a later profile change surfaces here.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTRACT_NOT_EXISTS`/`USER_NOT_EXISTS` - unknown referenced entity.
pub async fn verify(
    Extension(service): Extension<Service>,
    Path(contract_id): Path<contract::Id>,
) -> Result<Json<SignatureValidity>, Error> {
    service
        .execute(query::contract::VerifySignatures { contract_id })
        .await
        .map_err(AsError::into_error)
        .map(|validity| {
            let is_valid = validity.is_valid();
            Json(SignatureValidity {
                agent_signature_valid: validity.agent_signature_valid,
                client_signature_valid: validity.client_signature_valid,
                is_valid,
                errors: validity.errors,
            })
        })
}

/// Payment readiness of a [`Contract`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PaymentReadiness {
    /// Indicator whether payment may proceed.
    pub can_proceed_to_payment: bool,

    /// Indicator whether the agent party has signed.
    pub signed_by_agent: bool,

    /// Indicator whether the client party has signed.
    pub signed_by_client: bool,

    /// Current status of the [`Contract`].
    pub status: contract::Status,
}

/// `GET /contracts/{id}/payment-ready` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `CONTRACT_NOT_EXISTS` - no contract with the provided ID.
pub async fn payment_ready(
    Extension(service): Extension<Service>,
    Path(id): Path<contract::Id>,
) -> Result<Json<PaymentReadiness>, Error> {
    service
        .execute(query::contract::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| QueryError::NotExists.into())
        .map(|contract| {
            Json(PaymentReadiness {
                can_proceed_to_payment: contract.can_proceed_to_payment(),
                signed_by_agent: contract.signed_by_agent(),
                signed_by_client: contract.signed_by_client(),
                status: contract.status,
            })
        })
}

/// Extracts the `User-Agent` header value, if present.
fn user_agent(headers: &HeaderMap) -> Option<signature::UserAgent> {
    headers
        .get(http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(|ua| ua.to_owned().into())
}

impl AsError for command::generate_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BOOKING_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Booking` with the provided ID does not exist"]
                BookingNotExists,

                #[code = "CONTRACT_ALREADY_GENERATED"]
                #[status = CONFLICT]
                #[message = "`Booking` already has a generated `Contract`"]
                ContractAlreadyGenerated,

                #[code = "PROPERTY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Property` with the provided ID does not exist"]
                PropertyNotExists,

                #[code = "SIGNING_REJECTED"]
                #[status = CONFLICT]
                #[message = "Captured signature cannot be recorded"]
                Signing,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the provided ID does not exist"]
                UserNotExists,
            }
        }

        Some(match self {
            Self::BookingNotExists(_) => Error::BookingNotExists.into(),
            Self::ContractAlreadyGenerated(_) => {
                Error::ContractAlreadyGenerated.into()
            }
            Self::Db(e) => return e.try_as_error(),
            Self::PropertyNotExists(_) => Error::PropertyNotExists.into(),
            Self::Signing(_) => Error::Signing.into(),
            Self::UserNotExists(_) => Error::UserNotExists.into(),
        })
    }
}

impl AsError for command::sign_contract_as_agent::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CONTRACT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Contract` with the provided ID does not exist"]
                ContractNotExists,

                #[code = "NOT_AGENT_OF_CONTRACT"]
                #[status = FORBIDDEN]
                #[message = "`User` is not the agent party of the `Contract`"]
                NotAgentOfContract,

                #[code = "SIGNATURE_NOT_CONFIGURED"]
                #[status = UNPROCESSABLE_ENTITY]
                #[message = "`User` has no active profile signature"]
                SignatureNotConfigured,

                #[code = "SIGNING_REJECTED"]
                #[status = CONFLICT]
                #[message = "`Contract` is not in a signable state"]
                Signing,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the provided ID does not exist"]
                UserNotExists,
            }
        }

        Some(match self {
            Self::ContractNotExists(_) => Error::ContractNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::NotAgentOfContract(_) => Error::NotAgentOfContract.into(),
            Self::SignatureNotConfigured(_) => {
                Error::SignatureNotConfigured.into()
            }
            Self::Signing(_) => Error::Signing.into(),
            Self::UserNotExists(_) => Error::UserNotExists.into(),
        })
    }
}

impl AsError for command::sign_contract_as_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CONTRACT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Contract` with the provided ID does not exist"]
                ContractNotExists,

                #[code = "NOT_CLIENT_OF_CONTRACT"]
                #[status = FORBIDDEN]
                #[message = "`User` is not the client party of the \
                             `Contract`"]
                NotClientOfContract,

                #[code = "SIGNING_REJECTED"]
                #[status = CONFLICT]
                #[message = "`Contract` is not in a signable state"]
                Signing,
            }
        }

        Some(match self {
            Self::ContractNotExists(_) => Error::ContractNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::NotClientOfContract(_) => {
                Error::NotClientOfContract.into()
            }
            Self::Signing(_) => Error::Signing.into(),
        })
    }
}

impl AsError for query::contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CONTRACT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Contract` with the provided ID does not exist"]
                ContractNotExists,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the provided ID does not exist"]
                UserNotExists,
            }
        }

        Some(match self {
            Self::ContractNotExists(_) => Error::ContractNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
            Self::UserNotExists(_) => Error::UserNotExists.into(),
        })
    }
}
