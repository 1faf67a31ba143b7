//! Administrative endpoints.

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use common::{pagination::Arguments, Handler as _};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service::{command, domain::contract, query, read};

use crate::{api, define_error, AsError, Error, Service};

/// Query parameters of the [`contracts`] endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContractsParams {
    /// Number of contracts to return, paginating forward.
    pub first: Option<i32>,

    /// Cursor after which to return contracts.
    pub after: Option<contract::Id>,

    /// Number of contracts to return, paginating backward.
    pub last: Option<i32>,

    /// Cursor before which to return contracts.
    pub before: Option<contract::Id>,

    /// Contract title (or its part) to fuzzy search for.
    pub title: Option<String>,

    /// Contract status to filter by.
    pub status: Option<contract::Status>,

    /// Contract kind to filter by.
    pub kind: Option<contract::Kind>,
}

/// Page of contracts.
#[derive(Clone, Debug, Serialize)]
pub struct ContractsPage {
    /// [`Edge`]s of this page.
    pub edges: Vec<Edge>,

    /// Information about this page.
    pub page_info: PageInfo,

    /// Total count of contracts, disregarding the filter.
    pub total_count: i32,
}

/// Edge of a [`ContractsPage`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Edge {
    /// Cursor of this [`Edge`].
    pub cursor: contract::Id,

    /// ID of the contract this [`Edge`] points at.
    pub node: contract::Id,
}

/// Information about a [`ContractsPage`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PageInfo {
    /// Last cursor on this page.
    pub end_cursor: Option<contract::Id>,

    /// Indicator whether a next page exists.
    pub has_next_page: bool,

    /// Indicator whether a previous page exists.
    pub has_previous_page: bool,
}

/// Default number of contracts on a page.
const DEFAULT_PAGE_SIZE: i32 = 20;

/// `GET /admin/contracts` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - mixed forward and backward
///   pagination;
/// - `VALIDATION` - malformed title filter.
pub async fn contracts(
    Extension(service): Extension<Service>,
    Query(params): Query<ContractsParams>,
) -> Result<Json<ContractsPage>, Error> {
    let ContractsParams {
        first,
        after,
        last,
        before,
        title,
        status,
        kind,
    } = params;

    let arguments =
        Arguments::new(first, after, last, before, DEFAULT_PAGE_SIZE)
            .ok_or_else(|| Error::from(api::PaginationError::Ambiguous))?;
    let title = title
        .map(|t| {
            contract::Title::new(t)
                .ok_or_else(|| api::validation("invalid `title` filter"))
        })
        .transpose()?;

    let page = service
        .execute(query::contracts::List::by(
            read::contract::list::Selector {
                arguments,
                filter: read::contract::list::Filter {
                    title,
                    status,
                    kind,
                },
            },
        ))
        .await
        .map_err(AsError::into_error)?;
    let total_count = service
        .execute(query::contracts::TotalCount::by(()))
        .await
        .map_err(AsError::into_error)?;

    let page_info = page.page_info();
    Ok(Json(ContractsPage {
        edges: page
            .edges
            .into_iter()
            .map(|edge| Edge {
                cursor: edge.cursor,
                node: edge.node,
            })
            .collect(),
        page_info: PageInfo {
            end_cursor: page_info.end_cursor,
            has_next_page: page_info.has_next_page,
            has_previous_page: page_info.has_previous_page,
        },
        total_count: total_count.into(),
    }))
}

/// Per-status counts of contracts along with the commission total.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Statistics {
    /// Total count of contracts.
    pub total: i32,

    /// Count of draft contracts.
    pub draft: i32,

    /// Count of pending contracts.
    pub pending: i32,

    /// Count of active contracts.
    pub active: i32,

    /// Count of completed contracts.
    pub completed: i32,

    /// Count of cancelled contracts.
    pub cancelled: i32,

    /// Count of expired contracts.
    pub expired: i32,

    /// Sum of commissions over active and completed contracts.
    pub commission_total: Decimal,
}

impl From<read::contract::Statistics> for Statistics {
    fn from(stats: read::contract::Statistics) -> Self {
        Self {
            total: stats.total,
            draft: stats.draft,
            pending: stats.pending,
            active: stats.active,
            completed: stats.completed,
            cancelled: stats.cancelled,
            expired: stats.expired,
            commission_total: stats.commission_total,
        }
    }
}

/// `GET /admin/contracts/statistics` handler.
///
/// # Errors
///
/// Errors with `INTERNAL_SERVER_ERROR` only.
pub async fn statistics(
    Extension(service): Extension<Service>,
) -> Result<Json<Statistics>, Error> {
    service
        .execute(query::contracts::Statistics::by(()))
        .await
        .map_err(AsError::into_error)
        .map(|stats| Json(stats.into()))
}

/// Body of the [`revoke_contract`] endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct RevokeBody {
    /// Reason the contract is revoked with.
    pub reason: String,
}

/// `POST /admin/contracts/{id}/revoke` handler.
///
/// # Errors
///
/// Possible error codes:
/// - `VALIDATION` - empty revocation reason;
/// - `CONTRACT_NOT_EXISTS` - no contract with the provided ID;
/// - `CONTRACT_TERMINAL` - the contract is already terminal.
pub async fn revoke_contract(
    Extension(service): Extension<Service>,
    Path(contract_id): Path<contract::Id>,
    Json(RevokeBody { reason }): Json<RevokeBody>,
) -> Result<Json<super::contract::Contract>, Error> {
    if reason.trim().is_empty() {
        return Err(api::validation("`reason` must not be empty"));
    }

    service
        .execute(command::RevokeContract {
            contract_id,
            reason: reason.into(),
        })
        .await
        .map_err(AsError::into_error)
        .map(|contract| Json(contract.into()))
}

/// Outcome of a manually triggered sweep of unpaid offline bookings.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct SweepOutcome {
    /// Number of candidate bookings examined.
    pub examined: usize,

    /// Number of bookings cancelled.
    pub swept: usize,

    /// Number of linked contracts cancelled alongside.
    pub contracts_cancelled: usize,
}

/// `POST /admin/bookings/sweep-expired` handler.
///
/// Runs the very same sweep the background task performs on its interval.
///
/// # Errors
///
/// Errors with `INTERNAL_SERVER_ERROR` only.
pub async fn sweep_expired(
    Extension(service): Extension<Service>,
) -> Result<Json<SweepOutcome>, Error> {
    service
        .execute(command::SweepExpiredBookings)
        .await
        .map_err(AsError::into_error)
        .map(|outcome| {
            Json(SweepOutcome {
                examined: outcome.examined,
                swept: outcome.swept,
                contracts_cancelled: outcome.contracts_cancelled,
            })
        })
}

impl AsError for command::revoke_contract::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CONTRACT_TERMINAL"]
                #[status = CONFLICT]
                #[message = "`Contract` is already in a terminal status"]
                AlreadyTerminal,

                #[code = "CONTRACT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Contract` with the provided ID does not exist"]
                ContractNotExists,
            }
        }

        Some(match self {
            Self::AlreadyTerminal(_) => Error::AlreadyTerminal.into(),
            Self::ContractNotExists(_) => Error::ContractNotExists.into(),
            Self::Db(e) => return e.try_as_error(),
        })
    }
}

impl AsError for command::sweep_expired_bookings::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}
