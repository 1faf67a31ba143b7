//! REST API definitions.

pub mod admin;
pub mod availability;
pub mod booking;
pub mod contract;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::define_error;

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}

/// Monetary amount in some [`Currency`].
///
/// [`Currency`]: common::money::Currency
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// Currency of this amount.
    pub currency: common::money::Currency,
}

impl From<common::Money> for Money {
    fn from(value: common::Money) -> Self {
        Self {
            amount: value.amount,
            currency: value.currency,
        }
    }
}

impl From<Money> for common::Money {
    fn from(value: Money) -> Self {
        Self {
            amount: value.amount,
            currency: value.currency,
        }
    }
}

/// Creates a `VALIDATION` [`Error`] with the provided message.
///
/// [`Error`]: crate::Error
pub(crate) fn validation(message: impl Into<String>) -> crate::Error {
    crate::Error {
        code: "VALIDATION",
        status_code: http::StatusCode::BAD_REQUEST,
        message: message.into(),
        backtrace: None,
        blocked_dates: None,
    }
}
