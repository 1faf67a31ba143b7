//! [`Query`] collection related to multiple [`Booking`]s.

use common::operations::By;

use crate::{domain::Booking, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries [`Booking`]s made by a tenant, newest first.
pub type OfTenant = DatabaseQuery<By<Vec<Booking>, read::booking::OfTenant>>;

/// Queries [`Booking`]s upon properties listed by an agent, newest first.
pub type OfAgent = DatabaseQuery<By<Vec<Booking>, read::booking::OfAgent>>;
