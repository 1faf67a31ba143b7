//! Infrastructure layer.

pub mod collaborators;
pub mod database;

pub use self::{collaborators::Collaborators, database::Database};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
