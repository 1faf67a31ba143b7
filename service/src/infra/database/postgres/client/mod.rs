//! Postgres database clients wrapping the raw connections.

pub mod non_tx;
pub mod tx;

pub use self::{non_tx::NonTx, tx::Tx};
