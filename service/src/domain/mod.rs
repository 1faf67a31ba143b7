//! Domain definitions.

pub mod booking;
pub mod contract;
pub mod property;
pub mod user;

pub use self::{
    booking::Booking, contract::Contract, property::Property, user::User,
};
