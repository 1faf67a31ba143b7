//! Read entities definitions.

pub mod availability;
pub mod booking;
pub mod contract;

pub use self::availability::Calendar;
