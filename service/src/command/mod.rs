//! [`Command`] definition.

pub mod authorize_payment;
pub mod cancel_booking;
pub mod create_booking;
pub mod generate_contract;
pub mod revoke_contract;
pub mod sign_contract_as_agent;
pub mod sign_contract_as_client;
pub mod sweep_expired_bookings;
pub mod update_booking_status;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_payment::AuthorizePayment, cancel_booking::CancelBooking,
    create_booking::CreateBooking, generate_contract::GenerateContract,
    revoke_contract::RevokeContract,
    sign_contract_as_agent::SignContractAsAgent,
    sign_contract_as_client::SignContractAsClient,
    sweep_expired_bookings::SweepExpiredBookings,
    update_booking_status::UpdateBookingStatus,
};
