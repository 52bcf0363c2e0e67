//! Domain models for the directory and its payment workflow.

pub mod callback;
pub mod charge;
pub mod credential;
pub mod listing;
pub mod payment;
pub mod phone;

pub use callback::CallbackResult;
pub use charge::ChargeRequest;
pub use credential::AccessCredential;
pub use listing::{Listing, ListingId};
pub use payment::{CorrelationRef, PaymentRequest, PaymentStatus, Resolution};
pub use phone::{KesAmount, PhoneNumber};
