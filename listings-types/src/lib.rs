//! # Listings Types
//!
//! Domain types and port traits for the local-services directory and its
//! featured-listing payment workflow. This crate has ZERO external IO
//! dependencies - only data structures, business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Listing, PaymentRequest, PhoneNumber, callback decoding)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    AccessCredential, CallbackResult, ChargeRequest, CorrelationRef, KesAmount, Listing,
    ListingId, PaymentRequest, PaymentStatus, PhoneNumber, Resolution,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use ports::{ChargeAcceptance, CorrelationStore, GatewayError, ListingStore, PaymentGateway};
