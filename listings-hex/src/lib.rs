//! # Listings Hex
//!
//! Application service layer and HTTP adapter for the listings directory.
//!
//! ## Architecture
//!
//! - `service` - Application service (listing admin, charge initiation,
//!   callback reconciliation, expiry)
//! - `sweeper` - Background expiry worker
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: Store` and `G: PaymentGateway`, so the
//! database and mobile-money adapters are injected by the binary.

pub mod inbound;
pub mod openapi;
pub mod service;
pub mod sweeper;


pub use service::{CallbackOutcome, FeaturedListingService, Store};
pub use sweeper::ExpirySweeper;
