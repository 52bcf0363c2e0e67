//! # M-Pesa Gateway
//!
//! Daraja (Safaricom M-Pesa) adapter implementing the `PaymentGateway` port:
//!
//! - [`credentials`] - process-wide access token cache with single-flight refresh
//! - [`charge`] - STK push request assembly, password signing and correlation references
//! - [`client`] - HTTP client for the OAuth and STK push endpoints
//!
//! # Example
//! ```ignore
//! use mpesa_gateway::{MpesaConfig, MpesaGateway};
//!
//! let gateway = MpesaGateway::new(MpesaConfig::sandbox(
//!     "consumer-key", "consumer-secret", "174379", "passkey", "https://example.com",
//! ))?;
//! let token = gateway.access_credential().await?;
//! ```

pub mod charge;
pub mod client;
pub mod config;
pub mod credentials;

pub use charge::{ChargeRequestBuilder, provider_timestamp, stk_password};
pub use client::MpesaGateway;
pub use config::MpesaConfig;
pub use credentials::CredentialCache;
