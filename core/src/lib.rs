//! # OTP Gate Core
//!
//! Core business logic and domain layer for the OTP gate.
//! This crate contains the rate-limit domain entities, the collaborator
//! interfaces for counter stores and SMS providers, the `OtpGate` service
//! and the error taxonomy that the API layer maps onto HTTP responses.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
