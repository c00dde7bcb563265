//! # Payments Hex
//!
//! Application service layer and HTTP adapters for the payments service.
//!
//! ## Architecture
//!
//! - `service` - Payment lifecycle (orchestrates domain operations)
//! - `access` - Caller-based authorization checks
//! - `inbound/` - HTTP adapter (Axum server)
//! - `outbound/` - HTTP clients for the authority service, user service and gateway
//!
//! The service is generic over `R: PaymentRepository`, allowing
//! different repository implementations to be injected.

pub mod access;
pub mod inbound;
pub mod openapi;
pub mod outbound;
pub mod service;


pub use service::{CreatePaymentInput, LifecycleSettings, NotificationOutcome, PaymentService};
