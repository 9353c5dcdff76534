//! # Web Handlers for the Campsite Booking Service
//!
//! This crate provides the HTTP surface for the campsite booking service:
//! request and response types, handler functions, and the mapping from core
//! booking errors to wire-level status codes.

/// Handlers for reservation API endpoints
mod booking_handlers;
pub use booking_handlers::*;

/// Request, response, and error types for the reservation API
mod types;
pub use types::*;
