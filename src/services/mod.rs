//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They issue and check edit keys and drive the repository.

pub mod edit_key;
pub mod gate;
pub mod ratings;
pub mod review_service;
pub mod store_service;
