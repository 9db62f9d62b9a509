//! Data models representing database entities and API payloads.

/// Edit key extraction for delete requests
pub mod credentials;
pub mod pagination;
/// Review model
pub mod review;
/// Store model
pub mod store;
pub mod validation;
