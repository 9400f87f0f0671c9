//! Middleware module
//!
//! Contains the per-request layers: correlation IDs, panic recovery,
//! access logging, and authentication.

pub mod access_log;
pub mod auth;
pub mod recover;
pub mod request_id;
