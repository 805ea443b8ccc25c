//! Shared types for the backend supervisor workspace
//!
//! Contains the pieces used by both the supervisor and the stub backend:
//! component identity, logging setup and the endpoint description.

pub mod errors;
pub mod logging;
pub mod types;

pub use errors::*;
pub use types::*;
