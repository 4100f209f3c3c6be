//! Shared types for the account services.
//!
//! Error definitions plus the request and result shapes passed between the
//! services, forms and the HTTP gateway.

pub mod errors;
pub mod requests;

pub use errors::*;
pub use requests::*;
