//! Internal utilities for the account services.
//!
//! Password hashing, input validation and token handling shared by the
//! services and forms.

pub mod jwt;
pub mod password;
pub mod validation;

pub use jwt::*;
pub use password::*;
pub use validation::*;
