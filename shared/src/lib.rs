//! Shared types for the storefront stack
//!
//! Holds everything that must stay identical between the server and any
//! future client (admin dashboard, mobile app):
//!
//! - **error system** (`error`): unified error codes, [`AppError`] and the
//!   [`ApiResponse`] envelope used by every API endpoint.

pub mod error;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
