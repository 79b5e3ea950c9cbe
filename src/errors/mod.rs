//! Centralized error handling for the media resolver
//!
//! Every component returns [`AppResult`]; the web layer is the only place
//! where an [`AppError`] is turned into an HTTP status and body.
//!
//! # Error Categories
//!
//! - **Invalid input**: malformed or non-HTTP(S) URLs supplied by the caller
//! - **Network failures**: upstream unreachable, connection refused, timeouts
//! - **Upstream failures**: upstream answered with a non-success status
//! - **No media found**: page fetched and scanned, nothing usable located
//!
//! # Usage
//!
//! ```rust
//! use media_resolver::errors::{AppError, AppResult};
//!
//! fn check(input: &str) -> AppResult<()> {
//!     if input.is_empty() {
//!         return Err(AppError::invalid_input("url is required"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
