//! # Check-in Common Library
//!
//! Shared code for the check-in service:
//! - Error and result types
//! - Configuration file loading and root folder resolution
//! - Event timezone helpers (calendar dates, export formatting, midnight)

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
