//! Core types for the workflow API client.
//!
//! This crate provides the record types exchanged with the workflow API and
//! the error type shared by every client operation.

pub mod error;
pub mod types;

pub use error::*;
pub use types::*;
