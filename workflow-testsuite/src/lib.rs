//! Testing utilities for the workflow API client.
//!
//! This crate provides an in-memory fake of the client so activity workers
//! and applications can be tested without a running workflow API.

pub mod fake;

pub use fake::*;
