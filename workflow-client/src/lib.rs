//! Client contract for the workflow orchestration API.
//!
//! The HTTP implementation lives outside this workspace. This crate defines
//! the [`Client`] trait it implements, which is what the activity worker and
//! applications program against.

pub mod client;

pub use client::*;
pub use workflow_core::{ApiResult, WorkflowApiError};
