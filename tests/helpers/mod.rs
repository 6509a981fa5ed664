//! Test helpers module
//!
//! Shared setup for the integration tests: an in-memory store behind the
//! real services, a fixed clock, optional wiremock servers standing in for
//! the email and LLM APIs, and signed identity tokens.

#![allow(dead_code)]

pub mod test_context;
pub mod test_data;

pub use test_context::*;
pub use test_data::*;
