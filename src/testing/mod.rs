//! Testing utilities and mock implementations
//!
//! Mocks for the LLM provider and the pipeline agents, so the service can be
//! tested without a model endpoint.

pub mod mocks;

pub use mocks::*;
