//! LLM provider abstraction layer
//!
//! This module provides a provider-agnostic interface for LLM interactions
//! and the factory that maps configuration onto a concrete provider.

pub mod factory;
pub mod provider;
pub mod providers;

pub use factory::build_provider;
pub use provider::*;
pub use providers::*;
