//! Common utilities, constants, and resources used across the txplain codebase.
//!
//! This crate provides shared functionality for the txplain workspace, including
//! the tagged transaction model, a JSON-RPC client, formatting helpers, and the
//! external resources (LLM chat completion, signature database) the other crates rely on.

/// Error types shared by the common utilities.
pub mod error;

/// Constants used throughout the txplain codebase.
pub mod constants;

/// Utilities for interacting with Ethereum, including the tagged transaction
/// model and the JSON-RPC client.
pub mod ether;

/// External resources and API integrations, such as OpenAI and openchain.
pub mod resources;

/// General utility functions and types for common tasks.
pub mod utils;

pub use error::Error;
