//! Common utilities shared by the expander, the construct tree and the API handlers.
//!
//! This module provides the crate error type, the deployment environment of a stack,
//! and the snapshot of environment variables every configuration entry point reads from.

/// Deployment environment (account and region) of a stack.
pub mod environment;

/// Error type and result alias used across the crate.
pub mod error;

/// Snapshot of environment-style variables.
pub mod variables;

/// Split a space-delimited list, skipping empty entries.
pub(crate) fn split_list(value: &str) -> Vec<&str> {
    value.split_whitespace().collect()
}
