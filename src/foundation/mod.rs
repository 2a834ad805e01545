//! Shared geometry, color, and error types.

/// View box, colors, and pixel helpers.
pub mod core;
/// Error taxonomy used across the crate.
pub mod error;
