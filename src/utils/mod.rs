//! Utils module - Shared utilities and helpers
//!
//! Helpers used across layers; nothing here depends on `core` or `cli`.

/// Verbose logging and the `log` backend
pub mod logging;

/// Unicode-aware text helpers
pub mod text;

/// Input validation for config values and arguments
pub mod validation;
