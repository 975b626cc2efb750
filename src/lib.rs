//! Admin client for a CRM REST backend.
//!
//! Layers, with dependencies flowing downwards: `cli` → `core` → `api` /
//! `storage`, with `display`, `export` and `utils` shared by all of them.

pub use error::AppError;

/// Main architecture layers (dependency flow: CLI → Core → Storage)
pub mod cli; // Command-line interface
pub mod core; // Services, notifications, routing
pub mod storage; // Configuration and session token

/// Support modules (used across layers)
pub mod api; // CRM REST client
pub mod display; // Table and pagination
pub mod error; // Error handling
pub mod export; // Spreadsheet and print output
pub mod utils; // Shared utilities and helpers

pub type Result<T> = std::result::Result<T, AppError>;
