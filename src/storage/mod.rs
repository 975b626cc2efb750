//! Storage layer for crmdesk
//!
//! Handles configuration profiles (TOML) and the session token slot
//! (OS keyring).

use crate::error::StorageError;

pub mod config;
pub mod token;

type Result<T> = std::result::Result<T, StorageError>;
