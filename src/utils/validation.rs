//! Input validation for configuration values and command arguments

use crate::error::CliError;
use serde_json::Value;

/// Validate that a URL is properly formatted
pub fn validate_url(url: &str) -> crate::Result<()> {
    if url.is_empty() {
        return Err(CliError::InvalidArguments("URL cannot be empty".to_string()).into());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(CliError::InvalidArguments(format!(
            "Invalid URL '{}': URL must start with http:// or https://",
            url
        ))
        .into());
    }

    Ok(())
}

pub fn validate_email(email: &str) -> crate::Result<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
    if !valid {
        return Err(
            CliError::InvalidArguments(format!("Invalid email address '{}'", email)).into(),
        );
    }
    Ok(())
}

/// Parse a `--data` argument; records are always JSON objects
pub fn parse_json_object(raw: &str) -> crate::Result<Value> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CliError::InvalidArguments(format!("Invalid JSON data: {}", e)))?;
    if !value.is_object() {
        return Err(CliError::InvalidArguments(
            "JSON data must be an object, e.g. '{\"name\": \"Acme\"}'".to_string(),
        )
        .into());
    }
    Ok(value)
}
