use crate::Result;
use crate::display::pagination::PAGE_SIZE_PRESETS;
use crate::error::{CliError, ConfigError};
use crate::storage::config::{Config, Profile};
use crate::utils::validation::{validate_email, validate_url};
use std::path::PathBuf;

/// Fields `config set` accepts
pub const SETTABLE_FIELDS: [&str; 4] = ["api_url", "email", "page_size", "timeout_seconds"];

/// Configuration service for managing application configuration
pub struct ConfigService {
    config: Config,
}

impl ConfigService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.config.get_profile(name)
    }

    pub fn get_default_profile(&self) -> Option<&String> {
        self.config.default_profile.as_ref()
    }

    pub fn set_default_profile(&mut self, name: &str) -> Result<()> {
        if self.config.get_profile(name).is_none() {
            return Err(ConfigError::ProfileNotFound {
                name: name.to_string(),
            }
            .into());
        }
        self.config.default_profile = Some(name.to_string());
        Ok(())
    }

    /// Set one profile field, creating the profile when needed
    pub fn set_profile_field(&mut self, profile: &str, field: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let invalid = |reason: String| ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason,
        };

        match field {
            "api_url" => validate_url(value)?,
            "email" => validate_email(value)?,
            "page_size" => {
                let size: usize = value
                    .parse()
                    .map_err(|_| invalid("not a number".to_string()))?;
                if !PAGE_SIZE_PRESETS.contains(&size) {
                    return Err(invalid(format!("must be one of {:?}", PAGE_SIZE_PRESETS)).into());
                }
            }
            "timeout_seconds" => {
                let seconds: u64 = value
                    .parse()
                    .map_err(|_| invalid("not a number".to_string()))?;
                if seconds == 0 {
                    return Err(invalid("must be greater than zero".to_string()).into());
                }
            }
            _ => {
                return Err(CliError::InvalidArguments(format!(
                    "Unknown field: {}. Use one of {}",
                    field,
                    SETTABLE_FIELDS.join(", ")
                ))
                .into());
            }
        }

        let entry = self
            .config
            .profiles
            .entry(profile.to_string())
            .or_default();

        // Values were validated above
        match field {
            "api_url" => entry.api_url = value.trim_end_matches('/').to_string(),
            "email" => entry.email = Some(value.to_string()),
            "page_size" => entry.page_size = value.parse().ok(),
            "timeout_seconds" => entry.timeout_seconds = value.parse().ok(),
            _ => {}
        }

        if self.config.default_profile.is_none() {
            self.config.default_profile = Some(profile.to_string());
        }
        Ok(())
    }

    pub fn save_config(&self, path: Option<PathBuf>) -> Result<()> {
        Ok(self.config.save(path)?)
    }

    /// Profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.config.profiles.iter().collect();
        profiles.sort_by(|a, b| a.0.cmp(b.0));
        profiles
    }
}
