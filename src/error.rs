use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("AuthError: {0}")]
    Auth(#[from] AuthError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("DisplayError: {0}")]
    Display(#[from] DisplayError),
    #[error("ExportError: {0}")]
    Export(#[from] ExportError),
    #[error("ServiceError: {0}")]
    Service(#[from] ServiceError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Authentication required")]
    AuthRequired {
        message: String,
        hint: String,
        requested_route: String,
    },
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Unknown resource: {name}")]
    UnknownResource { name: String },
}

/// Every failure the HTTP wrapper can produce.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Session expired, please log in again")]
    ExpiredSession { endpoint: String },
    #[error("Unauthorized ({status}), please log in again")]
    Unauthorized { status: u16, endpoint: String },
    #[error("{message}")]
    ApiFailure {
        status: u16,
        code: i64,
        endpoint: String,
        message: String,
    },
    #[error("Network error: {message}")]
    Network { endpoint: String, message: String },
    #[error("Bad response from server (HTTP {status})")]
    BadResponse { status: u16, endpoint: String },
    #[error("Failed to create HTTP client: {0}")]
    ClientInit(String),
}

impl ApiError {
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            ApiError::ExpiredSession { endpoint }
            | ApiError::Unauthorized { endpoint, .. }
            | ApiError::ApiFailure { endpoint, .. }
            | ApiError::Network { endpoint, .. }
            | ApiError::BadResponse { endpoint, .. } => Some(endpoint),
            ApiError::ClientInit(_) => None,
        }
    }

    /// True when the error ended the session.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self,
            ApiError::ExpiredSession { .. } | ApiError::Unauthorized { .. }
        )
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Login failed: {0}")]
    LoginFailed(String),
    #[error("Login response did not contain a token")]
    MissingToken,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Keyring error: {0}")]
    KeyringError(String),
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Table formatting failed: {0}")]
    TableFormat(String),
    #[error("Duplicate column key: {0}")]
    DuplicateColumn(String),
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
    #[error("Pagination error: {0}")]
    Pagination(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Spreadsheet generation failed: {0}")]
    Spreadsheet(String),
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{field}': {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Resource service error: {message}")]
    Resource { message: String },
    #[error("Record {id} not found in {resource}")]
    RecordNotFound { resource: String, id: String },
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(CliError::AuthRequired { .. }) => ErrorSeverity::High,
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) => match api_error {
                ApiError::ExpiredSession { .. } | ApiError::Unauthorized { .. } => {
                    ErrorSeverity::High
                }
                ApiError::ClientInit(_) => ErrorSeverity::Critical,
                ApiError::BadResponse { status, .. } if *status >= 500 => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Auth(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Display(_) => ErrorSeverity::Low,
            AppError::Export(_) => ErrorSeverity::Medium,
            AppError::Service(_) => ErrorSeverity::Medium,
        }
    }

    /// Request failures went through the HTTP wrapper's error callback and
    /// were already shown as an error toast
    pub fn was_toasted(&self) -> bool {
        matches!(self, AppError::Api(api) if api.endpoint().is_some())
    }

    /// Session failures already sent the user to the login prompt
    pub fn redirected_to_login(&self) -> bool {
        matches!(self, AppError::Api(api) if api.is_session_error())
    }

    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Api(api_error) => api_error.to_string(),
            AppError::Cli(CliError::AuthRequired { message, .. }) => message.clone(),
            AppError::Cli(CliError::UnknownResource { name }) => {
                format!("Unknown resource '{}'", name)
            }
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Cli(CliError::AuthRequired { hint, .. }) => Some(hint.clone()),
            AppError::Cli(CliError::UnknownResource { .. }) => {
                Some("Run 'crmdesk resources' to see the available resources".to_string())
            }
            AppError::Api(ApiError::Network { .. }) => Some(
                "Check that the API URL is reachable (--api-url or CRMDESK_API_URL)".to_string(),
            ),
            AppError::Config(ConfigError::ProfileNotFound { .. }) => {
                Some("Run 'crmdesk config set --field api_url --value <url>' to create it".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_error_display() {
        let cli_err = CliError::InvalidArguments("invalid arguments".to_string());
        assert_eq!(
            format!("{}", cli_err),
            "Invalid arguments: invalid arguments"
        );

        let cli_err = CliError::AuthRequired {
            message: "message".to_string(),
            hint: "hint".to_string(),
            requested_route: "/leads".to_string(),
        };
        if let CliError::AuthRequired {
            message,
            hint,
            requested_route,
        } = cli_err
        {
            assert_eq!(message, "message");
            assert_eq!(hint, "hint");
            assert_eq!(requested_route, "/leads");
        }
    }

    #[test]
    fn test_api_error_display() {
        let api_err = ApiError::ApiFailure {
            status: 200,
            code: 422,
            endpoint: "leads".to_string(),
            message: "Email already exists".to_string(),
        };
        assert_eq!(api_err.to_string(), "Email already exists");
        assert_eq!(api_err.endpoint(), Some("leads"));

        let api_err = ApiError::BadResponse {
            status: 502,
            endpoint: "leads".to_string(),
        };
        assert_eq!(api_err.to_string(), "Bad response from server (HTTP 502)");

        assert_eq!(ApiError::ClientInit("tls".to_string()).endpoint(), None);
    }

    #[test]
    fn test_session_errors() {
        assert!(
            ApiError::ExpiredSession {
                endpoint: "leads".to_string()
            }
            .is_session_error()
        );
        assert!(
            ApiError::Unauthorized {
                status: 401,
                endpoint: "leads".to_string()
            }
            .is_session_error()
        );
        assert!(
            !ApiError::Network {
                endpoint: "leads".to_string(),
                message: "refused".to_string()
            }
            .is_session_error()
        );
    }

    #[test]
    fn test_app_error_severity() {
        let app_err = AppError::Api(ApiError::Unauthorized {
            status: 401,
            endpoint: "accounts".to_string(),
        });
        assert_eq!(app_err.severity(), ErrorSeverity::High);

        let app_err = AppError::Api(ApiError::BadResponse {
            status: 503,
            endpoint: "accounts".to_string(),
        });
        assert_eq!(app_err.severity(), ErrorSeverity::High);

        let app_err = AppError::Display(DisplayError::Pagination("bad".to_string()));
        assert_eq!(app_err.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_reporting_flags() {
        let expired = AppError::Api(ApiError::ExpiredSession {
            endpoint: "accounts".to_string(),
        });
        assert!(expired.was_toasted());
        assert!(expired.redirected_to_login());

        let network = AppError::Api(ApiError::Network {
            endpoint: "accounts".to_string(),
            message: "refused".to_string(),
        });
        assert!(network.was_toasted());
        assert!(!network.redirected_to_login());
        assert!(network.troubleshooting_hint().is_some());

        let init = AppError::Api(ApiError::ClientInit("tls".to_string()));
        assert!(!init.was_toasted());
        assert!(!init.redirected_to_login());

        let guard = AppError::Cli(CliError::AuthRequired {
            message: "You need to log in to open /leads".to_string(),
            hint: "Run 'crmdesk auth login' to sign in".to_string(),
            requested_route: "/leads".to_string(),
        });
        assert!(!guard.was_toasted());
        assert!(!guard.redirected_to_login());
        assert!(
            guard
                .troubleshooting_hint()
                .is_some_and(|hint| hint.contains("auth login"))
        );
    }

    #[test]
    fn test_app_error_hints() {

        let app_err = AppError::Cli(CliError::UnknownResource {
            name: "widgets".to_string(),
        });
        assert_eq!(app_err.display_friendly(), "Unknown resource 'widgets'");
        assert!(app_err.troubleshooting_hint().is_some());

        let app_err = AppError::Service(ServiceError::Resource {
            message: "boom".to_string(),
        });
        assert_eq!(
            format!("{}", app_err),
            "ServiceError: Resource service error: boom"
        );
        assert!(app_err.troubleshooting_hint().is_none());
    }
}
