use crate::api::client::ApiClient;
use crate::cli::command_handlers::{AuthHandler, ConfigHandler, ResourceHandler};
use crate::cli::main_types::Commands;
use crate::core::notifications::{NotificationBus, Severity, Toast};
use crate::core::resources;
use crate::core::route_guard::{LoginReason, Navigator, RouteDecision, guard};
use crate::core::services::{AuthService, ConfigService};
use crate::error::{ApiError, AppError, CliError};
use crate::storage::config::Config;
use crate::storage::token::{KeyringTokenStore, SessionState, TokenStore, session_state};
use crate::utils::logging::print_verbose;
use crossterm::style::{Color, Stylize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Toast line as printed to stderr
pub fn format_toast(toast: &Toast) -> String {
    let icon = match toast.severity {
        Severity::Success => "✅",
        Severity::Error => "❌",
        Severity::Warning => "⚠️",
        Severity::Info => "ℹ️",
    };
    format!("{} {}", icon, toast.message)
}

/// Coloured banner for interactive terminals, plain text otherwise
fn render_toast(toast: &Toast) {
    let line = format_toast(toast);
    if !atty::is(atty::Stream::Stderr) {
        eprintln!("{}", line);
        return;
    }
    let color = match toast.severity {
        Severity::Success => Color::Green,
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Cyan,
    };
    eprintln!("{}", line.with(color));
}

/// Terminal stand-in for the browser's forced navigation to `/login`
#[derive(Default)]
pub struct CliNavigator {
    last: Mutex<Option<LoginReason>>,
}

impl CliNavigator {
    pub fn last_redirect(&self) -> Option<LoginReason> {
        *self.last.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for CliNavigator {
    fn redirect_to_login(&self, reason: LoginReason) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(reason);
        eprintln!("🔒 {}", reason.message());
        eprintln!(
            "   Run 'crmdesk auth login --reason {}' to sign in again.",
            reason.login_path()
        );
    }
}

pub struct Dispatcher {
    config: Config,
    config_path: Option<PathBuf>,
    profile_name: String,
    verbose: bool,
    bus: NotificationBus,
    client: ApiClient,
    navigator: Arc<CliNavigator>,
}

impl Dispatcher {
    fn log_verbose(&self, msg: &str) {
        print_verbose(self.verbose, msg);
    }

    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        profile_name: String,
        api_url_override: Option<String>,
        verbose: bool,
    ) -> Result<Self, AppError> {
        let tokens = Arc::new(KeyringTokenStore::new(profile_name.clone()));
        Self::with_token_store(
            config,
            config_path,
            profile_name,
            api_url_override,
            verbose,
            tokens,
        )
    }

    /// Wire the notification bus, the HTTP client and the navigator together
    pub fn with_token_store(
        config: Config,
        config_path: Option<PathBuf>,
        profile_name: String,
        api_url_override: Option<String>,
        verbose: bool,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, AppError> {
        let api_url = config.resolve_api_url(&profile_name, api_url_override.as_deref());
        print_verbose(verbose, &format!("Using API URL: {}", api_url));

        let timeout = config
            .get_profile(&profile_name)
            .and_then(|profile| profile.timeout_seconds)
            .map(Duration::from_secs);

        let bus = NotificationBus::new();
        bus.subscribe(Arc::new(render_toast));

        let navigator = Arc::new(CliNavigator::default());
        let client = ApiClient::new(api_url, tokens, timeout)?.with_navigator(navigator.clone());

        let errors = bus.clone();
        client.register_error_handler(Arc::new(move |error: &ApiError| {
            errors.error(error.to_string());
        }));

        Ok(Self {
            config,
            config_path,
            profile_name,
            verbose,
            bus,
            client,
            navigator,
        })
    }

    pub fn bus(&self) -> &NotificationBus {
        &self.bus
    }

    pub fn navigator(&self) -> &CliNavigator {
        &self.navigator
    }

    /// Route guard for protected commands
    fn require_session(&self, route: &str) -> Result<(), AppError> {
        let state = session_state(self.client.tokens().as_ref())?;
        let authenticated = matches!(state, SessionState::Active { .. });

        match guard(route, authenticated) {
            RouteDecision::Allow | RouteDecision::RedirectHome => Ok(()),
            decision @ RouteDecision::RedirectToLogin { .. } => {
                self.log_verbose(&format!(
                    "Redirecting to {}",
                    decision.target().unwrap_or_default()
                ));
                let message = if state == SessionState::Expired {
                    LoginReason::SessionExpired.message().to_string()
                } else {
                    format!("You need to log in to open {}", route)
                };
                Err(CliError::AuthRequired {
                    message,
                    hint: "Run 'crmdesk auth login' to sign in".to_string(),
                    requested_route: route.to_string(),
                }
                .into())
            }
        }
    }

    pub async fn dispatch(&self, command: Commands) -> Result<(), AppError> {
        if let Some(name) = command.resource_name() {
            resources::resolve(name)?;
        }
        if let Some(route) = command.route() {
            self.require_session(&route)?;
        }

        match command {
            Commands::Auth { command } => {
                let profile = self.config.get_profile(&self.profile_name).cloned();
                let service = AuthService::new(self.client.clone(), self.profile_name.clone());
                AuthHandler::new()
                    .handle(command, &service, profile.as_ref(), self.verbose)
                    .await
            }
            Commands::Config { command } => {
                let mut service = ConfigService::new(self.config.clone());
                ConfigHandler::new()
                    .handle(
                        command,
                        &mut service,
                        &self.profile_name,
                        self.config_path.clone(),
                        self.verbose,
                    )
                    .await
            }
            Commands::Resources => {
                ResourceHandler::new(self.client.clone(), self.bus.clone(), self.verbose)
                    .list_resources()
            }
            command => {
                let page_size = self
                    .config
                    .get_profile(&self.profile_name)
                    .and_then(|profile| profile.page_size);
                ResourceHandler::new(self.client.clone(), self.bus.clone(), self.verbose)
                    .with_default_page_size(page_size)
                    .handle(command)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::token::{MemoryTokenStore, make_token};
    use serde_json::json;

    fn dispatcher(tokens: Arc<dyn TokenStore>) -> Dispatcher {
        Dispatcher::with_token_store(
            Config::default(),
            None,
            "default".to_string(),
            Some("http://127.0.0.1:9/api".to_string()),
            false,
            tokens,
        )
        .unwrap()
    }

    #[test]
    fn test_format_toast() {
        let toast = Toast {
            id: 1,
            message: "Lead created".to_string(),
            severity: Severity::Success,
        };
        assert_eq!(format_toast(&toast), "✅ Lead created");
    }

    #[test]
    fn test_guard_blocks_signed_out_user() {
        let dispatcher = dispatcher(Arc::new(MemoryTokenStore::new()));
        let result = dispatcher.require_session("/leads");
        match result {
            Err(AppError::Cli(CliError::AuthRequired {
                requested_route, ..
            })) => assert_eq!(requested_route, "/leads"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_guard_reports_expired_session() {
        let expired = make_token(json!({"exp": chrono::Utc::now().timestamp() - 5}));
        let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token(expired));
        let dispatcher = dispatcher(tokens.clone());

        let result = dispatcher.require_session("/accounts");
        assert!(matches!(
            result,
            Err(AppError::Cli(CliError::AuthRequired { ref message, .. }))
                if message == LoginReason::SessionExpired.message()
        ));
        assert_eq!(tokens.get().unwrap(), None);
    }

    #[test]
    fn test_guard_allows_active_session() {
        let token = make_token(json!({"exp": chrono::Utc::now().timestamp() + 600}));
        let dispatcher = dispatcher(Arc::new(MemoryTokenStore::with_token(token)));
        assert!(dispatcher.require_session("/leads").is_ok());
    }

    #[test]
    fn test_client_errors_become_error_toasts() {
        let dispatcher = dispatcher(Arc::new(MemoryTokenStore::new()));
        // The handler is already registered once by the dispatcher
        assert!(
            !dispatcher
                .client
                .register_error_handler(Arc::new(|_: &ApiError| {}))
        );
        assert!(dispatcher.bus().active().is_empty());
        assert_eq!(dispatcher.navigator().last_redirect(), None);
    }
}
