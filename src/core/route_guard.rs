//! Route guard and login redirection
//!
//! Protected routes need a live session; the login route is only for
//! signed-out users. Sessions that end mid-request are handed to a
//! [`Navigator`] together with the reason, which the login flow reads back to
//! show a contextual message.

pub const LOGIN_ROUTE: &str = "/login";
pub const HOME_ROUTE: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReason {
    SessionExpired,
    Unauthorized,
}

impl LoginReason {
    pub fn as_query(&self) -> &'static str {
        match self {
            LoginReason::SessionExpired => "session_expired",
            LoginReason::Unauthorized => "unauthorized",
        }
    }

    pub fn from_query(value: &str) -> Option<Self> {
        match value {
            "session_expired" | "expired" => Some(LoginReason::SessionExpired),
            "unauthorized" => Some(LoginReason::Unauthorized),
            _ => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LoginReason::SessionExpired => "Your session has expired. Please log in again.",
            LoginReason::Unauthorized => "You are not authorized. Please log in again.",
        }
    }

    /// Login path carrying the reason as a query parameter
    pub fn login_path(&self) -> String {
        format!("{}?reason={}", LOGIN_ROUTE, self.as_query())
    }
}

/// Receives forced navigations to the login entry point
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self, reason: LoginReason);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin { return_to: String },
    RedirectHome,
}

impl RouteDecision {
    pub fn target(&self) -> Option<String> {
        match self {
            RouteDecision::Allow => None,
            RouteDecision::RedirectToLogin { return_to } => {
                Some(format!("{}?redirect={}", LOGIN_ROUTE, return_to))
            }
            RouteDecision::RedirectHome => Some(HOME_ROUTE.to_string()),
        }
    }
}

fn is_login_route(route: &str) -> bool {
    let path = route.split('?').next().unwrap_or(route);
    path.trim_end_matches('/') == LOGIN_ROUTE
}

pub fn guard(route: &str, authenticated: bool) -> RouteDecision {
    match (is_login_route(route), authenticated) {
        (true, true) => RouteDecision::RedirectHome,
        (true, false) => RouteDecision::Allow,
        (false, true) => RouteDecision::Allow,
        (false, false) => RouteDecision::RedirectToLogin {
            return_to: route.to_string(),
        },
    }
}

/// Pull the login reason out of a login path such as `/login?reason=unauthorized`
pub fn reason_from_path(path: &str) -> Option<LoginReason> {
    let (_, query) = path.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "reason")
        .and_then(|(_, value)| LoginReason::from_query(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_redirects_signed_out_users() {
        let decision = guard("/leads", false);
        assert_eq!(
            decision,
            RouteDecision::RedirectToLogin {
                return_to: "/leads".to_string()
            }
        );
        assert_eq!(decision.target(), Some("/login?redirect=/leads".to_string()));
    }

    #[test]
    fn test_guard_moves_signed_in_users_off_login() {
        assert_eq!(guard("/login", true), RouteDecision::RedirectHome);
        assert_eq!(guard("/login?reason=unauthorized", true), RouteDecision::RedirectHome);
        assert_eq!(guard("/login", false), RouteDecision::Allow);
        assert_eq!(guard("/accounts", true), RouteDecision::Allow);
    }

    #[test]
    fn test_login_reason_roundtrip_through_path() {
        for reason in [LoginReason::SessionExpired, LoginReason::Unauthorized] {
            assert_eq!(reason_from_path(&reason.login_path()), Some(reason));
        }
        assert_eq!(reason_from_path("/login"), None);
        assert_eq!(reason_from_path("/login?reason=bogus"), None);
    }
}
