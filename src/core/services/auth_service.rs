use super::types::AuthStatus;
use crate::Result;
use crate::api::client::{ApiClient, RequestOptions};
use crate::api::models::LoginRequest;
use crate::core::route_guard::{LoginReason, reason_from_path};
use crate::error::{AuthError, ServiceError};
use crate::storage::token::session_state;

const LOGIN_ENDPOINT: &str = "auth/login";

/// Credentials entered on the login screen
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(AuthError::LoginFailed("Email cannot be empty".to_string()).into());
        }
        if !self.email.contains('@') {
            return Err(AuthError::LoginFailed(format!(
                "'{}' is not a valid email address",
                self.email
            ))
            .into());
        }
        if self.password.is_empty() {
            return Err(AuthError::LoginFailed("Password cannot be empty".to_string()).into());
        }
        Ok(())
    }
}

/// Session lifecycle for one profile
pub struct AuthService {
    client: ApiClient,
    profile_name: String,
}

impl AuthService {
    pub fn new(client: ApiClient, profile_name: impl Into<String>) -> Self {
        Self {
            client,
            profile_name: profile_name.into(),
        }
    }

    /// Exchange credentials for a session token and store it
    pub async fn login(&self, input: LoginInput) -> Result<AuthStatus> {
        input.validate()?;

        let request = LoginRequest {
            email: input.email.trim().to_string(),
            password: input.password,
        };
        let body = serde_json::to_value(&request).map_err(|e| ServiceError::InvalidPayload {
            message: e.to_string(),
        })?;

        let envelope = self
            .client
            .post(LOGIN_ENDPOINT, RequestOptions::json(body).skip_auth())
            .await?;

        let token = envelope
            .token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.client.tokens().set(&token)?;
        tracing::debug!(profile = %self.profile_name, "stored session token");

        self.status()
    }

    /// Clear the token slot. The backend keeps no session to end.
    pub fn logout(&self) -> Result<()> {
        self.client.tokens().clear()?;
        Ok(())
    }

    pub fn status(&self) -> Result<AuthStatus> {
        Ok(AuthStatus {
            profile_name: self.profile_name.clone(),
            api_url: self.client.base_url.clone(),
            session: session_state(self.client.tokens().as_ref())?,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_ok_and(|status| status.is_authenticated())
    }

    /// Contextual message for a login redirect such as `/login?reason=unauthorized`
    pub fn login_message(redirect: Option<&str>) -> Option<&'static str> {
        redirect
            .and_then(|path| {
                reason_from_path(path).or_else(|| LoginReason::from_query(path))
            })
            .map(|reason| reason.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::token::{MemoryTokenStore, SessionState, make_token};
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(base_url: String) -> AuthService {
        let client = ApiClient::new(base_url, Arc::new(MemoryTokenStore::new()), None)
            .expect("client");
        AuthService::new(client, "default")
    }

    #[test]
    fn test_login_input_validation() {
        let input = |email: &str, password: &str| LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        };
        assert!(input("admin@crm.test", "secret").validate().is_ok());
        assert!(input("", "secret").validate().is_err());
        assert!(input("admin", "secret").validate().is_err());
        assert!(input("admin@crm.test", "").validate().is_err());
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server = MockServer::start().await;
        let token = make_token(json!({"sub": "1", "exp": chrono::Utc::now().timestamp() + 3600}));
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(body_json(json!({"email": "admin@crm.test", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isSuccess": true,
                "responseCode": 200,
                "token": token
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service(server.uri());
        let status = service
            .login(LoginInput {
                email: " admin@crm.test ".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        assert!(status.is_authenticated());
        assert!(status.expires_at().is_some());
        assert!(service.is_authenticated());

        service.logout().unwrap();
        assert_eq!(service.status().unwrap().session, SessionState::Absent);
    }

    #[tokio::test]
    async fn test_login_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isSuccess": true,
                "responseCode": 200
            })))
            .mount(&server)
            .await;

        let result = service(server.uri())
            .login(LoginInput {
                email: "admin@crm.test".to_string(),
                password: "secret".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(crate::AppError::Auth(AuthError::MissingToken))
        ));
    }

    #[test]
    fn test_login_message_from_redirect() {
        assert_eq!(
            AuthService::login_message(Some("/login?reason=session_expired")),
            Some(LoginReason::SessionExpired.message())
        );
        assert_eq!(
            AuthService::login_message(Some("unauthorized")),
            Some(LoginReason::Unauthorized.message())
        );
        assert_eq!(AuthService::login_message(None), None);
    }
}
