use crate::api::models::Envelope;
use crate::core::route_guard::{LoginReason, Navigator};
use crate::error::ApiError;
use crate::storage::token::{self, TokenStore};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const USER_AGENT: &str = concat!("crmdesk/", env!("CARGO_PKG_VERSION"));

/// Process-wide sink for request failures
pub type ErrorCallback = Arc<dyn Fn(&ApiError) + Send + Sync>;

pub enum RequestBody {
    Json(Value),
    /// Multipart bodies let the transport pick the boundary
    Multipart(Form),
}

#[derive(Default)]
pub struct RequestOptions {
    pub body: Option<RequestBody>,
    pub skip_auth: bool,
    pub skip_error_handler: bool,
}

impl RequestOptions {
    pub fn json(body: Value) -> Self {
        Self {
            body: Some(RequestBody::Json(body)),
            ..Self::default()
        }
    }

    pub fn multipart(form: Form) -> Self {
        Self {
            body: Some(RequestBody::Multipart(form)),
            ..Self::default()
        }
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn skip_error_handler(mut self) -> Self {
        self.skip_error_handler = true;
        self
    }
}

/// Token-aware HTTP wrapper around the CRM backend.
///
/// Clones share the token slot, the error callback and the navigator.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    pub base_url: String,
    tokens: Arc<dyn TokenStore>,
    on_error: Arc<OnceLock<ErrorCallback>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("error_handler", &self.on_error.get().is_some())
            .field("navigator", &self.navigator.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(
        base_url: String,
        tokens: Arc<dyn TokenStore>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::ClientInit(e.to_string()))?;

        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            on_error: Arc::new(OnceLock::new()),
            navigator: None,
        })
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Register the global error callback. Only the first registration wins;
    /// later calls return `false`.
    pub fn register_error_handler(&self, callback: ErrorCallback) -> bool {
        self.on_error.set(callback).is_ok()
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn current_token(&self) -> Option<String> {
        match self.tokens.get() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read session token");
                None
            }
        }
    }

    /// Single exit point for every failure
    fn fail(&self, error: ApiError, skip_error_handler: bool) -> ApiError {
        tracing::debug!(?error, "request failed");
        if !skip_error_handler {
            if let Some(callback) = self.on_error.get() {
                callback(&error);
            }
        }
        error
    }

    fn discard_session(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::warn!(error = %e, "could not clear session token");
        }
    }

    fn redirect_to_login(&self, reason: LoginReason) {
        tracing::warn!(reason = reason.as_query(), "session ended, redirecting to login");
        if let Some(navigator) = &self.navigator {
            navigator.redirect_to_login(reason);
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Envelope, ApiError> {
        let endpoint = path.trim_start_matches('/').to_string();
        let skip_handler = options.skip_error_handler;

        let token = if options.skip_auth {
            None
        } else {
            self.current_token()
        };

        // Local courtesy check, the backend still decides
        if let Some(token) = &token {
            if token::is_expired(token) {
                self.discard_session();
                let error = self.fail(ApiError::ExpiredSession { endpoint }, skip_handler);
                self.redirect_to_login(LoginReason::SessionExpired);
                return Err(error);
            }
        }

        let mut request = self.client.request(method.clone(), self.url(&endpoint));
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        request = match options.body {
            Some(RequestBody::Json(body)) => request.json(&body),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request.header(CONTENT_TYPE, "application/json"),
        };

        tracing::debug!(%method, url = %self.url(&endpoint), "sending request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return Err(self.fail(
                    ApiError::Network {
                        endpoint,
                        message: e.to_string(),
                    },
                    skip_handler,
                ));
            }
        };

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED && !options.skip_auth {
            self.discard_session();
            let error = self.fail(
                ApiError::Unauthorized {
                    status: status.as_u16(),
                    endpoint,
                },
                skip_handler,
            );
            self.redirect_to_login(LoginReason::Unauthorized);
            return Err(error);
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                return Err(self.fail(
                    ApiError::Network {
                        endpoint,
                        message: e.to_string(),
                    },
                    skip_handler,
                ));
            }
        };

        let envelope: Envelope = match serde_json::from_slice(&body) {
            Ok(envelope) => envelope,
            Err(_) => {
                return Err(self.fail(
                    ApiError::BadResponse {
                        status: status.as_u16(),
                        endpoint,
                    },
                    skip_handler,
                ));
            }
        };

        if !envelope.is_success {
            return Err(self.fail(
                ApiError::ApiFailure {
                    status: status.as_u16(),
                    code: envelope.response_code,
                    message: envelope.failure_message(),
                    endpoint,
                },
                skip_handler,
            ));
        }

        Ok(envelope)
    }

    pub async fn get(&self, path: &str) -> Result<Envelope, ApiError> {
        self.request(Method::GET, path, RequestOptions::default())
            .await
    }

    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<Envelope, ApiError> {
        self.request(Method::POST, path, options).await
    }

    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<Envelope, ApiError> {
        self.request(Method::PUT, path, options).await
    }

    pub async fn delete(&self, path: &str) -> Result<Envelope, ApiError> {
        self.request(Method::DELETE, path, RequestOptions::default())
            .await
    }
}
