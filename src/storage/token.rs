//! Session token storage
//!
//! The session token is the only process-wide credential. It is kept in the
//! OS keyring between runs and read on every authenticated request.

use super::Result;
use crate::error::StorageError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::Deserialize;
use std::sync::Mutex;

const KEYRING_SERVICE: &str = "crmdesk";
const TOKEN_KEY_PREFIX: &str = "session-token";

/// Single slot holding the bearer token
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>>;
    fn set(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Token slot backed by the OS keyring, one entry per profile
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    profile_name: String,
}

impl KeyringTokenStore {
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            profile_name: profile_name.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(
            KEYRING_SERVICE,
            &format!("{}-{}", TOKEN_KEY_PREFIX, self.profile_name),
        )
        .map_err(|e| StorageError::KeyringError(e.to_string()))
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::KeyringError(e.to_string())),
        }
    }

    fn set(&self, token: &str) -> Result<()> {
        self.entry()?
            .set_password(token)
            .map_err(|e| StorageError::KeyringError(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            // Nothing stored is fine for logout
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::KeyringError(e.to_string())),
        }
    }
}

/// In-process token slot
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn set(&self, token: &str) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Read the `exp` claim (seconds since epoch) of a JWT-shaped token.
///
/// `Ok(None)` means the token carries no expiry; `Err` means the payload
/// could not be decoded at all.
pub fn token_expiry(token: &str) -> std::result::Result<Option<i64>, String> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| "token is not JWT-shaped".to_string())?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| format!("invalid token payload encoding: {}", e))?;
    let claims: Claims =
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid token claims: {}", e))?;
    Ok(claims.exp)
}

/// Undecodable tokens count as expired.
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match token_expiry(token) {
        Ok(Some(exp)) => exp < now.timestamp(),
        Ok(None) => false,
        Err(_) => true,
    }
}

pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Absent,
    Active { expires_at: Option<DateTime<Utc>> },
    /// The stored token was expired and has been cleared
    Expired,
}

/// Inspect the stored session, clearing it if it has expired
pub fn session_state(store: &dyn TokenStore) -> Result<SessionState> {
    let Some(token) = store.get()? else {
        return Ok(SessionState::Absent);
    };

    if is_expired(&token) {
        tracing::warn!("stored session token has expired, clearing it");
        store.clear()?;
        return Ok(SessionState::Expired);
    }

    let expires_at = token_expiry(&token)
        .ok()
        .flatten()
        .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0));
    Ok(SessionState::Active { expires_at })
}

/// An expired token is treated as absent.
pub fn is_authenticated(store: &dyn TokenStore) -> bool {
    matches!(session_state(store), Ok(SessionState::Active { .. }))
}

/// Build an unsigned JWT-shaped token carrying the given claims.
#[cfg(test)]
pub(crate) fn make_token(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_expiry_reads_exp_claim() {
        let token = make_token(json!({"sub": "42", "exp": 1_700_000_000}));
        assert_eq!(token_expiry(&token), Ok(Some(1_700_000_000)));

        let token = make_token(json!({"sub": "42"}));
        assert_eq!(token_expiry(&token), Ok(None));
    }

    #[test]
    fn test_token_expiry_rejects_garbage() {
        assert!(token_expiry("not-a-jwt").is_err());
        assert!(token_expiry("a.!!!.c").is_err());
    }

    #[test]
    fn test_is_expired_at() {
        let now = Utc::now();
        let past = make_token(json!({"exp": now.timestamp() - 60}));
        let future = make_token(json!({"exp": now.timestamp() + 3600}));
        let no_exp = make_token(json!({"sub": "1"}));

        assert!(is_expired_at(&past, now));
        assert!(!is_expired_at(&future, now));
        assert!(!is_expired_at(&no_exp, now));
        assert!(is_expired_at("garbage", now));
    }

    #[test]
    fn test_expired_token_is_treated_as_absent_and_cleared() {
        let expired = make_token(json!({"exp": Utc::now().timestamp() - 10}));
        let store = MemoryTokenStore::with_token(expired);

        assert!(!is_authenticated(&store));
        assert_eq!(store.get().expect("get"), None);
    }

    #[test]
    fn test_session_state_active() {
        let exp = Utc::now().timestamp() + 600;
        let store = MemoryTokenStore::with_token(make_token(json!({"exp": exp})));

        let state = session_state(&store).expect("state");
        assert_eq!(
            state,
            SessionState::Active {
                expires_at: DateTime::<Utc>::from_timestamp(exp, 0)
            }
        );
        assert!(is_authenticated(&store));
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(session_state(&store).expect("state"), SessionState::Absent);

        store.set("abc").expect("set");
        assert_eq!(store.get().expect("get"), Some("abc".to_string()));

        store.clear().expect("clear");
        assert_eq!(store.get().expect("get"), None);
    }
}
