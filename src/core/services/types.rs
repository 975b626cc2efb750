use crate::storage::token::SessionState;
use chrono::{DateTime, Utc};

/// Authentication status of a profile
#[derive(Debug, Clone, PartialEq)]
pub struct AuthStatus {
    pub profile_name: String,
    pub api_url: String,
    pub session: SessionState,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self.session, SessionState::Active { .. })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self.session {
            SessionState::Active { expires_at } => expires_at,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_status_accessors() {
        let expires_at = DateTime::<Utc>::from_timestamp(1_900_000_000, 0);
        let status = AuthStatus {
            profile_name: "default".to_string(),
            api_url: "http://localhost:8080/api".to_string(),
            session: SessionState::Active { expires_at },
        };
        assert!(status.is_authenticated());
        assert_eq!(status.expires_at(), expires_at);

        let status = AuthStatus {
            session: SessionState::Expired,
            ..status
        };
        assert!(!status.is_authenticated());
        assert_eq!(status.expires_at(), None);
    }
}
