//! Authentication types: login payloads, issued tokens, the resolved principal.

use serde::{Deserialize, Serialize};

use crate::{access::CapabilitySet, user::User};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Also deliver the refresh token as an HttpOnly cookie.
    #[serde(default)]
    pub remember_me: bool,
}

/// The token pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Which of the two token lifetimes a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub is_admin: bool,
    pub capabilities: CapabilitySet,
}

impl Principal {
    /// Build the principal for a stored account.
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            capabilities: CapabilitySet::for_account(user.is_admin),
        }
    }
}
