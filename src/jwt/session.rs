//! Session token verification.
//!
//! The auth backend issues HS256 access tokens signed with the project's JWT
//! secret. We only verify them: signature, expiry and audience. The `sub`
//! claim is the user id orders are recorded against.

use std::collections::HashSet;

use jwt_simple::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Cookie the auth backend's browser client stores the access token in.
pub const SESSION_COOKIE: &str = "sb-access-token";

/// Non-standard claims we read from a session token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// The authenticated caller, inserted into request extensions by
/// [`require_session`](crate::middleware::require_session).
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
    pub email: Option<String>,
}

pub struct SessionVerifier {
    key: HS256Key,
    audience: String,
}

impl SessionVerifier {
    pub fn new(secret: &str, audience: impl Into<String>) -> Self {
        Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
            audience: audience.into(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<SessionUser> {
        let options = VerificationOptions {
            allowed_audiences: Some(HashSet::from([self.audience.clone()])),
            ..Default::default()
        };

        let claims = self
            .key
            .verify_token::<SessionClaims>(token, Some(options))
            .map_err(|e| {
                tracing::debug!("Session token rejected: {}", e);
                AppError::Unauthorized
            })?;

        let user_id = claims
            .subject
            .filter(|s| !s.is_empty())
            .ok_or(AppError::Unauthorized)?;

        Ok(SessionUser {
            user_id,
            email: claims.custom.email,
        })
    }
}

impl std::fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}
