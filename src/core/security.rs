use axum::http::{header::AUTHORIZATION, HeaderMap};
use subtle::ConstantTimeEq;

use crate::core::config::AdminConfig;
use crate::core::errors::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// Admin password and the bearer token it unlocks.
///
/// Empty values never authenticate: a deployment without configured
/// credentials rejects every admin request.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    password: String,
    token: String,
}

impl AdminCredentials {
    pub fn new(password: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(config.password.clone(), config.token.clone())
    }

    pub fn login(&self, password: &str) -> Result<&str, ApiError> {
        if self.password.is_empty() || self.token.is_empty() {
            return Err(ApiError::Unauthorized);
        }
        if !constant_time_eq(password, &self.password) {
            return Err(ApiError::Unauthorized);
        }
        Ok(&self.token)
    }
}

pub fn require_admin(headers: &HeaderMap, credentials: &AdminCredentials) -> Result<(), ApiError> {
    if credentials.token.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .unwrap_or("");

    if presented.is_empty() || !constant_time_eq(presented, &credentials.token) {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
