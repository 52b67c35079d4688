// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT Claims structure issued by the portal backend.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    /// User's role (e.g., 'USER', 'ADMIN').
    #[serde(default)]
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::Auth(format!("token subject '{}' is not a user id", self.sub)))
    }

    pub fn is_expired_at(&self, unix_seconds: u64) -> bool {
        (self.exp as u64) <= unix_seconds
    }
}

/// Reads the claims of a bearer token without verifying its signature.
///
/// The client never holds the signing secret; the backend still verifies every
/// request. This is only used to default the user id and to refuse a token that
/// has already expired before an exam is started.
pub fn inspect_token(token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(token_data.claims)
}

/// Like [`inspect_token`], but rejects tokens whose `exp` has passed.
pub fn inspect_live_token(token: &str) -> Result<Claims, AppError> {
    let claims = inspect_token(token)?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Auth(e.to_string()))?
        .as_secs();

    if claims.is_expired_at(now) {
        return Err(AppError::Auth("Token has expired".to_string()));
    }
    Ok(claims)
}
