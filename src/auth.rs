//! Credential check + signed token issuance for `POST /api/auth/login`.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// HS256 needs a key at least as long as the digest.
pub const MIN_KEY_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Email", alias = "username")]
    pub email: String,
    #[serde(alias = "Password")]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub struct TokenIssuer {
    cfg: AuthConfig,
    key: String,
}

impl TokenIssuer {
    pub fn new(cfg: AuthConfig) -> Self {
        let key = cfg.resolved_key();
        Self { cfg, key }
    }

    pub fn credentials_match(&self, req: &LoginRequest) -> bool {
        req.email == self.cfg.username && req.password == self.cfg.password
    }

    pub fn claims_for(&self, subject: &str) -> Result<Claims, AuthError> {
        let now = Utc::now();
        let minutes = self.cfg.expiry_minutes;
        let exp = TimeDelta::try_minutes(minutes)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or(AuthError::ExpiryOutOfRange { minutes })?;
        Ok(Claims {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }

    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        if self.key.len() < MIN_KEY_LEN {
            return Err(AuthError::WeakKey {
                min: MIN_KEY_LEN,
                len: self.key.len(),
            });
        }
        let claims = self.claims_for(subject)?;
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.key.as_bytes()),
        )?;
        Ok(token)
    }

    /// `Ok(None)` on credential mismatch.
    pub fn login(&self, req: &LoginRequest) -> Result<Option<String>, AuthError> {
        if !self.credentials_match(req) {
            return Ok(None);
        }
        self.issue(&req.email).map(Some)
    }
}
