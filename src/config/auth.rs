// src/config/auth.rs
use serde::Deserialize;
use std::env;

pub const ENV_SIGNING_KEY: &str = "JWT_SIGNING_KEY";
/// One year.
pub const MAX_EXPIRY_MINUTES: i64 = 365 * 24 * 60;

fn default_signing_key() -> String {
    "ENV".to_string()
}
fn default_issuer() -> String {
    "api-aggregator".to_string()
}
fn default_audience() -> String {
    "api-aggregator-clients".to_string()
}
fn default_expiry_minutes() -> i64 {
    60
}
fn default_username() -> String {
    "test".to_string()
}
fn default_password() -> String {
    "password".to_string()
}

/// Settings for the login endpoint and token signing.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// "ENV" means: read from `JWT_SIGNING_KEY`.
    #[serde(default = "default_signing_key", alias = "key")]
    pub signing_key: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: i64,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: default_signing_key(),
            issuer: default_issuer(),
            audience: default_audience(),
            expiry_minutes: default_expiry_minutes(),
            username: default_username(),
            password: default_password(),
        }
    }
}

impl AuthConfig {
    /// Resolve the signing key. A missing env var yields an empty key, which
    /// token issuance rejects.
    pub fn resolved_key(&self) -> String {
        if self.signing_key.trim().eq_ignore_ascii_case("env") {
            env::var(ENV_SIGNING_KEY).unwrap_or_default()
        } else {
            self.signing_key.clone()
        }
    }

    pub(crate) fn sanitized(mut self) -> Self {
        if self.expiry_minutes <= 0 {
            self.expiry_minutes = default_expiry_minutes();
        }
        self.expiry_minutes = self.expiry_minutes.min(MAX_EXPIRY_MINUTES);
        if self.issuer.trim().is_empty() {
            self.issuer = default_issuer();
        }
        if self.audience.trim().is_empty() {
            self.audience = default_audience();
        }
        self
    }
}
