//! Bearer token inspection

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ConsoleError;

/// Claims carried by the backend's JWT access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerClaims {
    /// Expiration timestamp
    pub exp: i64,

    #[serde(default)]
    pub iat: Option<i64>,

    #[serde(default)]
    pub user_id: Option<serde_json::Value>,

    /// `access` or `refresh`
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Decoded view of a bearer token.
///
/// The signature is NOT verified; the backend remains the authority. This is
/// only used to report and anticipate expiry.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub claims: BearerClaims,
}

impl BearerToken {
    pub fn decode(raw: &str) -> Result<Self, ConsoleError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let token_data = decode::<BearerClaims>(raw, &DecodingKey::from_secret(b""), &validation)
            .map_err(|e| ConsoleError::TokenError(format!("Failed to decode token: {}", e)))?;

        Ok(Self {
            claims: token_data.claims,
        })
    }

    pub fn is_expired(&self) -> bool {
        self.claims.exp < Utc::now().timestamp()
    }

    /// Check if the token expires within the given number of seconds
    pub fn expires_within(&self, seconds: i64) -> bool {
        self.claims.exp < Utc::now().timestamp() + seconds
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.claims.exp, 0)
    }

    /// Seconds until expiry; negative once expired
    pub fn time_until_expiry(&self) -> i64 {
        self.claims.exp - Utc::now().timestamp()
    }
}
