//! Token service: signed identity tokens carried inside the session cookie.
//!
//! Tokens are HS256 JWTs with `sub` (the user id), `iss` and `iat`. No `exp`
//! claim is issued or checked; the session cookie lifetime bounds how long a
//! token stays usable.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::{Error, UserId};

/// Message returned when a presented token cannot be trusted.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid authorization token, try logging in again.";

/// Failures raised by [`TokenService`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Signature, structure, issuer or subject did not check out.
    #[error("invalid token")]
    InvalidToken,
    /// The token could not be signed.
    #[error("token signing failed: {message}")]
    Signing {
        /// Library error description.
        message: String,
    },
}

impl From<TokenError> for Error {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::InvalidToken => Self::unauthorized(INVALID_TOKEN_MESSAGE),
            TokenError::Signing { message } => Self::internal(message),
        }
    }
}

/// Issuer name and signing secret, built once at startup.
#[derive(Clone)]
pub struct TokenSettings {
    issuer: String,
    secret: Zeroizing<Vec<u8>>,
}

impl TokenSettings {
    /// Bundle an issuer with its HMAC secret.
    pub fn new(issuer: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            issuer: issuer.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Issuer stamped into and required from every token.
    #[must_use]
    pub fn issuer(&self) -> &str {
        self.issuer.as_str()
    }

    /// Raw secret bytes.
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        self.secret.as_slice()
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("issuer", &self.issuer)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Signed token string as stored in the session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Verified contents of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    /// Authenticated user.
    pub subject: UserId,
    /// Issuer that signed the token.
    pub issuer: String,
    /// Signing time.
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    iss: String,
    iat: i64,
}

/// Issues and validates identity tokens.
#[derive(Clone)]
pub struct TokenService {
    issuer: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Build a service from explicit settings and a clock.
    #[must_use]
    pub fn new(settings: &TokenSettings, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["iss", "sub"]);
        validation.set_issuer(&[settings.issuer()]);
        Self {
            issuer: settings.issuer().to_owned(),
            encoding: EncodingKey::from_secret(settings.secret()),
            decoding: DecodingKey::from_secret(settings.secret()),
            validation,
            clock,
        }
    }

    /// Sign a token asserting `user` as the subject.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use mockable::DefaultClock;
    /// use tsuki::domain::{TokenService, TokenSettings, UserId};
    ///
    /// let tokens = TokenService::new(&TokenSettings::new("tsuki", b"secret".to_vec()), Arc::new(DefaultClock));
    /// let user = UserId::random();
    /// let token = tokens.issue(&user).expect("signing succeeds");
    /// assert_eq!(tokens.validate(token.as_str()).expect("valid").subject, user);
    /// ```
    pub fn issue(&self, user: &UserId) -> Result<SessionToken, TokenError> {
        let claims = WireClaims {
            sub: user.to_string(),
            iss: self.issuer.clone(),
            iat: self.clock.utc().timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(SessionToken)
            .map_err(|err| TokenError::Signing {
                message: err.to_string(),
            })
    }

    /// Verify signature, structure and issuer of `token`.
    ///
    /// Every failure collapses to [`TokenError::InvalidToken`].
    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<WireClaims>(token, &self.decoding, &self.validation).map_err(|err| {
            tracing::debug!(kind = ?err.kind(), "token rejected");
            TokenError::InvalidToken
        })?;
        let WireClaims { sub, iss, iat } = data.claims;
        let subject = UserId::new(&sub).map_err(|_| TokenError::InvalidToken)?;
        let issued_at = Utc
            .timestamp_opt(iat, 0)
            .single()
            .ok_or(TokenError::InvalidToken)?;
        Ok(TokenClaims {
            subject,
            issuer: iss,
            issued_at,
        })
    }
}
