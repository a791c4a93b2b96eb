use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Identity;
use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session secret not configured")]
    MissingSecret,

    #[error("Session token generation error: {0}")]
    TokenGeneration(String),
}

/// Claims carried by a session token. `sub` is the student id.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// A decoded, unexpired session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and validates stateless session tokens (HS256). Nothing is stored
/// server side, so a token stays valid until it expires.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
    cookie_name: String,
    secure_cookies: bool,
}

impl SessionIssuer {
    pub fn new(secret: &str, expiry: Duration, cookie_name: impl Into<String>, secure_cookies: bool) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::MissingSecret);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry,
            cookie_name: cookie_name.into(),
            secure_cookies,
        })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, SessionError> {
        Self::new(
            &config.session_secret,
            Duration::hours(config.session_expiry_hours as i64),
            config.session_cookie.clone(),
            config.secure_cookies,
        )
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedSession, SessionError> {
        let now = Utc::now();
        let expires_at = now + self.expiry;
        let claims = SessionClaims {
            sub: identity.id,
            email: identity.email.clone(),
            name: identity.name.clone(),
            username: identity.username.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::TokenGeneration(e.to_string()))?;
        Ok(IssuedSession { token, expires_at })
    }

    /// Missing, malformed, tampered and expired tokens all decode to `None`.
    pub fn decode(&self, token: &str) -> Option<Session> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => {
                let claims = data.claims;
                let expires_at = Utc.timestamp_opt(claims.exp, 0).single()?;
                Some(Session {
                    id: claims.sub,
                    email: claims.email,
                    name: claims.name,
                    username: claims.username,
                    expires_at,
                })
            }
            Err(e) => {
                tracing::warn!("Rejected session token: {}", e);
                None
            }
        }
    }

    /// `Set-Cookie` value carrying a freshly issued token
    pub fn cookie(&self, issued: &IssuedSession) -> String {
        let max_age = (issued.expires_at - Utc::now()).num_seconds().max(0);
        self.cookie_with(&issued.token, max_age)
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn clear_cookie(&self) -> String {
        self.cookie_with("", 0)
    }

    fn cookie_with(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!("{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}", self.cookie_name, value, max_age);
        if self.secure_cookies {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "ana@uni.edu".to_string(),
            username: "ana".to_string(),
            name: "Ana Silva".to_string(),
        }
    }

    fn issuer(expiry: Duration) -> SessionIssuer {
        SessionIssuer::new("test-secret", expiry, "showcase-session", false).unwrap()
    }

    #[test]
    fn issued_tokens_decode_to_the_same_identity() {
        let who = identity();
        let issuer = issuer(Duration::hours(1));
        let issued = issuer.issue(&who).unwrap();
        let session = issuer.decode(&issued.token).unwrap();
        assert_eq!(session.id, who.id);
        assert_eq!(session.username, "ana");
        assert_eq!(session.name, "Ana Silva");
        assert_eq!(session.expires_at.timestamp(), issued.expires_at.timestamp());
    }

    #[test]
    fn expired_tokens_are_unauthenticated() {
        let issuer = issuer(Duration::hours(-2));
        let issued = issuer.issue(&identity()).unwrap();
        assert!(issuer.decode(&issued.token).is_none());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let other = SessionIssuer::new("other-secret", Duration::hours(1), "s", false).unwrap();
        let issued = other.issue(&identity()).unwrap();
        assert!(issuer(Duration::hours(1)).decode(&issued.token).is_none());
        assert!(issuer(Duration::hours(1)).decode("not.a.token").is_none());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            SessionIssuer::new("", Duration::hours(1), "s", false),
            Err(SessionError::MissingSecret)
        ));
    }

    #[test]
    fn cookie_attributes() {
        let issuer = SessionIssuer::new("k", Duration::hours(1), "showcase-session", true).unwrap();
        let issued = issuer.issue(&identity()).unwrap();
        let cookie = issuer.cookie(&issued);
        assert!(cookie.starts_with(&format!("showcase-session={};", issued.token)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.ends_with("; Secure"));
        assert!(issuer.clear_cookie().contains("Max-Age=0"));
    }
}
