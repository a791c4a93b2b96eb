use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Session, SessionIssuer};
use crate::error::ApiError;
use crate::state::AppState;

/// Session middleware for protected routes. A valid session is injected
/// into request extensions; anything else is a 401.
pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let session = session_from_headers(request.headers(), &state.sessions)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    tracing::debug!("Authenticated request for {}", session.username);
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Session when the caller sent a valid one, `None` otherwise. Never rejects.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(OptionalSession(Some(session.clone())));
        }
        Ok(OptionalSession(session_from_headers(&parts.headers, &state.sessions)))
    }
}

pub fn session_from_headers(headers: &HeaderMap, sessions: &SessionIssuer) -> Option<Session> {
    let token = extract_token(headers, sessions.cookie_name())?;
    sessions.decode(&token)
}

/// Bearer token from `Authorization`, falling back to the session cookie
fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(auth) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("showcase-session=def"));
        assert_eq!(extract_token(&headers, "showcase-session").as_deref(), Some("abc"));
    }

    #[test]
    fn finds_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; showcase-session=tok; lang=pt"));
        assert_eq!(extract_token(&headers, "showcase-session").as_deref(), Some("tok"));
    }

    #[test]
    fn cleared_cookie_is_no_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("showcase-session="));
        assert_eq!(extract_token(&headers, "showcase-session"), None);
        assert_eq!(extract_token(&HeaderMap::new(), "showcase-session"), None);
    }
}
