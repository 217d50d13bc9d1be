//! Request extractors for authenticated routes.
//!
//! The session token is read from the `payload-token` cookie, falling back to
//! an `Authorization: JWT <token>` or `Authorization: Bearer <token>` header.
//! The identity behind it is loaded from the store on every request.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::errors::AuthError;
use super::models::Identity;
use super::service::COOKIE_NAME;
use crate::errors::AppError;
use crate::AppState;

/// Session token carried by the request, if any. Empty values count as absent.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, token)| *name == COOKIE_NAME && !token.trim().is_empty())
        .map(|(_, token)| token.trim().to_string())
        .next();

    from_cookie.or_else(|| {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        let known = scheme.eq_ignore_ascii_case("jwt") || scheme.eq_ignore_ascii_case("bearer");
        (known && !token.is_empty()).then(|| token.to_string())
    })
}

/// The authenticated requester. Rejects with 401 when no valid session is present.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(AuthError::Unauthenticated)?;
        let store = state.store.get().await?;
        let identity = state.auth.identify(store.as_ref(), &token).await?;
        Ok(CurrentUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(axum::http::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_token_from_cookie() {
        let map = headers(&[(COOKIE, "theme=dark; payload-token=abc.def.ghi; lang=en")]);
        assert_eq!(session_token(&map).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_token_from_authorization_header() {
        assert_eq!(
            session_token(&headers(&[(AUTHORIZATION, "JWT abc")])).as_deref(),
            Some("abc")
        );
        assert_eq!(
            session_token(&headers(&[(AUTHORIZATION, "Bearer xyz")])).as_deref(),
            Some("xyz")
        );
        assert_eq!(session_token(&headers(&[(AUTHORIZATION, "Basic dXNlcg==")])), None);
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let map = headers(&[(COOKIE, "payload-token=from-cookie"), (AUTHORIZATION, "JWT from-header")]);
        assert_eq!(session_token(&map).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_cleared_cookie_falls_back_to_header() {
        let map = headers(&[(COOKIE, "payload-token=; theme=dark"), (AUTHORIZATION, "JWT from-header")]);
        assert_eq!(session_token(&map).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_empty_or_missing_token() {
        assert_eq!(session_token(&headers(&[(COOKIE, "payload-token=")])), None);
        assert_eq!(session_token(&headers(&[(AUTHORIZATION, "Bearer ")])), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
