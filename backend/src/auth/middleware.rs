//! Authentication middleware
//!
//! Bearer token gate for protected routes, usable either as an extractor
//! ([`AuthUser`]) or as a route layer ([`auth_middleware`]).
//!
//! Every rejection looks the same to the client. The reason is logged at
//! debug level.

use super::error::AuthError;
use crate::error::ApiError;
use crate::services::AuthService;
use crate::state::AppState;
use axum::{
    extract::{FromRef, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated user resolved from the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Resolve the caller from a raw `Authorization` header value
pub fn authenticate(service: &AuthService, header: Option<&str>) -> Result<AuthUser, AuthError> {
    let Some(header) = header else {
        debug!("Rejected request: missing authorization header");
        return Err(AuthError::Unauthenticated);
    };

    let Some(token) = header.strip_prefix(BEARER_PREFIX) else {
        debug!("Rejected request: authorization header is not a bearer token");
        return Err(AuthError::Unauthenticated);
    };

    match service.validate_token(token) {
        Ok(user_id) => Ok(AuthUser { user_id }),
        Err(e) => {
            debug!(reason = %e, "Rejected request: access token invalid");
            Err(AuthError::Unauthenticated)
        }
    }
}

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by `auth_middleware` on this route
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let app_state = AppState::from_ref(state);
        Ok(authenticate(app_state.auth(), authorization_header(&parts.headers))?)
    }
}

/// Route layer that rejects unauthenticated requests and stores
/// [`AuthUser`] in the request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(state.auth(), authorization_header(request.headers()))?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ManualClock, PasswordService, TokenCodec};
    use crate::config::Argon2Config;
    use crate::repositories::MemoryStore;
    use crate::services::AuthSettings;
    use chrono::Duration;
    use proptest::prelude::*;
    use rstest::rstest;
    use std::sync::Arc;

    const SECRET: &[u8] = b"test-secret-key-for-testing-only-32chars";

    fn gate() -> (AuthService, TokenCodec, Arc<ManualClock>) {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::default());
        let codec = TokenCodec::new(SECRET, clock.clone());
        let service = AuthService::new(
            Arc::new(store.clone()),
            Arc::new(store),
            codec.clone(),
            PasswordService::new(&Argon2Config {
                memory_kib: 256,
                iterations: 1,
                parallelism: 1,
            })
            .unwrap(),
            clock.clone(),
            AuthSettings::default(),
        );
        (service, codec, clock)
    }

    #[test]
    fn test_valid_bearer_token() {
        let (service, codec, _) = gate();
        let token = codec.issue(5, Duration::hours(24)).unwrap();
        let header = format!("Bearer {}", token);

        let user = authenticate(&service, Some(&header)).unwrap();
        assert_eq!(user, AuthUser { user_id: 5 });
    }

    /// `{token}` stands for an access token that has already expired
    #[rstest]
    #[case::missing(None)]
    #[case::empty(Some(""))]
    #[case::no_scheme(Some("{token}"))]
    #[case::lowercase_scheme(Some("bearer {token}"))]
    #[case::expired(Some("Bearer {token}"))]
    #[case::scheme_only(Some("Bearer "))]
    fn test_rejections_are_uniform(#[case] template: Option<&str>) {
        let (service, codec, clock) = gate();
        let token = codec.issue(5, Duration::hours(24)).unwrap();
        clock.advance(Duration::hours(25));

        let header = template.map(|t| t.replace("{token}", &token));
        let err = authenticate(&service, header.as_deref()).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated), "header {:?}", header);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Arbitrary header values never authenticate
        #[test]
        fn prop_garbage_headers_rejected(header in "(Bearer |Basic |bearer )?[a-zA-Z0-9._-]{0,80}") {
            let (service, _, _) = gate();
            let result = authenticate(&service, Some(&header));
            prop_assert!(matches!(result, Err(AuthError::Unauthenticated)));
        }
    }
}
