use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::common::{Role, UserId};
use crate::server::auth::{Claims, JwtService};

/// Caller identity vouched for by the identity provider's token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// Attach an `AuthUser` extension when the request carries a valid token.
///
/// A missing or bad token is not rejected here: the request continues
/// anonymously and each handler decides whether it needs a user.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match bearer_token(request.headers()).and_then(|token| authenticate(token, &jwt_service)) {
        Some(user) => {
            debug!(user_id = %user.user_id, role = ?user.role, "Authenticated request");
            request.extensions_mut().insert(user);
        }
        None => debug!("Anonymous request"),
    }

    next.run(request).await
}

/// Token from `Authorization`, with or without the `Bearer ` prefix.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    (!token.is_empty()).then_some(token)
}

/// Verify a raw token. Used by the middleware and by endpoints that accept
/// the token as a query parameter.
pub fn authenticate(token: &str, jwt_service: &JwtService) -> Option<AuthUser> {
    jwt_service.verify_token(token).ok().map(AuthUser::from)
}
