use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{Claims, TokenCodec};
use crate::error::ApiError;
use crate::models::Role;

/// Authenticated caller, inserted into request extensions by `jwt_auth_middleware`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("authentication required"))
    }
}

/// Verifies the bearer token and injects `AuthUser`; the inner service never
/// runs for unauthenticated requests.
pub async fn jwt_auth_middleware(
    State(tokens): State<TokenCodec>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(request.headers()).map_err(ApiError::unauthorized)?;

    let claims = tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::unauthorized("invalid or expired token")
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("authorization header is required")?
        .to_str()
        .map_err(|_| "authorization header format must be Bearer {token}")?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token),
        _ => Err("authorization header format must be Bearer {token}"),
    }
}

/// Roles allowed through `require_roles`
#[derive(Clone, Debug)]
pub struct RoleSet(Arc<[Role]>);

impl RoleSet {
    pub fn new(roles: impl Into<Arc<[Role]>>) -> Self {
        Self(roles.into())
    }

    pub fn allows(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// Role gate. Must run inside `jwt_auth_middleware`.
pub async fn require_roles(
    State(allowed): State<RoleSet>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("authentication required"))?;

    if !allowed.allows(user.role) {
        tracing::warn!(user_id = %user.user_id, role = %user.role, "Role not permitted");
        return Err(ApiError::forbidden("insufficient permissions"));
    }

    Ok(next.run(request).await)
}
