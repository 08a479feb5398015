use std::sync::Arc;

use crate::auth::TokenCodec;
use crate::gateway::{AuthProvider, GatewayError, UserStore};
use crate::models::{CreateUserRequest, LoginRequest, LoginResponse, UpdateUserRequest, User, UserChanges};

use super::{ServiceError, ServiceResult};

/// Registration, login and self-service profile operations
#[derive(Clone)]
pub struct AuthService {
    auth: Arc<dyn AuthProvider>,
    users: Arc<dyn UserStore>,
    tokens: TokenCodec,
}

impl AuthService {
    pub fn new(auth: Arc<dyn AuthProvider>, users: Arc<dyn UserStore>, tokens: TokenCodec) -> Self {
        Self { auth, users, tokens }
    }

    /// Create the auth identity, then the profile record under the same id.
    ///
    /// The two writes are not atomic. If the profile insert fails the identity
    /// stays behind in the auth subsystem and the error is returned as is.
    pub async fn register(&self, req: CreateUserRequest) -> ServiceResult<User> {
        req.validate().map_err(ServiceError::Validation)?;

        let identity = self
            .auth
            .sign_up(req.email.trim(), &req.password)
            .await
            .map_err(|e| match e {
                e if e.is_client_rejection() => ServiceError::Validation(e.to_string()),
                e => ServiceError::gateway("failed to create user in auth")(e),
            })?;

        let profile = User::new(identity.id, req.email.trim(), req.first_name, req.last_name);
        let user = self.users.insert(&profile).await.map_err(|e| {
            tracing::error!(
                user_id = %profile.id,
                error = %e,
                "Profile insert failed after auth sign-up; auth identity left without a profile"
            );
            ServiceError::gateway("failed to create user profile")(e)
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> ServiceResult<LoginResponse> {
        req.validate().map_err(ServiceError::Validation)?;

        let identity = self
            .auth
            .sign_in(req.email.trim(), &req.password)
            .await
            .map_err(|e| match e {
                GatewayError::InvalidCredentials => ServiceError::InvalidCredentials,
                e => ServiceError::gateway("authentication failed")(e),
            })?;

        let user = self
            .users
            .find_by_id(&identity.id)
            .await
            .map_err(ServiceError::gateway("failed to load user profile"))?
            .ok_or_else(|| {
                tracing::warn!(user_id = %identity.id, "Authenticated identity has no profile record");
                ServiceError::UserNotFound(identity.id.clone())
            })?;

        let token = self.tokens.issue(&user.id, &user.email, user.role)?;

        Ok(LoginResponse {
            user,
            token,
            expires_in: self.tokens.ttl_secs(),
        })
    }

    pub async fn profile(&self, user_id: &str) -> ServiceResult<User> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(ServiceError::gateway("failed to load user profile"))?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))
    }

    pub async fn update_profile(&self, user_id: &str, req: UpdateUserRequest) -> ServiceResult<User> {
        req.validate().map_err(ServiceError::Validation)?;

        self.users
            .update(user_id, &UserChanges::from(req))
            .await
            .map_err(ServiceError::gateway("failed to update user profile"))?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))
    }
}
