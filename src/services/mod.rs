pub mod auth_service;
pub mod product_service;

pub use auth_service::AuthService;
pub use product_service::ProductService;

use thiserror::Error;

use crate::auth::TokenError;
use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("product {0} not found")]
    ProductNotFound(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("{context}: {source}")]
    Gateway {
        context: &'static str,
        #[source]
        source: GatewayError,
    },
}

impl ServiceError {
    /// Wrap a backend failure with what the service was doing at the time
    pub fn gateway(context: &'static str) -> impl FnOnce(GatewayError) -> Self {
        move |source| ServiceError::Gateway { context, source }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
