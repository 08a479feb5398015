use std::sync::Arc;

use crate::auth::TokenCodec;
use crate::config::AppConfig;
use crate::gateway::{Gateway, HealthCheck};
use crate::services::{AuthService, ProductService};

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenCodec,
    pub auth: AuthService,
    pub products: ProductService,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new(config: AppConfig, gateway: Gateway) -> Self {
        let tokens = TokenCodec::new(&config.security.jwt_secret, config.security.jwt_expiry);

        Self {
            auth: AuthService::new(gateway.auth, gateway.users.clone(), tokens.clone()),
            products: ProductService::new(gateway.products, gateway.users),
            health: gateway.health,
            tokens,
        }
    }
}
