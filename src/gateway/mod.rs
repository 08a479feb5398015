//! Access to the hosted backend: auth identities, profile records and product records.
//!
//! Services only see the traits below. `supabase` talks to the real platform,
//! `memory` keeps everything in process for tests and local runs.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::filter::ProductQuery;
use crate::models::{Product, ProductChanges, User, UserChanges};

pub mod memory;
pub mod supabase;

pub use memory::MemoryBackend;
pub use supabase::SupabaseClient;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected backend response: {0}")]
    Decode(String),

    #[error("backend returned no record after {0}")]
    EmptyResult(&'static str),
}

impl GatewayError {
    /// True when the backend refused the request because of its input (4xx)
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, GatewayError::Rejected { status, .. } if (400..500).contains(status))
    }
}

/// Identity created or confirmed by the auth subsystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub id: String,
    pub email: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Create an identity; the backend assigns its id
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity, GatewayError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity, GatewayError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: &User) -> Result<User, GatewayError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, GatewayError>;

    /// Returns `None` when no record has this id
    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, GatewayError>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &Product) -> Result<Product, GatewayError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, GatewayError>;

    /// Returns `None` when no record has this id
    async fn update(&self, id: &str, changes: &ProductChanges)
        -> Result<Option<Product>, GatewayError>;

    /// Returns `false` when no record has this id
    async fn delete(&self, id: &str) -> Result<bool, GatewayError>;

    /// Category filter first, then the page window
    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, GatewayError>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), GatewayError>;
}

/// Every backend capability the services need, behind shared trait objects
#[derive(Clone)]
pub struct Gateway {
    pub auth: Arc<dyn AuthProvider>,
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Gateway {
    pub fn supabase(config: &BackendConfig) -> Result<Self, GatewayError> {
        let client = SupabaseClient::new(config)?;
        Ok(Self {
            auth: Arc::new(client.clone()),
            users: Arc::new(client.users()),
            products: Arc::new(client.products()),
            health: Arc::new(client),
        })
    }

    pub fn in_memory(backend: MemoryBackend) -> Self {
        Self {
            auth: Arc::new(backend.clone()),
            users: Arc::new(backend.users()),
            products: Arc::new(backend.products()),
            health: Arc::new(backend),
        }
    }
}
