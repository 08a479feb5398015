use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthIdentity, AuthProvider, GatewayError, HealthCheck, ProductStore, UserStore};
use crate::filter::ProductQuery;
use crate::models::{Product, ProductChanges, User, UserChanges};

#[derive(Debug, Default)]
struct Account {
    id: String,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    users: Vec<User>,
    products: Vec<Product>,
}

/// In-process backend honoring the same contract as the hosted one.
/// Records keep insertion order, which is also `created_at` order.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> MemoryUsers {
        MemoryUsers {
            state: self.state.clone(),
        }
    }

    pub fn products(&self) -> MemoryProducts {
        MemoryProducts {
            state: self.state.clone(),
        }
    }

    /// Number of auth identities, including ones without a profile record
    pub async fn account_count(&self) -> usize {
        self.state.read().await.accounts.len()
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthIdentity, GatewayError> {
        let mut state = self.state.write().await;
        let key = email.trim().to_lowercase();
        if state.accounts.contains_key(&key) {
            return Err(GatewayError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }

        let id = Uuid::new_v4().to_string();
        state.accounts.insert(
            key,
            Account {
                id: id.clone(),
                password: password.to_string(),
            },
        );
        Ok(AuthIdentity {
            id,
            email: email.to_string(),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthIdentity, GatewayError> {
        let state = self.state.read().await;
        match state.accounts.get(&email.trim().to_lowercase()) {
            Some(account) if account.password == password => Ok(AuthIdentity {
                id: account.id.clone(),
                email: email.to_string(),
            }),
            _ => Err(GatewayError::InvalidCredentials),
        }
    }
}

#[async_trait]
impl HealthCheck for MemoryBackend {
    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MemoryUsers {
    state: Arc<RwLock<State>>,
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn insert(&self, user: &User) -> Result<User, GatewayError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.id == user.id || u.email == user.email) {
            return Err(GatewayError::Rejected {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }
        state.users.push(user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, GatewayError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update(&self, id: &str, changes: &UserChanges) -> Result<Option<User>, GatewayError> {
        let mut state = self.state.write().await;
        Ok(state.users.iter_mut().find(|u| u.id == id).map(|user| {
            changes.apply_to(user);
            user.clone()
        }))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryProducts {
    state: Arc<RwLock<State>>,
}

#[async_trait]
impl ProductStore for MemoryProducts {
    async fn insert(&self, product: &Product) -> Result<Product, GatewayError> {
        let mut state = self.state.write().await;
        if state.products.iter().any(|p| p.id == product.id) {
            return Err(GatewayError::Rejected {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }
        state.products.push(product.clone());
        Ok(product.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>, GatewayError> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn update(
        &self,
        id: &str,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, GatewayError> {
        let mut state = self.state.write().await;
        Ok(state.products.iter_mut().find(|p| p.id == id).map(|product| {
            changes.apply_to(product);
            product.clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, GatewayError> {
        let mut state = self.state.write().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        Ok(state.products.len() != before)
    }

    async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, GatewayError> {
        let state = self.state.read().await;
        let matching: Vec<Product> = state
            .products
            .iter()
            .filter(|p| query.matches_category(&p.category))
            .cloned()
            .collect();
        Ok(query.page.window(matching))
    }
}
