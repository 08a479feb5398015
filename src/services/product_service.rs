use std::sync::Arc;

use uuid::Uuid;

use crate::filter::ProductQuery;
use crate::gateway::{ProductStore, UserStore};
use crate::models::{CreateProductRequest, Product, ProductChanges, ProductWithUser, UpdateProductRequest};

use super::{ServiceError, ServiceResult};

/// Product lifecycle. Ownership is recorded in `created_by` but not enforced.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
    users: Arc<dyn UserStore>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>, users: Arc<dyn UserStore>) -> Self {
        Self { products, users }
    }

    pub async fn create(&self, req: CreateProductRequest, creator_id: &str) -> ServiceResult<Product> {
        req.validate().map_err(ServiceError::Validation)?;

        let product = Product::new(req, creator_id);
        let created = self
            .products
            .insert(&product)
            .await
            .map_err(ServiceError::gateway("failed to create product"))?;

        tracing::info!(product_id = %created.id, created_by = %created.created_by, "Product created");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Product> {
        product_id(id)?;
        self.products
            .find_by_id(id)
            .await
            .map_err(ServiceError::gateway("failed to get product"))?
            .ok_or_else(|| ServiceError::ProductNotFound(id.to_string()))
    }

    /// Product plus its creator. A failed creator lookup only drops the creator.
    pub async fn get_with_user(&self, id: &str) -> ServiceResult<ProductWithUser> {
        let product = self.get(id).await?;

        let created_by_user = match self.users.find_by_id(&product.created_by).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::warn!(product_id = %product.id, user_id = %product.created_by, "Product creator not found");
                None
            }
            Err(e) => {
                tracing::warn!(product_id = %product.id, user_id = %product.created_by, error = %e, "Product creator lookup failed");
                None
            }
        };

        Ok(ProductWithUser {
            product,
            created_by_user,
        })
    }

    pub async fn update(&self, id: &str, req: UpdateProductRequest) -> ServiceResult<Product> {
        product_id(id)?;
        req.validate().map_err(ServiceError::Validation)?;

        self.products
            .update(id, &ProductChanges::from(req))
            .await
            .map_err(ServiceError::gateway("failed to update product"))?
            .ok_or_else(|| ServiceError::ProductNotFound(id.to_string()))
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        product_id(id)?;
        let deleted = self
            .products
            .delete(id)
            .await
            .map_err(ServiceError::gateway("failed to delete product"))?;

        if !deleted {
            return Err(ServiceError::ProductNotFound(id.to_string()));
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    pub async fn list(&self, query: &ProductQuery) -> ServiceResult<Vec<Product>> {
        self.products
            .list(query)
            .await
            .map_err(ServiceError::gateway("failed to list products"))
    }
}

/// Product ids are always generated UUIDs; anything else cannot exist.
fn product_id(id: &str) -> ServiceResult<()> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ServiceError::ProductNotFound(id.to_string()))
}
