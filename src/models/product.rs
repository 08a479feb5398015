use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{reject_blank, require_text, User};

/// Catalog record stored in the `products` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(req: CreateProductRequest, created_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: req.name,
            description: req.description,
            price: req.price,
            category: req.category,
            image_url: req.image_url,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Product with its creator's profile when that lookup succeeded
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithUser {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_user: Option<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;
        require_text("category", &self.category)?;
        validate_price(self.price)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), String> {
        reject_blank("name", self.name.as_deref())?;
        reject_blank("description", self.description.as_deref())?;
        reject_blank("category", self.category.as_deref())?;
        match self.price {
            Some(price) => validate_price(price),
            None => Ok(()),
        }
    }
}

/// Patch body sent to the backend for a product update
#[derive(Debug, Clone, Serialize)]
pub struct ProductChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<UpdateProductRequest> for ProductChanges {
    fn from(req: UpdateProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            price: req.price,
            category: req.category,
            image_url: req.image_url,
            updated_at: Utc::now(),
        }
    }
}

impl ProductChanges {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(image_url) = &self.image_url {
            product.image_url = Some(image_url.clone());
        }
        product.updated_at = self.updated_at;
    }
}

fn validate_price(price: Decimal) -> Result<(), String> {
    if price <= Decimal::ZERO {
        return Err("price must be greater than 0".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_request(price: Decimal) -> CreateProductRequest {
        CreateProductRequest {
            name: "Lamp".to_string(),
            description: "Desk lamp".to_string(),
            price,
            category: "home".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_price_must_be_positive() {
        assert!(create_request(Decimal::new(1999, 2)).validate().is_ok());
        assert!(create_request(Decimal::ZERO).validate().is_err());
        assert!(create_request(Decimal::new(-5, 0)).validate().is_err());

        let update = UpdateProductRequest {
            price: Some(Decimal::ZERO),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_price_is_a_json_number() {
        let req: CreateProductRequest = serde_json::from_value(json!({
            "name": "Lamp",
            "description": "Desk lamp",
            "price": 19.99,
            "category": "home"
        }))
        .unwrap();
        assert_eq!(req.price, Decimal::new(1999, 2));

        let product = Product::new(req, "user-1");
        let body = serde_json::to_value(&product).unwrap();
        assert!(body["price"].is_number());
        assert!(body.get("image_url").is_none());
        assert_eq!(body["created_by"], "user-1");
    }

    #[test]
    fn test_with_user_flattens_product() {
        let product = Product::new(create_request(Decimal::ONE), "user-1");
        let body = serde_json::to_value(ProductWithUser {
            product: product.clone(),
            created_by_user: None,
        })
        .unwrap();
        assert_eq!(body["id"], product.id.as_str());
        assert!(body.get("created_by_user").is_none());
    }

    #[test]
    fn test_changes_apply_only_present_fields() {
        let mut product = Product::new(create_request(Decimal::ONE), "user-1");
        let changes = ProductChanges::from(UpdateProductRequest {
            price: Some(Decimal::new(250, 2)),
            ..Default::default()
        });
        changes.apply_to(&mut product);
        assert_eq!(product.price, Decimal::new(250, 2));
        assert_eq!(product.name, "Lamp");

        let body = serde_json::to_value(&changes).unwrap();
        assert_eq!(body.as_object().map(|o| o.len()), Some(2));
    }
}
