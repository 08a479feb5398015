use axum::extract::{Path, RawQuery, State};

use crate::filter::{ListParams, ProductQuery};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::models::{CreateProductRequest, Product, ProductWithUser, UpdateProductRequest};
use crate::state::AppState;

/// POST /api/v1/products - the caller becomes `created_by`
pub async fn product_post(
    State(state): State<AppState>,
    caller: AuthUser,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> ApiResult<Product> {
    let product = state.products.create(req, &caller.user_id).await?;
    Ok(ApiResponse::created(product).with_message("Product created successfully"))
}

/// GET /api/v1/products?page=&page_size=&category=
///
/// Bad paging values fall back to defaults rather than failing the request;
/// a repeated key keeps its first value.
pub async fn product_list(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> ApiResult<Vec<Product>> {
    let query = ProductQuery::from(ListParams::from_query(raw.as_deref()));
    let products = state.products.list(&query).await?;
    Ok(ApiResponse::success(products).with_message("Products retrieved successfully"))
}

/// GET /api/v1/products/:id
pub async fn product_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Product> {
    let product = state.products.get(&id).await?;
    Ok(ApiResponse::success(product).with_message("Product retrieved successfully"))
}

/// GET /api/v1/products/:id/with-user
pub async fn product_get_with_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ProductWithUser> {
    let product = state.products.get_with_user(&id).await?;
    Ok(ApiResponse::success(product).with_message("Product retrieved successfully"))
}

/// PUT /api/v1/products/:id
pub async fn product_put(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> ApiResult<Product> {
    let product = state.products.update(&id, req).await?;
    Ok(ApiResponse::success(product).with_message("Product updated successfully"))
}

/// DELETE /api/v1/products/:id
pub async fn product_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.products.delete(&id).await?;
    Ok(ApiResponse::message_only("Product deleted successfully"))
}
