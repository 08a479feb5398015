use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, request_logging_middleware};
use crate::state::AppState;

/// Full HTTP surface. Request logging wraps everything, CORS sits inside it.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/health", get(public::health_get))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(&state))
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/v1/auth/register", post(auth::register_post))
        .route("/api/v1/auth/login", post(auth::login_post))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(product_routes())
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            jwt_auth_middleware,
        ))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new().route("/api/v1/users/me", get(users::me_get).put(users::me_put))
}

fn product_routes() -> Router<AppState> {
    use protected::products;

    Router::new()
        .route(
            "/api/v1/products",
            get(products::product_list).post(products::product_post),
        )
        .route(
            "/api/v1/products/:id",
            get(products::product_get)
                .put(products::product_put)
                .delete(products::product_delete),
        )
        .route(
            "/api/v1/products/:id/with-user",
            get(products::product_get_with_user),
        )
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "route not found" })),
    )
}
