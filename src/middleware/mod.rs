pub mod auth;
pub mod json;
pub mod logging;
pub mod response;

pub use auth::{jwt_auth_middleware, require_roles, AuthUser, RoleSet};
pub use json::ApiJson;
pub use logging::request_logging_middleware;
pub use response::{ApiResponse, ApiResult};
