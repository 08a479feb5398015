// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware
//
// Handlers take the caller from the `AuthUser` extractor; ids in the body or
// query string never select whose profile is touched.
pub mod products;
pub mod users;
