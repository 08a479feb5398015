// handlers/public/mod.rs - endpoints that need no authentication
//
// Token acquisition and the liveness probe. Every input is untrusted here.
pub mod auth;
pub mod health;

pub use health::health_get;
